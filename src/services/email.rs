//! Outbound e-mail
//!
//! Mails are handed to a bounded queue and sent by a single worker task, so
//! a slow or failing relay never holds up a request.

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use crate::config::EmailConfig;
use crate::utils::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Dispatcher used when no relay is configured; mails are only logged
#[derive(Debug, Clone, Default)]
pub struct LogEmailDispatcher;

#[async_trait]
impl EmailDispatcher for LogEmailDispatcher {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "E-mail not sent, no relay configured"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: &'a str,
}

/// Dispatcher posting mails to an HTTP relay
#[derive(Debug, Clone)]
pub struct HttpEmailDispatcher {
    client: Client,
    relay_url: String,
    api_key: Option<String>,
    from: String,
    subject_prefix: String,
}

impl HttpEmailDispatcher {
    pub fn new(relay_url: impl Into<String>, config: &EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            subject_prefix: config.subject_prefix.clone(),
        })
    }
}

#[async_trait]
impl EmailDispatcher for HttpEmailDispatcher {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: format!("{} {}", self.subject_prefix, message.subject),
            text: &message.body,
        };

        let mut request = self.client.post(&self.relay_url).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        request.send().await?.error_for_status()?;

        info!(to = %message.to, "E-mail sent");
        Ok(())
    }
}

/// Pick the dispatcher for the configured environment
pub fn dispatcher_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailDispatcher>> {
    match &config.relay_url {
        Some(url) => Ok(Arc::new(HttpEmailDispatcher::new(url.clone(), config)?)),
        None => {
            warn!("No e-mail relay configured, notifications will only be logged");
            Ok(Arc::new(LogEmailDispatcher))
        }
    }
}

/// Sending side of the e-mail queue
#[derive(Debug, Clone)]
pub struct EmailQueue {
    sender: mpsc::Sender<EmailMessage>,
}

impl EmailQueue {
    /// Create a queue and its receiving end without starting a worker
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EmailMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Create a queue drained by one worker task
    pub fn start(dispatcher: Arc<dyn EmailDispatcher>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = Self::channel(capacity);
        let worker = tokio::spawn(run_worker(dispatcher, receiver));
        (queue, worker)
    }

    /// Queue a mail without waiting; returns `false` if it was dropped
    pub fn enqueue(&self, message: EmailMessage) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(to = %message.to, subject = %message.subject, "E-mail queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(message)) => {
                warn!(to = %message.to, "E-mail worker stopped, dropping message");
                false
            }
        }
    }
}

async fn run_worker(dispatcher: Arc<dyn EmailDispatcher>, mut receiver: mpsc::Receiver<EmailMessage>) {
    debug!("E-mail worker started");

    while let Some(message) = receiver.recv().await {
        if let Err(e) = dispatcher.send(&message).await {
            error!(to = %message.to, subject = %message.subject, error = %e, "Failed to send e-mail");
        }
    }

    debug!("E-mail worker stopped");
}

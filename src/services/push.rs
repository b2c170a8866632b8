//! Real-time push channel
//!
//! Publishes `(topic, payload)` messages to connected clients. Delivery is
//! best-effort: a publish with nobody listening is not an error.

use std::fmt;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;
use crate::utils::errors::Result;

/// Push topics emitted by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushTopic {
    NewEvent,
    RegistrationUpdate,
}

impl PushTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushTopic::NewEvent => "new_event",
            PushTopic::RegistrationUpdate => "registration_update",
        }
    }
}

impl fmt::Display for PushTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message for the push channel
///
/// `recipient` is `None` for broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub topic: PushTopic,
    pub recipient: Option<Uuid>,
    pub payload: Value,
}

impl PushMessage {
    pub fn broadcast(topic: PushTopic, payload: Value) -> Self {
        Self { topic, recipient: None, payload }
    }

    pub fn to_user(topic: PushTopic, user_id: Uuid, payload: Value) -> Self {
        Self { topic, recipient: Some(user_id), payload }
    }
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn publish(&self, message: PushMessage) -> Result<()>;
}

/// In-process push channel backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastPushChannel {
    sender: broadcast::Sender<PushMessage>,
}

impl BroadcastPushChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to every message published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PushMessage> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPushChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl PushChannel for BroadcastPushChannel {
    async fn publish(&self, message: PushMessage) -> Result<()> {
        let topic = message.topic;
        match self.sender.send(message) {
            Ok(receivers) => debug!(topic = %topic, receivers, "Push message published"),
            Err(_) => debug!(topic = %topic, "Push message dropped, no subscribers"),
        }
        Ok(())
    }
}

/// Push channel publishing on Redis pub/sub
///
/// Broadcasts go to `{prefix}push:{topic}`, addressed messages to
/// `{prefix}push:{topic}:{user_id}`.
#[derive(Clone)]
pub struct RedisPushChannel {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisPushChannel {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection,
            prefix: prefix.into(),
        })
    }

    pub fn channel_name(&self, message: &PushMessage) -> String {
        match message.recipient {
            Some(user_id) => format!("{}push:{}:{}", self.prefix, message.topic, user_id),
            None => format!("{}push:{}", self.prefix, message.topic),
        }
    }
}

#[async_trait]
impl PushChannel for RedisPushChannel {
    async fn publish(&self, message: PushMessage) -> Result<()> {
        let channel = self.channel_name(&message);
        let payload = serde_json::to_string(&message)?;

        let mut connection = self.connection.clone();
        let receivers: i64 = connection.publish(&channel, payload).await?;

        debug!(channel = %channel, receivers, "Push message published to Redis");
        Ok(())
    }
}

//! Services module
//!
//! This module contains business logic services

pub mod chat;
pub mod email;
pub mod events;
pub mod llm;
pub mod notification;
pub mod push;
pub mod registrations;
pub mod votes;

// Re-export commonly used services
pub use chat::{ChatBridge, Directive, DirectiveParser};
pub use email::{EmailDispatcher, EmailMessage, EmailQueue, HttpEmailDispatcher, LogEmailDispatcher};
pub use events::{require_module, EventService};
pub use llm::{CompletionClient, GroqClient};
pub use notification::NotificationService;
pub use push::{BroadcastPushChannel, PushChannel, PushMessage, PushTopic, RedisPushChannel};
pub use registrations::RegistrationLedger;
pub use votes::VoteLedger;

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::Store;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub store: Arc<dyn Store>,
    pub events: EventService,
    pub registrations: RegistrationLedger,
    pub votes: VoteLedger,
    pub chat: ChatBridge,
}

impl ServiceFactory {
    /// Wire every service around the given collaborators
    pub fn new(
        settings: &Settings,
        store: Arc<dyn Store>,
        push: Arc<dyn PushChannel>,
        email: EmailQueue,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let notifications = NotificationService::new(push, email);
        let events = EventService::new(store.clone(), notifications.clone());
        let registrations = RegistrationLedger::new(store.clone(), notifications);
        let votes = VoteLedger::new(store.clone());
        let chat = ChatBridge::new(
            events.clone(),
            registrations.clone(),
            completion,
            settings.ai.history_limit,
        )?;

        Ok(Self {
            store,
            events,
            registrations,
            votes,
            chat,
        })
    }

    /// Health check for the services' backing store
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let store_healthy = match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store health check failed");
                false
            }
        };

        ServiceHealthStatus { store_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub store_healthy: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.store_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.store_healthy {
            issues.push("Store unreachable".to_string());
        }

        issues
    }
}

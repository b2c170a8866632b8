//! Conversational action bridge
//!
//! Answers concierge messages from a snapshot of visible events. A model
//! reply may carry one `[ACTION:REGISTER_EVENT:<uuid>]` directive, which is
//! validated against the snapshot and executed through the registration
//! ledger. When the model is unavailable a local keyword responder answers
//! instead; its output is never scanned for directives.

use std::sync::Arc;
use regex::Regex;
use serde::Serialize;
use serde_json::Map;
use tracing::{info, warn};
use uuid::Uuid;
use crate::models::{ActionOutcome, ChatRequest, ChatResponse, ChatTurn, Event, Principal, ReplySource};
use crate::services::events::EventService;
use crate::services::llm::CompletionClient;
use crate::services::registrations::RegistrationLedger;
use crate::utils::errors::{CampusFlowError, Result};
use crate::utils::helpers::{format_timestamp, normalize_whitespace};
use crate::utils::logging::log_chat_fallback;

const FALLBACK_SUFFIX: &str = " (Backup System)";

/// What a model reply asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Absent,
    /// A directive-shaped tag that does not pass the strict pattern, or more than one tag
    Malformed,
    Register(Uuid),
}

/// Finds and validates action tags in untrusted model output
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    any_tag: Regex,
    register: Regex,
}

impl DirectiveParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CampusFlowError::Config(format!("Invalid directive pattern: {}", e)))
        };

        Ok(Self {
            any_tag: compile(r"\[ACTION:[^\]]*\]")?,
            register: compile(r"^\[ACTION:REGISTER_EVENT:([0-9A-Fa-f-]{36})\]$")?,
        })
    }

    pub fn parse(&self, text: &str) -> Directive {
        let mut tags = self.any_tag.find_iter(text);

        let tag = match (tags.next(), tags.next()) {
            (None, _) => return Directive::Absent,
            (Some(_), Some(_)) => return Directive::Malformed,
            (Some(tag), None) => tag.as_str(),
        };

        self.register
            .captures(tag)
            .and_then(|captures| captures.get(1))
            .and_then(|id| Uuid::parse_str(id.as_str()).ok())
            .map_or(Directive::Malformed, Directive::Register)
    }

    /// Remove every action tag from `text`
    pub fn strip(&self, text: &str) -> String {
        normalize_whitespace(&self.any_tag.replace_all(text, ""))
    }
}

#[derive(Serialize)]
struct SnapshotEntry<'a> {
    id: Uuid,
    title: &'a str,
    date: String,
    location: &'a str,
    description: &'a str,
}

/// System instruction embedding the event snapshot
pub fn build_system_prompt(snapshot: &[Event]) -> Result<String> {
    let entries: Vec<SnapshotEntry<'_>> = snapshot
        .iter()
        .map(|event| SnapshotEntry {
            id: event.id,
            title: &event.title,
            date: format_timestamp(event.timeline.start),
            location: &event.location,
            description: &event.description,
        })
        .collect();
    let context = serde_json::to_string(&entries)?;

    Ok(format!(
        "You are \"Hawkins\", the AI Concierge for Campus Flow. Be helpful, a little witty and brief.\n\n\
         Events (with their ids):\n{context}\n\n\
         Rules:\n\
         - Answer only from the events listed above.\n\
         - When the user asks to register for an event, ask them to confirm first.\n\
         - Only after they confirm, reply with the tag [ACTION:REGISTER_EVENT:<id>] using the event's id from the list.\n\
         - Never output the tag unless the user has confirmed they want to register.\n\
         - Keep answers under two sentences."
    ))
}

fn has_any_word(words: &[&str], candidates: &[&str]) -> bool {
    words.iter().any(|word| candidates.contains(word))
}

/// Rule-based answer used when the language model is unavailable
pub fn local_reply(message: &str, snapshot: &[Event]) -> String {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let mentioned = snapshot
        .iter()
        .find(|event| !event.title.trim().is_empty() && lower.contains(&event.title.to_lowercase()));

    if let Some(event) = mentioned {
        if has_any_word(&words, &["when", "time", "date"]) {
            return format!(
                "{} starts on {} and ends on {}.",
                event.title,
                format_timestamp(event.timeline.start),
                format_timestamp(event.timeline.end)
            );
        }
        if has_any_word(&words, &["where", "location"]) {
            return format!("{} will be held at {}.", event.title, event.location);
        }
        if has_any_word(&words, &["register", "join", "signup"]) || lower.contains("sign up") {
            return format!(
                "You can register for {} from its event page using the Registration module.",
                event.title
            );
        }
        return format!("{}: {}. It is happening at {}.", event.title, event.description, event.location);
    }

    if has_any_word(&words, &["event", "events", "happening", "list"]) || lower.contains("coming up") {
        if snapshot.is_empty() {
            return "There are no upcoming events scheduled at the moment.".to_string();
        }
        let titles: Vec<&str> = snapshot.iter().map(|event| event.title.as_str()).collect();
        return format!(
            "We have {} upcoming events: {}. Ask me about any of them!",
            snapshot.len(),
            titles.join(", ")
        );
    }

    if has_any_word(&words, &["hello", "hi", "hey"]) {
        let example = snapshot.first().map_or("Hackathon", |event| event.title.as_str());
        return format!(
            "Hello! I am Hawkins, your AI Concierge. Ask me about upcoming events like '{}'.",
            example
        );
    }

    if lower.contains("who are you") || has_any_word(&words, &["bot"]) {
        return "I am the Campus Flow AI Concierge.".to_string();
    }

    "I'm having trouble accessing the main archives. Try asking 'What events are coming up?' or 'When is [Event Name]?'"
        .to_string()
}

#[derive(Clone)]
pub struct ChatBridge {
    events: EventService,
    registrations: RegistrationLedger,
    client: Arc<dyn CompletionClient>,
    parser: DirectiveParser,
    history_limit: usize,
}

impl ChatBridge {
    pub fn new(
        events: EventService,
        registrations: RegistrationLedger,
        client: Arc<dyn CompletionClient>,
        history_limit: usize,
    ) -> Result<Self> {
        Ok(Self {
            events,
            registrations,
            client,
            parser: DirectiveParser::new()?,
            history_limit,
        })
    }

    /// Answer one user turn
    ///
    /// Only an empty message is an error; upstream failures degrade to the
    /// local responder.
    pub async fn respond(&self, principal: Option<&Principal>, request: ChatRequest) -> Result<ChatResponse> {
        let message = request.message.as_deref().map(str::trim).unwrap_or_default();
        if message.is_empty() {
            return Err(CampusFlowError::Validation("Message is required".to_string()));
        }

        let snapshot = match self.events.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to load events for the concierge");
                Vec::new()
            }
        };

        let skip = request.history.len().saturating_sub(self.history_limit);
        let history = &request.history[skip..];

        let system = build_system_prompt(&snapshot)?;
        match self.client.complete(&system, history, message).await {
            Ok(reply) => Ok(self.handle_model_reply(principal, reply, &snapshot).await),
            Err(e) => {
                log_chat_fallback(&e.to_string());
                Ok(self.fallback(message, &snapshot))
            }
        }
    }

    fn fallback(&self, message: &str, snapshot: &[Event]) -> ChatResponse {
        let reply = format!("{}{}", self.parser.strip(&local_reply(message, snapshot)), FALLBACK_SUFFIX);

        ChatResponse {
            turns: vec![ChatTurn::assistant(reply.clone())],
            reply,
            source: ReplySource::Fallback,
            action: None,
        }
    }

    async fn handle_model_reply(&self, principal: Option<&Principal>, reply: String, snapshot: &[Event]) -> ChatResponse {
        let event_id = match self.parser.parse(&reply) {
            Directive::Register(event_id) => event_id,
            Directive::Absent | Directive::Malformed => {
                return ChatResponse {
                    turns: vec![ChatTurn::assistant(reply.clone())],
                    reply,
                    source: ReplySource::Model,
                    action: None,
                };
            }
        };

        let mut turns = Vec::new();
        let visible = self.parser.strip(&reply);
        if !visible.is_empty() {
            turns.push(ChatTurn::assistant(visible));
        }

        let (outcome, text) = self.execute_registration(principal, event_id, snapshot).await;
        turns.push(ChatTurn::assistant(text));

        ChatResponse {
            reply: turns.iter().map(|turn| turn.text.as_str()).collect::<Vec<_>>().join("\n"),
            turns,
            source: ReplySource::Model,
            action: Some(outcome),
        }
    }

    async fn execute_registration(
        &self,
        principal: Option<&Principal>,
        event_id: Uuid,
        snapshot: &[Event],
    ) -> (ActionOutcome, String) {
        let failed = |error: String| {
            let text = format!("Registration Failed: {}", error);
            (
                ActionOutcome { event_id, registered: false, registration_id: None, error: Some(error) },
                text,
            )
        };

        let event = match snapshot.iter().find(|event| event.id == event_id) {
            Some(event) => event,
            None => {
                warn!(event_id = %event_id, "Directive names an event outside the snapshot");
                return failed("That event is not available.".to_string());
            }
        };

        let principal = match principal {
            Some(principal) => principal,
            None => return failed("Please sign in to register for events.".to_string()),
        };

        match self.registrations.register(principal, event_id, Map::new()).await {
            Ok(registration) => {
                info!(
                    event_id = %event_id,
                    user_id = %principal.id,
                    registration_id = %registration.id,
                    "Concierge registered user"
                );
                (
                    ActionOutcome {
                        event_id,
                        registered: true,
                        registration_id: Some(registration.id),
                        error: None,
                    },
                    format!("Access Granted: You are now registered for {}!", event.title),
                )
            }
            Err(e) => failed(e.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use crate::models::EventStatus;
    use crate::models::Timeline;

    fn event(title: &str) -> Event {
        let start = Utc::now() + Duration::days(1);
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Build things overnight".to_string(),
            status: EventStatus::Published,
            timeline: Timeline { start, end: start + Duration::hours(12) },
            location: "Main Hall".to_string(),
            theme_config: json!({}),
            modules: vec![],
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_parse_directives() {
        let parser = DirectiveParser::new().unwrap();
        let id = Uuid::new_v4();

        assert_eq!(parser.parse("See you there!"), Directive::Absent);
        assert_eq!(
            parser.parse(&format!("Done. [ACTION:REGISTER_EVENT:{}]", id)),
            Directive::Register(id)
        );
        assert_eq!(parser.parse("[ACTION:REGISTER_EVENT:60d5ec49f1b2c830b8e6c389]"), Directive::Malformed);
        assert_eq!(parser.parse("[ACTION:DELETE_EVENT:abc]"), Directive::Malformed);
        assert_eq!(
            parser.parse(&format!("[ACTION:REGISTER_EVENT:{}][ACTION:REGISTER_EVENT:{}]", id, id)),
            Directive::Malformed
        );
    }

    #[test]
    fn test_strip_removes_tags() {
        let parser = DirectiveParser::new().unwrap();
        let text = format!("Registering you now. [ACTION:REGISTER_EVENT:{}]", Uuid::new_v4());
        assert_eq!(parser.strip(&text), "Registering you now.");
    }

    #[test]
    fn test_local_reply_rules() {
        let snapshot = vec![event("Hackathon"), event("Career Fair")];

        assert!(local_reply("where is the hackathon?", &snapshot).contains("Main Hall"));
        assert!(local_reply("When is Career Fair", &snapshot).starts_with("Career Fair starts on"));
        assert!(local_reply("how do I join hackathon", &snapshot).contains("register"));
        assert!(local_reply("what events are coming up?", &snapshot).starts_with("We have 2 upcoming events"));
        assert!(local_reply("hey there", &snapshot).contains("Hawkins"));
        assert!(local_reply("this is nothing", &snapshot).contains("main archives"));
        assert_eq!(
            local_reply("list everything", &[]),
            "There are no upcoming events scheduled at the moment."
        );
    }

    #[test]
    fn test_prompt_carries_ids() {
        let snapshot = vec![event("Hackathon")];
        let prompt = build_system_prompt(&snapshot).unwrap();
        assert!(prompt.contains(&snapshot[0].id.to_string()));
        assert!(prompt.contains("[ACTION:REGISTER_EVENT:<id>]"));
    }
}

//! Participation module model
//!
//! A module is a capability attached to a single event. The set of kinds is
//! closed; configuration arriving over the wire is checked by
//! [`crate::modules::ModuleRegistry`] before it becomes a [`Module`].

use std::fmt;
use std::num::NonZeroU32;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds of module an event can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Registration,
    Voting,
}

impl ModuleKind {
    /// Wire tag of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Registration => "registration",
            ModuleKind::Voting => "voting",
        }
    }

    /// Parse a wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "registration" => Some(ModuleKind::Registration),
            "voting" => Some(ModuleKind::Voting),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Registration => write!(f, "Registration"),
            ModuleKind::Voting => write!(f, "Voting"),
        }
    }
}

/// A single poll offered by a voting module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSpec {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<Value>,
}

/// Registration module settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<NonZeroU32>,
}

/// Voting module settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingConfig {
    #[serde(default)]
    pub polls: Vec<PollSpec>,
}

impl VotingConfig {
    /// Whether `target_id` names a poll of this module
    ///
    /// A module without polls accepts any target.
    pub fn accepts_target(&self, target_id: &str) -> bool {
        self.polls.is_empty() || self.polls.iter().any(|poll| poll.id == target_id)
    }
}

/// A validated module attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum Module {
    Registration(RegistrationConfig),
    Voting(VotingConfig),
}

impl Module {
    pub fn kind(&self) -> ModuleKind {
        match self {
            Module::Registration(_) => ModuleKind::Registration,
            Module::Voting(_) => ModuleKind::Voting,
        }
    }
}

/// Unvalidated module as submitted by a client
///
/// Unknown keys are ignored; `type` is optional here so that its absence can
/// be reported as an invalid module configuration instead of a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub config: Value,
}

impl ModuleSpec {
    pub fn new(kind: &str, config: Value) -> Self {
        Self {
            kind: Some(kind.to_string()),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_module_wire_shape() {
        let module = Module::Registration(RegistrationConfig { limit: NonZeroU32::new(2) });
        let encoded = serde_json::to_value(&module).unwrap();
        assert_eq!(encoded, json!({"type": "registration", "config": {"limit": 2}}));

        let voting: Module = serde_json::from_value(json!({
            "type": "voting",
            "config": {"polls": [{"id": "p1", "question": "Pizza?", "options": ["yes", "no"]}]}
        }))
        .unwrap();
        assert_eq!(voting.kind(), ModuleKind::Voting);
    }

    #[test]
    fn test_voting_accepts_target() {
        let open = VotingConfig::default();
        assert!(open.accepts_target("anything"));

        let closed = VotingConfig {
            polls: vec![PollSpec { id: "p1".to_string(), question: String::new(), options: vec![] }],
        };
        assert!(closed.accepts_target("p1"));
        assert!(!closed.accepts_target("p2"));
    }
}

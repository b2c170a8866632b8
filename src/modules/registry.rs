//! Module registry
//!
//! Turns client-submitted module specs into validated [`Module`] values. Each
//! kind has exactly one accepted configuration shape and an event may carry
//! at most one module of each kind.

use std::collections::HashSet;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use crate::models::{Module, ModuleKind, ModuleSpec, RegistrationConfig, VotingConfig};
use crate::utils::errors::{CampusFlowError, Result};

/// Validates module specs at attach time
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleRegistry;

impl ModuleRegistry {
    /// Validate a single spec
    pub fn validate(spec: &ModuleSpec) -> Result<Module> {
        let tag = spec
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| CampusFlowError::InvalidModuleConfig("module type is required".to_string()))?;

        let kind = ModuleKind::from_tag(tag).ok_or_else(|| {
            CampusFlowError::InvalidModuleConfig(format!("unknown module type '{}'", tag))
        })?;

        let module = match kind {
            ModuleKind::Registration => {
                Module::Registration(Self::decode_config::<RegistrationConfig>(kind, &spec.config)?)
            }
            ModuleKind::Voting => {
                let config = Self::decode_config::<VotingConfig>(kind, &spec.config)?;
                Self::check_polls(&config)?;
                Module::Voting(config)
            }
        };

        debug!(module = kind.as_str(), "Module configuration accepted");
        Ok(module)
    }

    /// Attach a spec to an existing module list
    pub fn attach(modules: &mut Vec<Module>, spec: &ModuleSpec) -> Result<()> {
        let module = Self::validate(spec)?;

        if modules.iter().any(|existing| existing.kind() == module.kind()) {
            return Err(CampusFlowError::InvalidModuleConfig(format!(
                "an event can carry only one {} module",
                module.kind().as_str()
            )));
        }

        modules.push(module);
        Ok(())
    }

    /// Validate a full module list, preserving its order
    pub fn build(specs: &[ModuleSpec]) -> Result<Vec<Module>> {
        let mut modules = Vec::with_capacity(specs.len());
        for spec in specs {
            Self::attach(&mut modules, spec)?;
        }
        Ok(modules)
    }

    fn decode_config<T: DeserializeOwned + Default>(kind: ModuleKind, config: &Value) -> Result<T> {
        match config {
            Value::Null => Ok(T::default()),
            Value::Object(_) => serde_json::from_value(config.clone()).map_err(|e| {
                CampusFlowError::InvalidModuleConfig(format!("{} config: {}", kind.as_str(), e))
            }),
            _ => Err(CampusFlowError::InvalidModuleConfig(format!(
                "{} config must be an object",
                kind.as_str()
            ))),
        }
    }

    fn check_polls(config: &VotingConfig) -> Result<()> {
        let mut seen = HashSet::new();

        for poll in &config.polls {
            if poll.id.trim().is_empty() {
                return Err(CampusFlowError::InvalidModuleConfig("poll id must not be empty".to_string()));
            }
            if !seen.insert(poll.id.as_str()) {
                return Err(CampusFlowError::InvalidModuleConfig(format!("duplicate poll id '{}'", poll.id)));
            }
        }

        Ok(())
    }
}

//! Tables configuration.
//!
//! Deserialized with the `config` crate from TOML (or any format it knows).
//! Application is all-or-nothing: the whole section is validated first, so a
//! bad binding never leaves the engine half-configured, and a dry run stops
//! after validation.

use crate::fw::forwarder::Forwarder;
use crate::fw::unsolicited::UnsolicitedDataPolicy;
use crate::table::cs_policy;
use rust_nfe_common::Name;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),

    #[error("unknown cs policy `{0}`")]
    UnknownPolicy(String),

    #[error("unknown unsolicited data policy `{0}`")]
    UnknownUnsolicitedPolicy(String),

    #[error("duplicate strategy binding for prefix `{0}`")]
    DuplicateBinding(String),

    #[error("invalid name `{0}`")]
    InvalidName(String),

    #[error("cannot change cs policy while the store holds entries")]
    PolicySwapNotEmpty,

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// One strategy binding.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyChoiceConfig {
    pub prefix: String,
    pub strategy: String,
}

/// The `tables` configuration section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablesConfig {
    /// Content Store capacity in packets.
    pub cs_max_entries: Option<usize>,
    /// Content Store eviction policy name.
    pub cs_policy: Option<String>,
    /// What to do with Data that matches no pending Interest.
    pub cs_unsolicited_policy: Option<String>,
    /// Strategy bindings, one per prefix.
    pub strategy_choice: Vec<StrategyChoiceConfig>,
    /// Producer region names this node belongs to.
    pub network_region: Vec<String>,
}

impl TablesConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// Checks the whole section against the forwarder without touching it.
    pub fn validate(&self, forwarder: &Forwarder) -> Result<(), ConfigError> {
        if let Some(policy) = &self.cs_policy {
            if !cs_policy::is_known(policy) {
                return Err(ConfigError::UnknownPolicy(policy.clone()));
            }
            if policy.as_str() != forwarder.cs().policy_name() && !forwarder.cs().is_empty() {
                return Err(ConfigError::PolicySwapNotEmpty);
            }
        }
        if let Some(policy) = &self.cs_unsolicited_policy {
            if UnsolicitedDataPolicy::from_name(policy).is_none() {
                return Err(ConfigError::UnknownUnsolicitedPolicy(policy.clone()));
            }
        }
        let mut prefixes = BTreeSet::new();
        for binding in &self.strategy_choice {
            let prefix = Name::from_uri(&binding.prefix)
                .map_err(|_| ConfigError::InvalidName(binding.prefix.clone()))?;
            if !prefixes.insert(prefix) {
                return Err(ConfigError::DuplicateBinding(binding.prefix.clone()));
            }
            if !forwarder.strategy_registry().is_known(&binding.strategy) {
                return Err(ConfigError::UnknownStrategy(binding.strategy.clone()));
            }
        }
        for region in &self.network_region {
            Name::from_uri(region).map_err(|_| ConfigError::InvalidName(region.clone()))?;
        }
        Ok(())
    }

    /// Validates and, unless `dry_run`, applies the section.
    pub fn apply(&self, forwarder: &mut Forwarder, dry_run: bool) -> Result<(), ConfigError> {
        self.validate(forwarder)?;
        if dry_run {
            return Ok(());
        }

        if let Some(policy) = &self.cs_policy {
            let limit = self.cs_max_entries.unwrap_or(forwarder.cs().limit());
            if let Some(policy) = cs_policy::create(policy, limit) {
                forwarder.cs_mut().set_policy(policy);
            }
        } else if let Some(limit) = self.cs_max_entries {
            forwarder.cs_mut().set_limit(limit);
        }
        if let Some(policy) = &self.cs_unsolicited_policy {
            if let Some(policy) = UnsolicitedDataPolicy::from_name(policy) {
                forwarder.set_unsolicited_policy(policy);
            }
        }
        for binding in &self.strategy_choice {
            let prefix = Name::from_uri(&binding.prefix)
                .map_err(|_| ConfigError::InvalidName(binding.prefix.clone()))?;
            forwarder.set_strategy(prefix, &binding.strategy);
        }
        for region in &self.network_region {
            let region =
                Name::from_uri(region).map_err(|_| ConfigError::InvalidName(region.clone()))?;
            forwarder.add_network_region(region);
        }
        Ok(())
    }
}

//! Strategy Choice table.
//!
//! Maps namespace prefixes to strategy instances. The table owns the
//! instances, so per-strategy state (beyond what lives in Measurements and
//! PIT slots) stays with its binding. The root prefix is always bound; it is
//! the fallback for every lookup.

use crate::fw::strategy::Strategy;
use rust_nfe_common::Name;
use std::collections::BTreeMap;

pub struct StrategyChoice {
    choices: BTreeMap<Name, Box<dyn Strategy>>,
}

impl StrategyChoice {
    /// Creates the table with `default` bound at the root prefix.
    pub fn new(default: Box<dyn Strategy>) -> Self {
        let mut choices = BTreeMap::new();
        choices.insert(Name::new(), default);
        Self { choices }
    }

    /// Binds a strategy to `prefix`, replacing any existing binding there.
    pub fn set(&mut self, prefix: Name, strategy: Box<dyn Strategy>) {
        self.choices.insert(prefix, strategy);
    }

    /// Removes the binding at `prefix`. The root binding cannot be removed.
    pub fn unset(&mut self, prefix: &Name) {
        if !prefix.is_empty() {
            self.choices.remove(prefix);
        }
    }

    pub fn get_name(&self, prefix: &Name) -> Option<&'static str> {
        self.choices.get(prefix).map(|s| s.name())
    }

    /// The strategy governing `name`: its longest bound prefix.
    pub fn find_effective_mut(&mut self, name: &Name) -> &mut dyn Strategy {
        let mut key = Name::new();
        for len in (0..=name.len()).rev() {
            let prefix = name.get_prefix(len);
            if self.choices.contains_key(&prefix) {
                key = prefix;
                break;
            }
        }
        match self.choices.get_mut(&key) {
            Some(strategy) => strategy.as_mut(),
            // the root binding is installed at construction and never removed
            None => unreachable!(),
        }
    }

    pub fn find_effective_name(&self, name: &Name) -> &'static str {
        for len in (0..=name.len()).rev() {
            let prefix = name.get_prefix(len);
            if let Some(strategy) = self.choices.get(&prefix) {
                return strategy.name();
            }
        }
        // root fallback handled by the len == 0 iteration
        unreachable!()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&Name, &'static str)> {
        self.choices.iter().map(|(name, s)| (name, s.name()))
    }
}

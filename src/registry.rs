//! Named permissions.
//!
//! Applications usually define their rules once, register them under a
//! permission name such as `shrubberies.view_store`, and resolve them by
//! name at request time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::RuleError;
use crate::rule::{Rule, RuleExt};
use crate::traits::{Entity, Repository};
use crate::types::Predicate;

#[cfg(feature = "observability")]
use crate::metrics;
#[cfg(feature = "observability")]
use crate::timers::PhaseTimer;
#[cfg(feature = "observability")]
use std::time::Duration;

/// A thread-safe map from permission names to rules.
pub struct PermissionRegistry<U: ?Sized> {
    rules: RwLock<HashMap<String, Arc<dyn Rule<U>>>>,
}

impl<U: ?Sized> PermissionRegistry<U> {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    pub fn builder() -> PermissionRegistryBuilder<U> {
        PermissionRegistryBuilder::new()
    }

    /// Register `rule` under `name`. Each name may be registered once.
    pub fn register<R>(&self, name: &str, rule: R) -> Result<(), RuleError>
    where
        R: Rule<U> + 'static,
    {
        self.register_arc(name, Arc::new(rule))
    }

    pub fn register_arc(&self, name: &str, rule: Arc<dyn Rule<U>>) -> Result<(), RuleError> {
        let mut rules = self.rules.write()?;
        if rules.contains_key(name) {
            return Err(RuleError::DuplicatePermission(name.to_string()));
        }
        rules.insert(name.to_string(), rule);
        info!(event = "Registry", phase = "Register", permission = name);
        Ok(())
    }

    /// Register `rule` under `name`, replacing any previous rule.
    pub fn replace<R>(&self, name: &str, rule: R) -> Result<(), RuleError>
    where
        R: Rule<U> + 'static,
    {
        let previous = self
            .rules
            .write()?
            .insert(name.to_string(), Arc::new(rule));
        info!(
            event = "Registry",
            phase = "Replace",
            permission = name,
            replaced = previous.is_some()
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Rule<U>>, RuleError> {
        self.rules
            .read()?
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownPermission(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool, RuleError> {
        Ok(self.rules.read()?.contains_key(name))
    }

    /// Registered permission names, sorted.
    pub fn names(&self) -> Result<Vec<String>, RuleError> {
        let mut names: Vec<String> = self.rules.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn check(
        &self,
        name: &str,
        user: &U,
        instance: Option<&dyn Entity>,
    ) -> Result<bool, RuleError> {
        let rule = self.get(name)?;

        #[cfg(feature = "observability")]
        let mut elapsed = Duration::ZERO;
        let result = {
            #[cfg(feature = "observability")]
            let _timer = PhaseTimer::new(&mut elapsed);
            rule.check(user, instance)
        };

        #[cfg(feature = "observability")]
        metrics::record_check(name, &result, elapsed);

        let allowed = result?;
        debug!(
            event = "Check",
            phase = "Result",
            permission = name,
            instance = instance.map(|i| i.entity_ref().to_string()),
            allowed
        );
        Ok(allowed)
    }

    pub fn query(&self, name: &str, user: &U) -> Result<Predicate, RuleError> {
        let rule = self.get(name)?;

        #[cfg(feature = "observability")]
        let mut elapsed = Duration::ZERO;
        let result = {
            #[cfg(feature = "observability")]
            let _timer = PhaseTimer::new(&mut elapsed);
            rule.query(user)
        };

        #[cfg(feature = "observability")]
        metrics::record_query(name, &result, elapsed);

        let predicate = result?;
        debug!(
            event = "Query",
            phase = "Result",
            permission = name,
            predicate = predicate.to_string()
        );
        Ok(predicate)
    }

    pub fn filter<R: Repository>(
        &self,
        name: &str,
        user: &U,
        repository: &R,
    ) -> Result<Vec<R::Item>, RuleError> {
        repository.select(&self.query(name, user)?)
    }

    pub fn is_possible_for(&self, name: &str, user: &U) -> Result<bool, RuleError> {
        self.get(name)?.is_possible_for(user)
    }
}

impl<U: ?Sized> Default for PermissionRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects rules for a registry built in one go at startup.
pub struct PermissionRegistryBuilder<U: ?Sized> {
    rules: Vec<(String, Arc<dyn Rule<U>>)>,
}

impl<U: ?Sized> PermissionRegistryBuilder<U> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add<R>(mut self, name: &str, rule: R) -> Self
    where
        R: Rule<U> + 'static,
    {
        self.rules.push((name.to_string(), Arc::new(rule)));
        self
    }

    /// Fails on the first duplicated name.
    pub fn build(self) -> Result<PermissionRegistry<U>, RuleError> {
        let registry = PermissionRegistry::new();
        for (name, rule) in self.rules {
            registry.register_arc(&name, rule)?;
        }
        Ok(registry)
    }
}

impl<U: ?Sized> Default for PermissionRegistryBuilder<U> {
    fn default() -> Self {
        Self::new()
    }
}

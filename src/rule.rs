use std::sync::Arc;

use crate::error::RuleError;
use crate::rules::{And, Not, Or};
use crate::traits::{Entity, Repository};
use crate::types::Predicate;

/// A unit of authorization logic answering both the pointwise and the bulk
/// question for a user of type `U`.
///
/// Implementations must keep the two answers consistent: for every user and
/// instance, `check(user, Some(instance))` equals
/// `query(user)?.matches(instance)?`.
///
/// ```rust
/// use rulegate_core::{Entity, Predicate, Rule, RuleError};
///
/// struct Nobody;
///
/// impl Rule<String> for Nobody {
///     fn check(&self, _user: &String, _instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
///         Ok(false)
///     }
///
///     fn query(&self, _user: &String) -> Result<Predicate, RuleError> {
///         Ok(Predicate::Empty)
///     }
/// }
///
/// assert!(Nobody.query(&"alice".to_string()).unwrap().is_empty());
/// ```
pub trait Rule<U: ?Sized>: Send + Sync {
    /// May `user` access `instance`?
    ///
    /// With no instance this is `false` unless the rule is
    /// [instance independent](Rule::instance_independent).
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError>;

    /// The predicate selecting every instance `user` may access.
    fn query(&self, user: &U) -> Result<Predicate, RuleError>;

    /// Whether the decision depends only on the user.
    fn instance_independent(&self) -> bool {
        false
    }
}

impl<U: ?Sized, T: Rule<U> + ?Sized> Rule<U> for Arc<T> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        (**self).check(user, instance)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        (**self).query(user)
    }

    fn instance_independent(&self) -> bool {
        (**self).instance_independent()
    }
}

impl<U: ?Sized, T: Rule<U> + ?Sized> Rule<U> for Box<T> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        (**self).check(user, instance)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        (**self).query(user)
    }

    fn instance_independent(&self) -> bool {
        (**self).instance_independent()
    }
}

/// Convenience operations available on every rule.
pub trait RuleExt<U: ?Sized>: Rule<U> {
    /// Apply the rule's predicate to a repository.
    fn filter<R: Repository>(&self, user: &U, repository: &R) -> Result<Vec<R::Item>, RuleError> {
        repository.select(&self.query(user)?)
    }

    /// False when the rule can never match anything for `user`.
    fn is_possible_for(&self, user: &U) -> Result<bool, RuleError> {
        Ok(!self.query(user)?.is_empty())
    }

    fn and<O>(self, other: O) -> And<U>
    where
        Self: Sized + 'static,
        O: Rule<U> + 'static,
    {
        And::new(vec![Arc::new(self), Arc::new(other)])
    }

    fn or<O>(self, other: O) -> Or<U>
    where
        Self: Sized + 'static,
        O: Rule<U> + 'static,
    {
        Or::new(vec![Arc::new(self), Arc::new(other)])
    }

    fn not(self) -> Not<U>
    where
        Self: Sized + 'static,
    {
        Not::new(Arc::new(self))
    }
}

impl<U: ?Sized, T: Rule<U> + ?Sized> RuleExt<U> for T {}

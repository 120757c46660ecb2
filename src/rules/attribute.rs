//! `R`: the declarative attribute rule.
//!
//! An `R` is a conjunction of `(path, matcher)` pairs. Each pair matches
//! when some value (or related entity) reached through the path matches;
//! the rule matches when every pair does.
//!
//! ```rust
//! use rulegate_core::{R, Rule};
//!
//! struct User {
//!     name: String,
//! }
//!
//! let own_store = R::<User>::builder()
//!     .user("name", |u: &User| u.name.clone().into())
//!     .build()
//!     .unwrap();
//!
//! let user = User { name: "a".into() };
//! assert_eq!(own_store.query(&user).unwrap().to_string(), r#"name == "a""#);
//! assert!(!own_store.check(&user, None).unwrap());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::error::RuleError;
use crate::resolve::{any_related, leaf_values};
use crate::rule::Rule;
use crate::traits::Entity;
use crate::types::{AttrValue, AttributePath, Predicate};

type UserFn<U> = Arc<dyn Fn(&U) -> AttrValue + Send + Sync>;

/// What a single attribute path is matched against.
pub enum Matcher<U: ?Sized> {
    /// A constant, compared by equality.
    Value(AttrValue),
    /// A value derived from the requesting user, compared by equality.
    User(UserFn<U>),
    /// A rule the related entities are checked against.
    Rule(Arc<dyn Rule<U>>),
}

impl<U: ?Sized> Matcher<U> {
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Value(_) => "value",
            Matcher::User(_) => "user",
            Matcher::Rule(_) => "rule",
        }
    }

    pub fn value(value: impl Into<AttrValue>) -> Self {
        Matcher::Value(value.into())
    }

    pub fn user<F>(f: F) -> Self
    where
        F: Fn(&U) -> AttrValue + Send + Sync + 'static,
    {
        Matcher::User(Arc::new(f))
    }

    pub fn rule<T>(rule: T) -> Self
    where
        T: Rule<U> + 'static,
    {
        Matcher::Rule(Arc::new(rule))
    }
}

impl<U: ?Sized> Clone for Matcher<U> {
    fn clone(&self) -> Self {
        match self {
            Matcher::Value(v) => Matcher::Value(v.clone()),
            Matcher::User(f) => Matcher::User(Arc::clone(f)),
            Matcher::Rule(r) => Matcher::Rule(Arc::clone(r)),
        }
    }
}

impl<U: ?Sized> Debug for Matcher<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Matcher::Value(v) => write!(f, "Value({v})"),
            Matcher::User(_) => write!(f, "User(<fn>)"),
            Matcher::Rule(_) => write!(f, "Rule(<rule>)"),
        }
    }
}

impl<U: ?Sized> From<AttrValue> for Matcher<U> {
    fn from(value: AttrValue) -> Self {
        Matcher::Value(value)
    }
}

/// A conjunction of attribute matchers.
///
/// Immutable once built and cheap to share; build it once and reuse it for
/// every request.
pub struct R<U: ?Sized> {
    pairs: Vec<(AttributePath, Matcher<U>)>,
}

impl<U: ?Sized> R<U> {
    /// The rule without constraints: every present instance matches.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn builder() -> RBuilder<U> {
        RBuilder::new()
    }

    pub fn pairs(&self) -> &[(AttributePath, Matcher<U>)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn describe(&self) -> String {
        self.pairs
            .iter()
            .map(|(path, matcher)| format!("{path}={}", matcher.kind()))
            .join(", ")
    }

    fn pair_matches(
        user: &U,
        instance: &dyn Entity,
        path: &AttributePath,
        matcher: &Matcher<U>,
    ) -> Result<bool, RuleError> {
        match matcher {
            Matcher::Value(expected) => {
                Ok(leaf_values(instance, path)?.iter().any(|v| v == expected))
            }
            Matcher::User(f) => {
                let expected = f(user);
                Ok(leaf_values(instance, path)?.iter().any(|v| *v == expected))
            }
            Matcher::Rule(rule) => {
                any_related(instance, path, |related| rule.check(user, Some(related)))
            }
        }
    }
}

impl<U: ?Sized> Default for R<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: ?Sized> Clone for R<U> {
    fn clone(&self) -> Self {
        Self {
            pairs: self.pairs.clone(),
        }
    }
}

impl<U: ?Sized> Debug for R<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map()
            .entries(self.pairs.iter().map(|(p, m)| (p.to_string(), m)))
            .finish()
    }
}

impl<U: ?Sized> Rule<U> for R<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        let Some(instance) = instance else {
            return Ok(false);
        };

        for (path, matcher) in &self.pairs {
            if !Self::pair_matches(user, instance, path, matcher)? {
                debug!(
                    event = "Check",
                    phase = "Mismatch",
                    instance = instance.entity_ref().to_string(),
                    path = path.to_string(),
                    matcher = matcher.kind()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        let mut predicate = Predicate::Universal;

        for (path, matcher) in &self.pairs {
            let clause = match matcher {
                Matcher::Value(value) => Predicate::equals(path.clone(), value.clone()),
                Matcher::User(f) => Predicate::equals(path.clone(), f(user)),
                Matcher::Rule(rule) => match rule.query(user)? {
                    Predicate::Universal => continue,
                    Predicate::Empty => {
                        debug!(
                            event = "Query",
                            phase = "Empty",
                            rule = self.describe(),
                            path = path.to_string()
                        );
                        return Ok(Predicate::Empty);
                    }
                    nested => Predicate::related(path.clone(), nested),
                },
            };
            predicate = predicate.and(clause);
        }

        debug!(
            event = "Query",
            phase = "Built",
            rule = self.describe(),
            predicate = predicate.to_string()
        );
        Ok(predicate)
    }
}

/// Builder for [`R`]. Path specs are parsed here, once.
///
/// The first malformed path is reported by [`RBuilder::build`].
pub struct RBuilder<U: ?Sized> {
    pairs: Vec<(AttributePath, Matcher<U>)>,
    error: Option<RuleError>,
}

impl<U: ?Sized> RBuilder<U> {
    pub fn new() -> Self {
        Self {
            pairs: Vec::new(),
            error: None,
        }
    }

    /// Match `path` against an arbitrary matcher.
    pub fn matcher(mut self, path: &str, matcher: Matcher<U>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match AttributePath::parse(path) {
            Ok(path) => self.pairs.push((path, matcher)),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Match `path` against a constant.
    pub fn value(self, path: &str, value: impl Into<AttrValue>) -> Self {
        self.matcher(path, Matcher::value(value))
    }

    /// Match `path` against a value computed from the requesting user.
    pub fn user<F>(self, path: &str, f: F) -> Self
    where
        F: Fn(&U) -> AttrValue + Send + Sync + 'static,
    {
        self.matcher(path, Matcher::user(f))
    }

    /// Check the entities at `path` against a nested rule.
    pub fn rule<T>(self, path: &str, rule: T) -> Self
    where
        T: Rule<U> + 'static,
    {
        self.matcher(path, Matcher::rule(rule))
    }

    pub fn build(self) -> Result<R<U>, RuleError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(R { pairs: self.pairs })
    }
}

impl<U: ?Sized> Default for RBuilder<U> {
    fn default() -> Self {
        Self::new()
    }
}

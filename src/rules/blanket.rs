//! Rules that depend on the user alone, or on the identity of the instance.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::RuleError;
use crate::rule::Rule;
use crate::traits::Entity;
use crate::types::{AttrValue, AttributePath, EntityRef, Predicate};

type UserTest<U> = Arc<dyn Fn(&U) -> bool + Send + Sync>;

/// A rule that grants everything or nothing depending on the user.
///
/// Its bulk form is always a sentinel, so nesting it inside an `R` either
/// drops the pair or empties the whole query.
pub struct Blanket<U: ?Sized> {
    name: &'static str,
    test: UserTest<U>,
}

impl<U: ?Sized> Blanket<U> {
    pub fn new<F>(name: &'static str, test: F) -> Self
    where
        F: Fn(&U) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            test: Arc::new(test),
        }
    }
}

impl<U: ?Sized> Clone for Blanket<U> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            test: Arc::clone(&self.test),
        }
    }
}

impl<U: ?Sized> Debug for Blanket<U> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Blanket({})", self.name)
    }
}

impl<U: ?Sized> Rule<U> for Blanket<U> {
    fn check(&self, user: &U, _instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        Ok((self.test)(user))
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        Ok(if (self.test)(user) {
            Predicate::Universal
        } else {
            Predicate::Empty
        })
    }

    fn instance_independent(&self) -> bool {
        true
    }
}

/// Grants every user access to every instance.
pub fn always_allow<U: ?Sized>() -> Blanket<U> {
    Blanket::new("always_allow", |_| true)
}

/// Grants nobody access to anything.
pub fn always_deny<U: ?Sized>() -> Blanket<U> {
    Blanket::new("always_deny", |_| false)
}

type TargetFn<U> = Arc<dyn Fn(&U) -> EntityRef + Send + Sync>;
type TargetsFn<U> = Arc<dyn Fn(&U) -> Vec<EntityRef> + Send + Sync>;

/// Matches exactly the instance the user function points at, e.g. "a user
/// may see their own profile".
pub struct Is<U: ?Sized> {
    target: TargetFn<U>,
}

impl<U: ?Sized> Is<U> {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&U) -> EntityRef + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(target),
        }
    }
}

impl<U: ?Sized> Rule<U> for Is<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        Ok(instance.is_some_and(|i| i.entity_ref() == (self.target)(user)))
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        Ok(Predicate::equals(
            AttributePath::root(),
            AttrValue::Ref((self.target)(user)),
        ))
    }
}

/// Matches any instance among those the user function lists.
pub struct In<U: ?Sized> {
    targets: TargetsFn<U>,
}

impl<U: ?Sized> In<U> {
    pub fn new<F>(targets: F) -> Self
    where
        F: Fn(&U) -> Vec<EntityRef> + Send + Sync + 'static,
    {
        Self {
            targets: Arc::new(targets),
        }
    }
}

impl<U: ?Sized> Rule<U> for In<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        let Some(instance) = instance else {
            return Ok(false);
        };
        Ok((self.targets)(user).contains(&instance.entity_ref()))
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        let values = (self.targets)(user)
            .into_iter()
            .map(AttrValue::Ref)
            .collect();
        Ok(Predicate::one_of(AttributePath::root(), values))
    }
}

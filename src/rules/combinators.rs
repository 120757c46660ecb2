//! Boolean combinations of rules.

use std::sync::Arc;

use crate::error::RuleError;
use crate::rule::Rule;
use crate::traits::Entity;
use crate::types::Predicate;

/// Matches when every child matches.
pub struct And<U: ?Sized> {
    rules: Vec<Arc<dyn Rule<U>>>,
}

impl<U: ?Sized> And<U> {
    pub fn new(rules: Vec<Arc<dyn Rule<U>>>) -> Self {
        Self { rules }
    }
}

impl<U: ?Sized> Rule<U> for And<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        for rule in &self.rules {
            if !rule.check(user, instance)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        let mut predicate = Predicate::Universal;
        for rule in &self.rules {
            predicate = predicate.and(rule.query(user)?);
            if predicate.is_empty() {
                break;
            }
        }
        Ok(predicate)
    }

    fn instance_independent(&self) -> bool {
        self.rules.iter().all(|r| r.instance_independent())
    }
}

/// Matches when any child matches.
pub struct Or<U: ?Sized> {
    rules: Vec<Arc<dyn Rule<U>>>,
}

impl<U: ?Sized> Or<U> {
    pub fn new(rules: Vec<Arc<dyn Rule<U>>>) -> Self {
        Self { rules }
    }
}

impl<U: ?Sized> Rule<U> for Or<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        for rule in &self.rules {
            if rule.check(user, instance)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        let mut predicate = Predicate::Empty;
        for rule in &self.rules {
            predicate = predicate.or(rule.query(user)?);
            if predicate.is_universal() {
                break;
            }
        }
        Ok(predicate)
    }

    fn instance_independent(&self) -> bool {
        self.rules.iter().all(|r| r.instance_independent())
    }
}

/// Matches when the inner rule does not.
///
/// Without an instance the result is `false` unless the inner rule is
/// instance independent: "not an owner" cannot be decided for nothing.
pub struct Not<U: ?Sized> {
    rule: Arc<dyn Rule<U>>,
}

impl<U: ?Sized> Not<U> {
    pub fn new(rule: Arc<dyn Rule<U>>) -> Self {
        Self { rule }
    }
}

impl<U: ?Sized> Rule<U> for Not<U> {
    fn check(&self, user: &U, instance: Option<&dyn Entity>) -> Result<bool, RuleError> {
        if instance.is_none() && !self.rule.instance_independent() {
            return Ok(false);
        }
        Ok(!self.rule.check(user, instance)?)
    }

    fn query(&self, user: &U) -> Result<Predicate, RuleError> {
        Ok(self.rule.query(user)?.not())
    }

    fn instance_independent(&self) -> bool {
        self.rule.instance_independent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleExt;
    use crate::rules::{Blanket, R, always_allow, always_deny};
    use crate::types::AttributePath;

    struct Flags {
        staff: bool,
        superuser: bool,
    }

    fn is_staff() -> Blanket<Flags> {
        Blanket::new("is_staff", |u: &Flags| u.staff)
    }

    fn is_superuser() -> Blanket<Flags> {
        Blanket::new("is_superuser", |u: &Flags| u.superuser)
    }

    fn named(name: &str) -> R<Flags> {
        R::builder().value("name", name).build().unwrap()
    }

    #[test]
    fn test_blanket_combinations_without_instance() {
        let staff_only = Flags {
            staff: true,
            superuser: false,
        };
        assert!(!is_staff().and(is_superuser()).check(&staff_only, None).unwrap());
        assert!(is_staff().or(is_superuser()).check(&staff_only, None).unwrap());
        assert!(is_superuser().not().check(&staff_only, None).unwrap());
    }

    #[test]
    fn test_not_of_attribute_rule_without_instance_is_false() {
        let user = Flags {
            staff: false,
            superuser: false,
        };
        let rule = named("a").not();
        assert!(!rule.instance_independent());
        assert!(!rule.check(&user, None).unwrap());
    }

    #[test]
    fn test_query_sentinels() {
        let user = Flags {
            staff: false,
            superuser: false,
        };
        let name_a = Predicate::equals(AttributePath::parse("name").unwrap(), "a");

        assert_eq!(
            always_allow::<Flags>().and(named("a")).query(&user).unwrap(),
            name_a
        );
        assert_eq!(
            always_deny::<Flags>().and(named("a")).query(&user).unwrap(),
            Predicate::Empty
        );
        assert_eq!(
            always_allow::<Flags>().or(named("a")).query(&user).unwrap(),
            Predicate::Universal
        );
        assert_eq!(always_deny::<Flags>().or(named("a")).query(&user).unwrap(), name_a);
        assert_eq!(
            is_staff().not().query(&user).unwrap(),
            Predicate::Universal
        );
        assert_eq!(named("a").not().query(&user).unwrap(), name_a.not());
    }

    #[test]
    fn test_is_possible_for() {
        let staff = Flags {
            staff: true,
            superuser: false,
        };
        let nobody = Flags {
            staff: false,
            superuser: false,
        };
        let rule = is_staff().and(named("a"));
        assert!(rule.is_possible_for(&staff).unwrap());
        assert!(!rule.is_possible_for(&nobody).unwrap());
    }
}

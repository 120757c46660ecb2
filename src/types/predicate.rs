//! Bulk selection predicates and their sentinel algebra.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;
use utoipa::ToSchema;

use crate::error::RuleError;
use crate::resolve::{any_related, leaf_values};
use crate::traits::Entity;

use super::attr_value::AttrValue;
use super::path::AttributePath;

/// The set of instances satisfying some condition.
///
/// `Universal` and `Empty` are the two sentinels: they select every instance
/// and no instance respectively. Build compound predicates through
/// [`Predicate::and`], [`Predicate::or`] and [`Predicate::not`] so the
/// sentinels collapse instead of ending up inside relational clauses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, IntoStaticStr)]
#[serde(tag = "op", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Predicate {
    Universal,
    Empty,
    /// Some value at `path` equals `value`.
    Eq {
        #[schema(value_type = String)]
        path: AttributePath,
        value: AttrValue,
    },
    /// Some value at `path` is one of `values`.
    In {
        #[schema(value_type = String)]
        path: AttributePath,
        values: Vec<AttrValue>,
    },
    /// Some entity reached through `path` satisfies `predicate`.
    #[schema(no_recursion)]
    Related {
        #[schema(value_type = String)]
        path: AttributePath,
        predicate: Box<Predicate>,
    },
    #[schema(no_recursion)]
    And { all: Vec<Predicate> },
    #[schema(no_recursion)]
    Or { any: Vec<Predicate> },
    #[schema(no_recursion)]
    Not { predicate: Box<Predicate> },
}

impl Predicate {
    pub fn equals(path: AttributePath, value: impl Into<AttrValue>) -> Self {
        Predicate::Eq {
            path,
            value: value.into(),
        }
    }

    /// Membership test. An empty candidate list selects nothing.
    pub fn one_of(path: AttributePath, values: Vec<AttrValue>) -> Self {
        if values.is_empty() {
            return Predicate::Empty;
        }
        Predicate::In { path, values }
    }

    /// Existential clause over the entities at `path`.
    ///
    /// Sentinels are kept as-is: "some related entity exists" is not the
    /// same set as `Universal`, so callers that want to drop a universal
    /// sub-rule must do so before calling this.
    pub fn related(path: AttributePath, predicate: Predicate) -> Self {
        Predicate::Related {
            path,
            predicate: Box::new(predicate),
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, Predicate::Universal)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Predicate::Empty)
    }

    /// Conjunction. `Empty` absorbs, `Universal` is the identity.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Empty, _) | (_, Predicate::Empty) => Predicate::Empty,
            (Predicate::Universal, p) | (p, Predicate::Universal) => p,
            (Predicate::And { mut all }, Predicate::And { all: more }) => {
                all.extend(more);
                Predicate::And { all }
            }
            (Predicate::And { mut all }, p) => {
                all.push(p);
                Predicate::And { all }
            }
            (p, Predicate::And { all }) => {
                let mut combined = Vec::with_capacity(all.len() + 1);
                combined.push(p);
                combined.extend(all);
                Predicate::And { all: combined }
            }
            (a, b) => Predicate::And { all: vec![a, b] },
        }
    }

    /// Disjunction. `Universal` absorbs, `Empty` is the identity.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Universal, _) | (_, Predicate::Universal) => Predicate::Universal,
            (Predicate::Empty, p) | (p, Predicate::Empty) => p,
            (Predicate::Or { mut any }, Predicate::Or { any: more }) => {
                any.extend(more);
                Predicate::Or { any }
            }
            (Predicate::Or { mut any }, p) => {
                any.push(p);
                Predicate::Or { any }
            }
            (p, Predicate::Or { any }) => {
                let mut combined = Vec::with_capacity(any.len() + 1);
                combined.push(p);
                combined.extend(any);
                Predicate::Or { any: combined }
            }
            (a, b) => Predicate::Or { any: vec![a, b] },
        }
    }

    /// Negation. Swaps the sentinels and cancels double negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        match self {
            Predicate::Universal => Predicate::Empty,
            Predicate::Empty => Predicate::Universal,
            Predicate::Not { predicate } => *predicate,
            p => Predicate::Not {
                predicate: Box::new(p),
            },
        }
    }

    /// Fold with [`Predicate::and`]; no predicates at all is `Universal`.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        predicates
            .into_iter()
            .fold(Predicate::Universal, Predicate::and)
    }

    /// Fold with [`Predicate::or`]; no predicates at all is `Empty`.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        predicates.into_iter().fold(Predicate::Empty, Predicate::or)
    }

    /// Evaluate the predicate against a single entity.
    ///
    /// This is the reference interpretation repositories are expected to
    /// reproduce in their native query language.
    pub fn matches(&self, entity: &dyn Entity) -> Result<bool, RuleError> {
        match self {
            Predicate::Universal => Ok(true),
            Predicate::Empty => Ok(false),
            Predicate::Eq { path, value } => {
                Ok(leaf_values(entity, path)?.iter().any(|v| v == value))
            }
            Predicate::In { path, values } => Ok(leaf_values(entity, path)?
                .iter()
                .any(|v| values.contains(v))),
            Predicate::Related { path, predicate } => {
                any_related(entity, path, |related| predicate.matches(related))
            }
            Predicate::And { all } => {
                for p in all {
                    if !p.matches(entity)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or { any } => {
                for p in any {
                    if p.matches(entity)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { predicate } => Ok(!predicate.matches(entity)?),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Predicate::Universal => write!(f, "UNIVERSAL"),
            Predicate::Empty => write!(f, "EMPTY"),
            Predicate::Eq { path, value } => write!(f, "{path} == {value}"),
            Predicate::In { path, values } => {
                write!(f, "{path} in [{}]", values.iter().join(", "))
            }
            Predicate::Related { path, predicate } => write!(f, "{path} has ({predicate})"),
            Predicate::And { all } => write!(f, "({})", all.iter().join(" AND ")),
            Predicate::Or { any } => write!(f, "({})", any.iter().join(" OR ")),
            Predicate::Not { predicate } => write!(f, "NOT {predicate}"),
        }
    }
}

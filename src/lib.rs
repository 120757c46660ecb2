//! Declarative authorization rules with two evaluators.
//!
//! Every [`Rule`] answers "may this user act on this instance?" through
//! [`Rule::check`] and "which instances may this user act on?" through
//! [`Rule::query`], which yields a [`Predicate`] a [`Repository`] can
//! select with. For the same user the two answers agree.
pub use error::RuleError;
pub use memory::{MemoryStore, Row, Table};
pub use registry::{PermissionRegistry, PermissionRegistryBuilder};
pub use rule::{Rule, RuleExt};
pub use rules::{And, Blanket, In, Is, Matcher, Not, Or, R, RBuilder, always_allow, always_deny};
pub use traits::{Entity, Field, Repository};
pub use types::{AttrValue, AttributePath, EntityRef, PATH_SEPARATOR, Predicate};

mod error;
mod memory;
mod registry;
mod resolve;
mod rule;
mod rules;
mod traits;
pub mod types;

#[cfg(feature = "observability")]
pub mod metrics;
#[cfg(feature = "observability")]
mod timers;

#[cfg(test)]
mod tests;

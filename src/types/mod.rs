//! Data model types shared by rules, predicates and repositories.
//!
//! Canonical string forms:
//! - EntityRef: `Store::"7"` (the id may be unquoted when parsing)
//! - AttributePath: `branch__store` or `branch.store`

mod attr_value;
mod entity_ref;
mod path;
mod predicate;

pub use attr_value::AttrValue;
pub use entity_ref::EntityRef;
pub use path::{AttributePath, PATH_SEPARATOR};
pub use predicate::Predicate;

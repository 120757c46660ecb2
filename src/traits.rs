use crate::error::RuleError;
use crate::types::{AttrValue, EntityRef, Predicate};

/// What reading a single attribute of an entity yields.
pub enum Field {
    /// A plain value. `AttrValue::Null` on a relation means "no related entity".
    Value(AttrValue),
    /// Zero, one or many related entities (forward or reverse relation).
    Related(Vec<Box<dyn Entity>>),
}

/// A persisted instance that rules can inspect, e.g. a `Store` row.
///
/// The storage layer owns how attributes and relations are read; rules only
/// walk them one segment at a time.
pub trait Entity {
    /// Identity of the instance (kind and primary key)
    fn entity_ref(&self) -> EntityRef;

    /// Read the attribute or relation `name`.
    ///
    /// Unknown names must fail with [`RuleError::UnknownAttribute`] rather
    /// than resolve to `Null`, so schema mistakes surface to the caller.
    fn field(&self, name: &str) -> Result<Field, RuleError>;
}

impl<E: Entity + ?Sized> Entity for &E {
    fn entity_ref(&self) -> EntityRef {
        (**self).entity_ref()
    }

    fn field(&self, name: &str) -> Result<Field, RuleError> {
        (**self).field(name)
    }
}

impl<E: Entity + ?Sized> Entity for Box<E> {
    fn entity_ref(&self) -> EntityRef {
        (**self).entity_ref()
    }

    fn field(&self, name: &str) -> Result<Field, RuleError> {
        (**self).field(name)
    }
}

/// A bulk-selectable collection of entities of one kind.
pub trait Repository {
    type Item;

    /// Return every item satisfying `predicate`.
    ///
    /// Implementations must honour the sentinels: `Universal` selects
    /// everything and `Empty` selects nothing.
    fn select(&self, predicate: &Predicate) -> Result<Vec<Self::Item>, RuleError>;
}

//! An in-memory repository.
//!
//! Rows are attribute maps keyed by kind and id. An attribute holding an
//! `AttrValue::Ref` is a forward relation; reverse (one-to-many) relations
//! are declared with [`MemoryStore::relate_many`]. Selection evaluates the
//! predicate row by row with [`Predicate::matches`].

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::RuleError;
use crate::traits::{Entity, Field, Repository};
use crate::types::{AttrValue, EntityRef, Predicate};

type Attrs = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone)]
struct ReverseRelation {
    target_kind: String,
    via: String,
}

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<String, BTreeMap<u64, Attrs>>,
    reverse: HashMap<(String, String), ReverseRelation>,
    next_id: u64,
}

impl Tables {
    fn attrs(&self, entity: &EntityRef) -> Result<&Attrs, RuleError> {
        let table = self
            .rows
            .get(entity.kind())
            .ok_or_else(|| RuleError::UnknownKind(entity.kind().to_string()))?;
        entity
            .id()
            .parse::<u64>()
            .ok()
            .and_then(|id| table.get(&id))
            .ok_or_else(|| RuleError::RepositoryError(format!("no such entity {entity}")))
    }
}

/// A cloneable, thread-safe handle to an in-memory set of tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `kind` selectable even before any row is inserted.
    pub fn define_kind(&self, kind: &str) -> Result<(), RuleError> {
        self.inner
            .write()?
            .rows
            .entry(kind.to_string())
            .or_default();
        Ok(())
    }

    /// Insert a row and return its identity. Ids are allocated from a
    /// store-wide counter.
    pub fn insert<I, K>(&self, kind: &str, attrs: I) -> Result<EntityRef, RuleError>
    where
        I: IntoIterator<Item = (K, AttrValue)>,
        K: Into<String>,
    {
        let mut tables = self.inner.write()?;
        tables.next_id += 1;
        let id = tables.next_id;
        let attrs: Attrs = attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        tables
            .rows
            .entry(kind.to_string())
            .or_default()
            .insert(id, attrs);
        Ok(EntityRef::new(kind, id.to_string()))
    }

    /// Declare `kind.name` as the rows of `target_kind` whose `via`
    /// attribute refers back to the row.
    pub fn relate_many(
        &self,
        kind: &str,
        name: &str,
        target_kind: &str,
        via: &str,
    ) -> Result<(), RuleError> {
        self.inner.write()?.reverse.insert(
            (kind.to_string(), name.to_string()),
            ReverseRelation {
                target_kind: target_kind.to_string(),
                via: via.to_string(),
            },
        );
        Ok(())
    }

    /// Overwrite a single attribute of an existing row.
    pub fn set(&self, entity: &EntityRef, name: &str, value: AttrValue) -> Result<(), RuleError> {
        let mut tables = self.inner.write()?;
        tables.attrs(entity)?;
        let id = entity
            .id()
            .parse::<u64>()
            .map_err(|e| RuleError::InvalidFormat(e.to_string()))?;
        if let Some(row) = tables
            .rows
            .get_mut(entity.kind())
            .and_then(|table| table.get_mut(&id))
        {
            row.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn get(&self, entity: &EntityRef) -> Result<Row, RuleError> {
        self.inner.read()?.attrs(entity)?;
        Ok(self.row(entity.clone()))
    }

    /// The bulk-selectable table of `kind`.
    pub fn table(&self, kind: &str) -> Result<Table, RuleError> {
        if !self.inner.read()?.rows.contains_key(kind) {
            return Err(RuleError::UnknownKind(kind.to_string()));
        }
        Ok(Table {
            store: self.clone(),
            kind: kind.to_string(),
        })
    }

    fn row(&self, entity: EntityRef) -> Row {
        Row {
            store: self.clone(),
            entity,
        }
    }

    fn ids(&self, kind: &str) -> Result<Vec<EntityRef>, RuleError> {
        let tables = self.inner.read()?;
        let table = tables
            .rows
            .get(kind)
            .ok_or_else(|| RuleError::UnknownKind(kind.to_string()))?;
        Ok(table
            .keys()
            .map(|id| EntityRef::new(kind, id.to_string()))
            .collect())
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.inner.read() {
            Ok(tables) => f
                .debug_struct("MemoryStore")
                .field("kinds", &tables.rows.keys().collect::<Vec<_>>())
                .finish(),
            Err(_) => f.write_str("MemoryStore(<poisoned>)"),
        }
    }
}

/// A live handle to one row.
#[derive(Clone)]
pub struct Row {
    store: MemoryStore,
    entity: EntityRef,
}

impl Row {
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl Eq for Row {}

impl PartialEq<EntityRef> for Row {
    fn eq(&self, other: &EntityRef) -> bool {
        &self.entity == other
    }
}

impl Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Row({})", self.entity)
    }
}

impl Entity for Row {
    fn entity_ref(&self) -> EntityRef {
        self.entity.clone()
    }

    fn field(&self, name: &str) -> Result<Field, RuleError> {
        if name == "id" {
            return Ok(Field::Value(AttrValue::String(self.entity.id().to_string())));
        }

        let tables = self.store.inner.read()?;
        match tables.attrs(&self.entity)?.get(name) {
            Some(AttrValue::Ref(target)) => {
                let related: Box<dyn Entity> = Box::new(self.store.row(target.clone()));
                Ok(Field::Related(vec![related]))
            }
            Some(value) => Ok(Field::Value(value.clone())),
            None => {
                let key = (self.entity.kind().to_string(), name.to_string());
                let Some(relation) = tables.reverse.get(&key) else {
                    return Err(RuleError::unknown_attribute(self.entity.kind(), name));
                };
                let back = AttrValue::Ref(self.entity.clone());
                let related: Vec<EntityRef> = tables
                    .rows
                    .get(&relation.target_kind)
                    .into_iter()
                    .flat_map(|table| table.iter())
                    .filter(|(_, attrs)| attrs.get(&relation.via) == Some(&back))
                    .map(|(id, _)| EntityRef::new(&relation.target_kind, id.to_string()))
                    .collect();
                Ok(Field::Related(
                    related
                        .into_iter()
                        .map(|e| Box::new(self.store.row(e)) as Box<dyn Entity>)
                        .collect(),
                ))
            }
        }
    }
}

/// All rows of one kind; the unit [`Repository::select`] runs against.
#[derive(Debug, Clone)]
pub struct Table {
    store: MemoryStore,
    kind: String,
}

impl Table {
    pub fn all(&self) -> Result<Vec<Row>, RuleError> {
        self.select(&Predicate::Universal)
    }
}

impl Repository for Table {
    type Item = Row;

    fn select(&self, predicate: &Predicate) -> Result<Vec<Row>, RuleError> {
        if predicate.is_empty() {
            return Ok(Vec::new());
        }

        // Collect ids first; matching takes its own read locks per row.
        let mut selected = Vec::new();
        for entity in self.store.ids(&self.kind)? {
            let row = self.store.row(entity);
            if predicate.is_universal() || predicate.matches(&row)? {
                selected.push(row);
            }
        }

        debug!(
            event = "Select",
            kind = self.kind.as_str(),
            predicate = predicate.to_string(),
            selected = selected.len()
        );
        Ok(selected)
    }
}

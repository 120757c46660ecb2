//! Attribute path traversal shared by rule checks and predicate matching.
//!
//! Both evaluation paths go through these two functions, so a rule's check
//! and the predicate it builds agree on what a path resolves to.

use crate::error::RuleError;
use crate::traits::{Entity, Field};
use crate::types::{AttrValue, AttributePath};

/// Collect the comparable leaf values at `path`.
///
/// Every hop fans out over related entities. A related leaf contributes its
/// identity as `AttrValue::Ref`; an empty related set at the leaf contributes
/// `Null`. A relation that is missing halfway yields no values at all.
pub(crate) fn leaf_values(
    instance: &dyn Entity,
    path: &AttributePath,
) -> Result<Vec<AttrValue>, RuleError> {
    let Some((leaf, hops)) = path.segments().split_last() else {
        return Ok(vec![AttrValue::Ref(instance.entity_ref())]);
    };

    let mut out = Vec::new();
    if hops.is_empty() {
        push_leaf(instance.field(leaf)?, &mut out);
    } else {
        for entity in traverse(instance, hops)? {
            push_leaf(entity.field(leaf)?, &mut out);
        }
    }
    Ok(out)
}

/// True if any entity reached through `path` satisfies `test`.
///
/// The root path tests the instance itself. Stops at the first match.
pub(crate) fn any_related<F>(
    instance: &dyn Entity,
    path: &AttributePath,
    mut test: F,
) -> Result<bool, RuleError>
where
    F: FnMut(&dyn Entity) -> Result<bool, RuleError>,
{
    if path.is_root() {
        return test(instance);
    }
    for entity in traverse(instance, path.segments())? {
        if test(entity.as_ref())? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn traverse(instance: &dyn Entity, hops: &[String]) -> Result<Vec<Box<dyn Entity>>, RuleError> {
    let Some((first, rest)) = hops.split_first() else {
        return Ok(Vec::new());
    };

    let mut frontier = related(instance.field(first)?, first)?;
    for hop in rest {
        let mut next = Vec::new();
        for entity in &frontier {
            next.extend(related(entity.field(hop)?, hop)?);
        }
        frontier = next;
    }
    Ok(frontier)
}

fn related(field: Field, name: &str) -> Result<Vec<Box<dyn Entity>>, RuleError> {
    match field {
        Field::Related(entities) => Ok(entities),
        Field::Value(value) if value.is_null() => Ok(Vec::new()),
        Field::Value(_) => Err(RuleError::NotARelation(name.to_string())),
    }
}

fn push_leaf(field: Field, out: &mut Vec<AttrValue>) {
    match field {
        Field::Value(value) => out.push(value),
        Field::Related(entities) if entities.is_empty() => out.push(AttrValue::Null),
        Field::Related(entities) => {
            out.extend(entities.iter().map(|e| AttrValue::Ref(e.entity_ref())));
        }
    }
}

//! Entity identities.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RuleError;

/// The identity of a persisted entity: its kind and its primary key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    /// Entity kind, e.g. "Store" or "Shrubbery"
    kind: String,
    /// Primary key, rendered quoted
    id: String,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, r#"{}::"{}""#, self.kind, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = RuleError;

    /// Accepts:
    /// - Store::7
    /// - Store::"7"
    /// - Store::"web:8080" (the id may itself contain colons when quoted)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, id)) = s.split_once("::") else {
            return Err(RuleError::InvalidFormat(format!(
                "Failed to parse entity reference: missing kind in '{s}' (expected format: Kind::id)"
            )));
        };
        let id = id.trim_matches('"');
        if kind.is_empty() || id.is_empty() {
            return Err(RuleError::InvalidFormat(format!(
                "Failed to parse entity reference '{s}' (expected format: Kind::id)"
            )));
        }
        Ok(EntityRef::new(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        unquoted = { "Store::7", "Store", "7" },
        quoted = { r#"Store::"7""#, "Store", "7" },
        colon_in_id = { r#"Host::"web:8080""#, "Host", "web:8080" },
    )]
    fn test_fromstr_entity_ref(input: &str, kind: &str, id: &str) {
        let parsed = EntityRef::from_str(input).unwrap();
        assert_eq!(parsed.kind(), kind);
        assert_eq!(parsed.id(), id);
    }

    #[parameterized(
        no_kind = { "7" },
        empty_kind = { "::7" },
        empty_id = { r#"Store::"""# },
    )]
    fn test_fromstr_entity_ref_invalid(input: &str) {
        assert!(matches!(
            EntityRef::from_str(input),
            Err(RuleError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let original = EntityRef::new("Branch", "3");
        assert_eq!(original.to_string(), r#"Branch::"3""#);
        assert_eq!(EntityRef::from_str(&original.to_string()).unwrap(), original);
    }
}

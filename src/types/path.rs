//! Attribute paths, e.g. `branch__store` or `branch.profile.user`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Separator used when rendering a path.
pub const PATH_SEPARATOR: &str = "__";

static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("segment pattern is valid"));

/// An ordered traversal from an instance to a leaf value or related entity.
///
/// Parsed once from its textual form; the empty (root) path denotes the
/// instance itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// The path that resolves to the instance itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a path spec. Segments are joined with `__` or `.`.
    pub fn parse(spec: &str) -> Result<Self, RuleError> {
        if spec.is_empty() {
            return Err(RuleError::InvalidPath(
                "empty path (use AttributePath::root() for the instance itself)".to_string(),
            ));
        }

        let segments: Vec<String> = spec
            .split('.')
            .flat_map(|part| part.split(PATH_SEPARATOR))
            .map(str::to_string)
            .collect();

        if let Some(bad) = segments.iter().find(|s| !SEGMENT.is_match(s)) {
            return Err(RuleError::InvalidPath(format!(
                "invalid segment '{bad}' in '{spec}'"
            )));
        }

        Ok(Self(segments))
    }
}

impl Display for AttributePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_root() {
            return write!(f, "pk");
        }
        write!(f, "{}", self.0.iter().join(PATH_SEPARATOR))
    }
}

impl FromStr for AttributePath {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttributePath::parse(s)
    }
}

impl TryFrom<String> for AttributePath {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(AttributePath::root());
        }
        AttributePath::parse(&value)
    }
}

impl From<AttributePath> for String {
    fn from(path: AttributePath) -> Self {
        path.0.join(PATH_SEPARATOR)
    }
}

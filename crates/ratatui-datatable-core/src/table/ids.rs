use std::fmt;
use std::str::FromStr;

/// Stable identity of a table column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Sequence id handed out to columns registered without an explicit id.
    pub fn auto(index: usize) -> Self {
        Self(format!("col-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ColumnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable identity of a table row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

const COLUMN_PREFIX: &str = "column:";
const ROW_PREFIX: &str = "row:";

/// Identity of a draggable item, namespaced by kind.
///
/// The string form carries a fixed prefix (`column:` or `row:`) so that ids coming from an
/// untyped source can be routed to the right order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragId {
    Column(ColumnId),
    Row(RowId),
}

impl fmt::Display for DragId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragId::Column(id) => write!(f, "{COLUMN_PREFIX}{id}"),
            DragId::Row(id) => write!(f, "{ROW_PREFIX}{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseDragIdError {
    #[error("drag id `{0}` has no `column:` or `row:` prefix")]
    UnknownNamespace(String),
    #[error("drag id `{0}` has an empty identifier")]
    Empty(String),
}

impl FromStr for DragId {
    type Err = ParseDragIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = if let Some(rest) = s.strip_prefix(COLUMN_PREFIX) {
            (!rest.is_empty()).then(|| DragId::Column(ColumnId::new(rest)))
        } else if let Some(rest) = s.strip_prefix(ROW_PREFIX) {
            (!rest.is_empty()).then(|| DragId::Row(RowId::new(rest)))
        } else {
            return Err(ParseDragIdError::UnknownNamespace(s.to_string()));
        };
        parsed.ok_or_else(|| ParseDragIdError::Empty(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_ids_round_trip_through_prefixed_strings() {
        let col = DragId::Column(ColumnId::new("email"));
        assert_eq!(col.to_string(), "column:email");
        assert_eq!("column:email".parse::<DragId>(), Ok(col));
        assert_eq!(
            "row:42".parse::<DragId>(),
            Ok(DragId::Row(RowId::new("42")))
        );
    }

    #[test]
    fn rejects_unknown_namespace_and_empty_ids() {
        assert_eq!(
            "cell:1".parse::<DragId>(),
            Err(ParseDragIdError::UnknownNamespace("cell:1".to_string()))
        );
        assert_eq!(
            "row:".parse::<DragId>(),
            Err(ParseDragIdError::Empty("row:".to_string()))
        );
    }
}

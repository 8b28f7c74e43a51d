use crate::table::ids::ColumnId;

/// Sort glyph shown next to a column title. Purely visual; the table never sorts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortIndicator {
    Ascending,
    Descending,
    Unsorted,
}

impl SortIndicator {
    pub fn glyph(self) -> char {
        match self {
            SortIndicator::Ascending => '▲',
            SortIndicator::Descending => '▼',
            SortIndicator::Unsorted => '↕',
        }
    }
}

/// Column definition for [`crate::table::TableView`], in terminal cells.
///
/// The view registers every column on each frame; the registry keeps the current width, so
/// `default_width` only matters the first time an id is seen.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableColumn {
    /// Needed for column reordering and for cells that align by id.
    pub id: Option<ColumnId>,
    pub title: String,
    pub min_width: u16,
    pub default_width: Option<u16>,
    pub max_width: Option<u16>,
    pub sort: Option<SortIndicator>,
}

impl TableColumn {
    pub fn new(title: impl Into<String>, min_width: u16) -> Self {
        Self {
            id: None,
            title: title.into(),
            min_width,
            default_width: None,
            max_width: None,
            sort: None,
        }
    }

    pub fn id(mut self, id: impl Into<ColumnId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn default_width(mut self, width: u16) -> Self {
        self.default_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: u16) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn sort(mut self, sort: SortIndicator) -> Self {
        self.sort = Some(sort);
        self
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::type_inference::ColumnType;
use crate::utils::text::normalize_whitespace;

pub const ATTR_ID: &str = "id";
pub const ATTR_CLASS: &str = "class";
pub const ATTR_SORTABLE: &str = "data-sortable";
pub const ATTR_PAGINATE: &str = "data-paginate";
pub const ATTR_FILTER_ACTIVE: &str = "data-filter-active";
pub const ATTR_FILTER_COL: &str = "data-filter-col";
pub const ATTR_FILTER_VALUE: &str = "data-filter-value";

/// Direction of the arrow drawn next to a sorted header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortIndicator {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortIndicator {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortIndicator::None => "",
            SortIndicator::Ascending => "▲",
            SortIndicator::Descending => "▼",
        }
    }

    /// Value of the accessibility sort-state marker
    pub fn aria_sort(&self) -> &'static str {
        match self {
            SortIndicator::None => "none",
            SortIndicator::Ascending => "ascending",
            SortIndicator::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    pub text: String,
    /// Header-declared column type (`data-type`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<ColumnType>,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default, skip)]
    pub indicator: SortIndicator,
    #[serde(default, skip)]
    pub hidden: bool,
}

fn default_true() -> bool {
    true
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            declared_type: None,
            sortable: true,
            indicator: SortIndicator::None,
            hidden: false,
        }
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.declared_type = Some(column_type);
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn aria_sort(&self) -> &'static str {
        self.indicator.aria_sort()
    }

    /// Header text with the sort arrow appended, as it is displayed
    pub fn label(&self) -> String {
        match self.indicator {
            SortIndicator::None => self.text.clone(),
            indicator => format!("{} {}", self.text, indicator.arrow()),
        }
    }
}

/// A single body cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    /// Canonical value (`data-sort-value`), preferred over `text` for sorting and filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_value: Option<String>,
    /// `Some(true)` when the cell holds an active status dot, `Some(false)` for an inactive one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_dot: Option<bool>,
    #[serde(default, skip)]
    pub hidden: bool,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_sort_value(mut self, value: impl Into<String>) -> Self {
        self.sort_value = Some(value.into());
        self
    }

    pub fn with_status(mut self, active: bool) -> Self {
        self.status_dot = Some(active);
        self
    }

    /// The canonical sort value if present, otherwise the displayed text
    pub fn value(&self) -> &str {
        self.sort_value.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub hidden: bool,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            hidden: false,
        }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Cell::new).collect())
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableBody {
    pub rows: Vec<Row>,
}

/// A `<table>`-like element: attributes, header row and body rows.
///
/// The order of `body.rows` is the authoritative row order; sorting moves
/// rows, pagination and filtering only flip their `hidden` flags.
#[derive(Debug, Clone, PartialEq)]
pub struct TableElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Text of the heading that introduces this table
    pub heading: Option<String>,
    pub header: Vec<HeaderCell>,
    pub body: Option<TableBody>,
}

impl TableElement {
    pub fn new(header: Vec<HeaderCell>, rows: Vec<Row>) -> Self {
        Self {
            tag: "table".to_string(),
            attributes: BTreeMap::new(),
            heading: None,
            header,
            body: Some(TableBody { rows }),
        }
    }

    pub fn is_table(&self) -> bool {
        self.tag.eq_ignore_ascii_case("table")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute(ATTR_ID).filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute(ATTR_CLASS)
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn is_sortable(&self) -> bool {
        self.has_attribute(ATTR_SORTABLE)
    }

    pub fn is_paginated(&self) -> bool {
        self.has_attribute(ATTR_PAGINATE)
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn rows(&self) -> &[Row] {
        self.body.as_ref().map(|b| b.rows.as_slice()).unwrap_or(&[])
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        match self.body.as_mut() {
            Some(body) => body.rows.as_mut_slice(),
            None => &mut [],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn column_index(&self, header_text: &str) -> Option<usize> {
        let wanted = header_text.trim();
        self.header.iter().position(|h| h.text.trim() == wanted)
    }

    /// Rows currently displayed, in document order
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows().iter().filter(|r| !r.hidden)
    }
}

/// The single active value filter of a table, stored in its filter attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub active: bool,
    pub column: Option<usize>,
    pub value: Option<String>,
}

impl FilterState {
    pub fn new(column: usize, value: impl Into<String>) -> Self {
        Self {
            active: true,
            column: Some(column),
            value: Some(value.into()),
        }
    }

    /// Column and value when a filter is actually in effect
    pub fn criteria(&self) -> Option<(usize, &str)> {
        match (self.active, self.column, self.value.as_deref()) {
            (true, Some(column), Some(value)) => Some((column, value)),
            _ => None,
        }
    }

    /// Whether `row` belongs to the effective row set under this filter.
    ///
    /// The cell's canonical value is whitespace-normalized and compared
    /// exactly; a missing cell never matches.
    pub fn matches(&self, row: &Row) -> bool {
        match self.criteria() {
            Some((column, value)) => row
                .cell(column)
                .map(|cell| normalize_whitespace(cell.value()) == value)
                .unwrap_or(false),
            None => true,
        }
    }
}

impl TableElement {
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            active: self.attribute(ATTR_FILTER_ACTIVE) == Some("true"),
            column: self
                .attribute(ATTR_FILTER_COL)
                .and_then(|c| c.parse::<usize>().ok()),
            value: self.attribute(ATTR_FILTER_VALUE).map(str::to_string),
        }
    }

    pub fn set_filter_state(&mut self, state: &FilterState) {
        match state.criteria() {
            Some((column, value)) => {
                self.set_attribute(ATTR_FILTER_ACTIVE, "true");
                self.set_attribute(ATTR_FILTER_COL, column.to_string());
                self.set_attribute(ATTR_FILTER_VALUE, value);
            }
            None => {
                self.set_attribute(ATTR_FILTER_ACTIVE, "false");
                self.remove_attribute(ATTR_FILTER_COL);
                self.remove_attribute(ATTR_FILTER_VALUE);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_attributes_round_trip() {
        let mut table = TableElement::new(vec![HeaderCell::new("a")], vec![]);
        assert!(!table.filter_state().active);

        table.set_filter_state(&FilterState::new(2, "open"));
        assert_eq!(table.attribute(ATTR_FILTER_COL), Some("2"));
        assert_eq!(table.filter_state().criteria(), Some((2, "open")));

        table.set_filter_state(&FilterState::default());
        assert_eq!(table.attribute(ATTR_FILTER_ACTIVE), Some("false"));
        assert!(table.filter_state().criteria().is_none());
    }

    #[test]
    fn test_filter_matches_normalized_value() {
        let row = Row::new(vec![
            Cell::new("x"),
            Cell::new(" Paid\u{a0} ").with_sort_value("In  transit"),
        ]);
        assert!(FilterState::new(1, "In transit").matches(&row));
        assert!(!FilterState::new(1, "In").matches(&row));
        assert!(!FilterState::new(5, "x").matches(&row));
        assert!(FilterState::default().matches(&row));
    }

    #[test]
    fn test_cell_value_prefers_sort_value() {
        let cell = Cell::new("1 234 €").with_sort_value("1234");
        assert_eq!(cell.value(), "1234");
        assert_eq!(Cell::new("plain").value(), "plain");
    }

    #[test]
    fn test_header_label_shows_arrow() {
        let mut header = HeaderCell::new("Name");
        assert_eq!(header.label(), "Name");
        assert_eq!(header.aria_sort(), "none");
        header.indicator = SortIndicator::Descending;
        assert_eq!(header.label(), "Name ▼");
        assert_eq!(header.aria_sort(), "descending");
    }
}

//! Table events exchanged between controllers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Events published on a table's event bus
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// Rows were reordered
    Sort {
        index: usize,
        direction: SortDirection,
    },

    /// The active value filter changed; both fields are `None` when cleared
    Filter {
        column: Option<usize>,
        value: Option<String>,
    },
}

impl TableEvent {
    pub fn kind(&self) -> TableEventKind {
        match self {
            TableEvent::Sort { .. } => TableEventKind::Sort,
            TableEvent::Filter { .. } => TableEventKind::Filter,
        }
    }

    pub fn filter_cleared() -> Self {
        TableEvent::Filter {
            column: None,
            value: None,
        }
    }
}

/// Event names subscribers register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableEventKind {
    Sort,
    Filter,
}

impl TableEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            TableEventKind::Sort => "sort",
            TableEventKind::Filter => "filter",
        }
    }
}

//! Sort controller: type-aware, stable reordering of a table's rows

use anyhow::{bail, Result};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::config::SortingConfig;
use crate::data::compare::{compare_keys, SortKey};
use crate::data::type_inference::{ColumnType, TypeInference};
use crate::dom::element::{Cell, Row, SortIndicator};
use crate::dom::Table;
use crate::state::{SortDirection, TableEvent};

pub type Accessor = Rc<dyn Fn(&Cell, &Row) -> String>;
pub type Comparator = Rc<dyn Fn(&str, &str) -> Ordering>;

/// Optional per-column overrides supplied by the host
#[derive(Clone, Default)]
pub struct ColumnDescriptor {
    pub column_type: Option<ColumnType>,
    pub accessor: Option<Accessor>,
    /// Always wins over the type-derived ordering
    pub comparator: Option<Comparator>,
}

impl ColumnDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = Some(column_type);
        self
    }

    pub fn with_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&Cell, &Row) -> String + 'static,
    {
        self.accessor = Some(Rc::new(accessor));
        self
    }

    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + 'static,
    {
        self.comparator = Some(Rc::new(comparator));
        self
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("column_type", &self.column_type)
            .field("accessor", &self.accessor.is_some())
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    /// `None` while the table is unsorted
    pub index: Option<usize>,
    pub direction: SortDirection,
}

/// Raw value of a row's cell used for sorting.
///
/// Accessor first, then the status dot (1/0), then the canonical sort value,
/// then the trimmed text.
pub fn extract_value(row: &Row, column: usize, accessor: Option<&Accessor>) -> String {
    let empty = Cell::default();
    let cell = row.cell(column).unwrap_or(&empty);

    if let Some(accessor) = accessor {
        return accessor(cell, row);
    }
    if let Some(active) = cell.status_dot {
        return if active { "1" } else { "0" }.to_string();
    }
    match &cell.sort_value {
        Some(value) => value.clone(),
        None => cell.text.trim().to_string(),
    }
}

pub struct SortController {
    table: Table,
    columns: Vec<ColumnDescriptor>,
    inference: TypeInference,
    state: SortState,
}

impl SortController {
    /// Bind to `table`, sorting by the first column when it has rows
    pub fn bind(table: Table, columns: Vec<ColumnDescriptor>, config: &SortingConfig) -> Result<Self> {
        {
            let element = table.element();
            if !element.is_table() {
                bail!("Cannot bind sorting to <{}>: not a table", element.tag);
            }
            if element.body.is_none() {
                bail!("Cannot bind sorting: table has no body");
            }
        }

        let mut controller = Self {
            table,
            columns,
            inference: TypeInference::new(config.sample_size, config.detection_threshold),
            state: SortState::default(),
        };

        let (rows, columns) = {
            let element = controller.table.element();
            (element.row_count(), element.column_count())
        };
        if config.sort_on_load && rows > 0 && columns > 0 {
            controller.sort_by(0, SortDirection::Asc)?;
        }
        Ok(controller)
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Type the column would be sorted as
    pub fn column_type(&self, column: usize) -> Option<ColumnType> {
        let element = self.table.element();
        let header = element.header.get(column)?;
        let accessor = self.columns.get(column).and_then(|d| d.accessor.as_ref());
        let values: Vec<String> = element
            .rows()
            .iter()
            .map(|row| extract_value(row, column, accessor))
            .collect();
        Some(self.resolve_type(column, header.declared_type, &values))
    }

    fn resolve_type(&self, column: usize, declared: Option<ColumnType>, values: &[String]) -> ColumnType {
        self.columns
            .get(column)
            .and_then(|d| d.column_type)
            .or(declared)
            .unwrap_or_else(|| self.inference.detect(values))
    }

    pub fn sort_by(&mut self, column: usize, direction: SortDirection) -> Result<()> {
        let descriptor = self.columns.get(column).cloned().unwrap_or_default();

        {
            let mut element = self.table.element_mut();
            if column >= element.column_count() {
                bail!(
                    "Column {} out of bounds (table has {} columns)",
                    column,
                    element.column_count()
                );
            }
            let declared = element.header[column].declared_type;

            let Some(body) = element.body.as_mut() else {
                bail!("Cannot sort: table has no body");
            };
            if body.rows.is_empty() {
                debug!(target: "sort", "Nothing to sort in an empty table");
                return Ok(());
            }

            let rows = std::mem::take(&mut body.rows);
            let values: Vec<String> = rows
                .iter()
                .map(|row| extract_value(row, column, descriptor.accessor.as_ref()))
                .collect();

            // Ties fall back to the position before this pass
            let mut order: Vec<usize> = (0..rows.len()).collect();
            let column_type = match &descriptor.comparator {
                Some(comparator) => {
                    order.sort_by(|&a, &b| {
                        direction
                            .apply(comparator(&values[a], &values[b]))
                            .then(a.cmp(&b))
                    });
                    None
                }
                None => {
                    let column_type = self.resolve_type(column, declared, &values);
                    let keys: Vec<SortKey> = values
                        .iter()
                        .map(|v| SortKey::from_raw(v, column_type))
                        .collect();
                    order.sort_by(|&a, &b| {
                        compare_keys(&keys[a], &keys[b], direction).then(a.cmp(&b))
                    });
                    Some(column_type)
                }
            };

            // Single batched move into the new order
            let mut slots: Vec<Option<Row>> = rows.into_iter().map(Some).collect();
            body.rows = order.into_iter().filter_map(|i| slots[i].take()).collect();

            for (index, header) in element.header.iter_mut().enumerate() {
                header.indicator = if index != column {
                    SortIndicator::None
                } else {
                    match direction {
                        SortDirection::Asc => SortIndicator::Ascending,
                        SortDirection::Desc => SortIndicator::Descending,
                    }
                };
            }

            match column_type {
                Some(ty) => info!(target: "sort", "Sorted column {} {} as {}", column, direction, ty),
                None => info!(target: "sort", "Sorted column {} {} with custom comparator", column, direction),
            }
        }

        self.state = SortState {
            index: Some(column),
            direction,
        };
        self.table.events().publish(TableEvent::Sort {
            index: column,
            direction,
        });
        Ok(())
    }

    /// Header click: same column toggles, a new column starts ascending.
    ///
    /// Returns `false` when the header opted out of sorting.
    pub fn click_header(&mut self, column: usize) -> Result<bool> {
        let sortable = match self.table.element().header.get(column) {
            Some(header) => header.sortable,
            None => bail!("Column {} out of bounds", column),
        };
        if !sortable {
            debug!(target: "sort", "Header {} is not sortable", column);
            return Ok(false);
        }

        let direction = match self.state.index {
            Some(current) if current == column => self.state.direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.sort_by(column, direction)?;
        Ok(true)
    }

    /// Re-apply the current sort, e.g. after rows changed
    pub fn resort(&mut self) -> Result<()> {
        match self.state.index {
            Some(column) => self.sort_by(column, self.state.direction),
            None => Ok(()),
        }
    }
}

//! Bulk binding of every controller a document asks for

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

use crate::config::Config;
use crate::controllers::filter::{init_value_filters, FilterConfig, FilterController};
use crate::controllers::pagination::PaginationController;
use crate::controllers::sort::SortController;
use crate::controllers::visibility::ColumnVisibilityController;
use crate::dom::{Document, Table};
use crate::preferences::PreferenceStore;

/// Controllers bound to one table
pub struct TableBindings {
    pub table: Table,
    pub sorter: Option<Rc<RefCell<SortController>>>,
    pub pager: Option<Rc<RefCell<PaginationController>>>,
    pub visibility: Option<ColumnVisibilityController>,
    pub filters: Option<FilterController>,
}

impl TableBindings {
    fn new(table: Table) -> Self {
        Self {
            table,
            sorter: None,
            pager: None,
            visibility: None,
            filters: None,
        }
    }
}

pub struct PageBindings {
    tables: Vec<TableBindings>,
}

impl PageBindings {
    /// Bindings of the document's `index`-th table
    pub fn get(&self, index: usize) -> Option<&TableBindings> {
        self.tables.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TableBindings> {
        self.tables.get_mut(index)
    }

    pub fn tables(&self) -> &[TableBindings] {
        &self.tables
    }

    pub fn sorted_count(&self) -> usize {
        self.tables.iter().filter(|t| t.sorter.is_some()).count()
    }

    pub fn paginated_count(&self) -> usize {
        self.tables.iter().filter(|t| t.pager.is_some()).count()
    }

    /// Build a filter bar for a bound table.
    ///
    /// Without an explicit re-sort callback, the table's sort controller
    /// re-applies its current order after each filter change.
    pub fn init_value_filters(&mut self, document: &mut Document, config: FilterConfig) -> Result<&FilterController> {
        let mut controller = init_value_filters(document, config)?;
        let index = document
            .index_of(controller.table())
            .ok_or_else(|| anyhow!("Filtered table is not part of the document"))?;
        let bindings = self
            .tables
            .get_mut(index)
            .ok_or_else(|| anyhow!("Table {} has no bindings", index))?;

        if !controller.has_on_resort() {
            if let Some(sorter) = &bindings.sorter {
                let sorter = Rc::downgrade(sorter);
                controller.set_on_resort(Box::new(move || {
                    let Some(sorter) = sorter.upgrade() else { return };
                    let Ok(mut sorter) = sorter.try_borrow_mut() else {
                        warn!(target: "filter", "Sort controller busy, skipping re-sort");
                        return;
                    };
                    if let Err(e) = sorter.resort() {
                        warn!(target: "filter", "Re-sort after filter failed: {:#}", e);
                    }
                }));
            }
        }

        Ok(&*bindings.filters.insert(controller))
    }
}

/// Bind sorting, pagination and column toggles across `document`.
///
/// A table that fails to bind is logged and left without that controller;
/// the remaining tables still initialize.
pub fn init_tables(document: &Document, config: &Config, store: Rc<dyn PreferenceStore>) -> PageBindings {
    let mut tables: Vec<TableBindings> = document
        .tables()
        .iter()
        .cloned()
        .map(TableBindings::new)
        .collect();

    for (index, bindings) in tables.iter_mut().enumerate() {
        let (sortable, paginated) = {
            let element = bindings.table.element();
            (element.is_sortable(), element.is_paginated())
        };

        if sortable {
            match SortController::bind(bindings.table.clone(), Vec::new(), &config.sorting) {
                Ok(sorter) => bindings.sorter = Some(Rc::new(RefCell::new(sorter))),
                Err(e) => warn!(target: "sort", "Skipping sorting for table {}: {:#}", index, e),
            }
        }

        // After sorting so the first page reflects the initial order
        if paginated {
            match PaginationController::bind(
                bindings.table.clone(),
                config.pagination.default_per_page,
                store.clone(),
                &config.pagination,
            ) {
                Ok(pager) => bindings.pager = Some(pager),
                Err(e) => warn!(target: "pagination", "Skipping pagination for table {}: {:#}", index, e),
            }
        }
    }

    for toggle in document.toggles() {
        let target = match document.find_table(&toggle.target) {
            Ok(Some(table)) => table,
            Ok(None) => {
                warn!(target: "visibility", "No table matches toggle target '{}'", toggle.target);
                continue;
            }
            Err(e) => {
                warn!(target: "visibility", "Bad toggle target '{}': {:#}", toggle.target, e);
                continue;
            }
        };
        let Some(index) = document.index_of(&target) else { continue };

        match ColumnVisibilityController::new(target, toggle, index, store.clone(), &config.visibility) {
            Ok(controller) => tables[index].visibility = Some(controller),
            Err(e) => warn!(target: "visibility", "Skipping column toggle for table {}: {:#}", index, e),
        }
    }

    let bindings = PageBindings { tables };
    info!(
        "Bound {} tables ({} sortable, {} paginated)",
        bindings.tables.len(),
        bindings.sorted_count(),
        bindings.paginated_count()
    );
    bindings
}

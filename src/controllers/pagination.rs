//! Windowed pagination over the effective row set.
//!
//! The controller never asks the sort or filter controllers anything. It
//! re-reads the table on every render: the row order as it stands and the
//! filter attributes. Sort and filter events only reset it to page 1.

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::config::config::PaginationConfig;
use crate::dom::{Document, Table};
use crate::preferences::{load_json, save_json, PreferenceStore, PER_PAGE_KEY};
use crate::state::{TableEvent, TableEventKind, TableEventSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page { number: usize, current: bool },
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSizeSelector {
    pub options: Vec<usize>,
    pub selected: usize,
}

/// Controls rebuilt on every render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlPanel {
    pub page_size: PageSizeSelector,
    pub pages: Vec<PageItem>,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub summary: String,
}

impl ControlPanel {
    /// One-line text form, e.g. `[25] ‹ 1 [2] 3 … 9 ›`
    pub fn render_line(&self) -> String {
        let mut parts = vec![format!("[{}/page]", self.page_size.selected)];
        parts.push(if self.prev_enabled { "‹" } else { " " }.to_string());
        for item in &self.pages {
            parts.push(match item {
                PageItem::Page { number, current: true } => format!("[{}]", number),
                PageItem::Page { number, .. } => number.to_string(),
                PageItem::Ellipsis => "…".to_string(),
            });
        }
        parts.push(if self.next_enabled { "›" } else { " " }.to_string());
        parts.join(" ")
    }
}

/// Page buttons for `current` of `total`, collapsed with ellipses past `max_buttons`
pub fn page_items(current: usize, total: usize, max_buttons: usize) -> Vec<PageItem> {
    let page = |number: usize| PageItem::Page {
        number,
        current: number == current,
    };

    // Shortest layout that still fits first, last and a window of three
    let max_buttons = max_buttons.max(7);
    if total <= max_buttons {
        return (1..=total).map(page).collect();
    }

    let run = max_buttons - 2;
    let mut items = Vec::with_capacity(max_buttons);
    if current <= run - 2 {
        items.extend((1..=run).map(page));
        items.push(PageItem::Ellipsis);
        items.push(page(total));
    } else if current + (run - 3) >= total {
        items.push(page(1));
        items.push(PageItem::Ellipsis);
        items.extend((total - run + 1..=total).map(page));
    } else {
        items.push(page(1));
        items.push(PageItem::Ellipsis);
        items.extend((current - 1..=current + 1).map(page));
        items.push(PageItem::Ellipsis);
        items.push(page(total));
    }
    items
}

pub struct PaginationController {
    table: Table,
    store: Rc<dyn PreferenceStore>,
    per_page: usize,
    current_page: usize,
    total_pages: usize,
    page_size_options: Vec<usize>,
    max_page_buttons: usize,
    effective_count: usize,
    total_count: usize,
    /// Positions within the effective row set shown on this page
    window: Range<usize>,
    panel: ControlPanel,
}

impl PaginationController {
    /// Bind to `table`, render page 1 and subscribe to its sort and filter events
    pub fn bind(
        table: Table,
        default_per_page: usize,
        store: Rc<dyn PreferenceStore>,
        config: &PaginationConfig,
    ) -> Result<Rc<RefCell<Self>>> {
        {
            let element = table.element();
            if !element.is_table() {
                bail!("Cannot paginate <{}>: not a table", element.tag);
            }
            if element.body.is_none() {
                bail!("Cannot paginate: table has no body");
            }
        }
        if default_per_page == 0 {
            bail!("Page size must be at least 1");
        }

        let per_page = load_json::<usize>(store.as_ref(), PER_PAGE_KEY)
            .filter(|&n| n > 0)
            .unwrap_or(default_per_page);

        let mut controller = Self {
            table: table.clone(),
            store,
            per_page,
            current_page: 1,
            total_pages: 1,
            page_size_options: config.page_size_options.clone(),
            max_page_buttons: config.max_page_buttons,
            effective_count: 0,
            total_count: 0,
            window: 0..0,
            panel: ControlPanel::default(),
        };
        controller.render();

        let controller = Rc::new(RefCell::new(controller));
        let subscriber: Rc<RefCell<dyn TableEventSubscriber>> = controller.clone();
        table.events().subscribe(TableEventKind::Sort, &subscriber);
        table.events().subscribe(TableEventKind::Filter, &subscriber);
        Ok(controller)
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn effective_count(&self) -> usize {
        self.effective_count
    }

    pub fn window(&self) -> Range<usize> {
        self.window.clone()
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Recompute the effective rows and show the current page's slice
    pub fn render(&mut self) {
        let mut element = self.table.element_mut();
        let filter = element.filter_state();

        let effective: Vec<usize> = element
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();

        self.total_count = element.row_count();
        self.effective_count = effective.len();
        self.total_pages = self.effective_count.div_ceil(self.per_page).max(1);
        self.current_page = self.current_page.clamp(1, self.total_pages);

        let start = (self.current_page - 1) * self.per_page;
        let end = (start + self.per_page).min(self.effective_count);
        self.window = start..end;

        let rows = element.rows_mut();
        for row in rows.iter_mut() {
            row.hidden = true;
        }
        for &index in &effective[start..end] {
            rows[index].hidden = false;
        }
        drop(element);

        self.panel = self.build_panel(filter.criteria().is_some());
        debug!(
            target: "pagination",
            "Page {}/{} showing {:?} of {} effective rows",
            self.current_page,
            self.total_pages,
            self.window,
            self.effective_count
        );
    }

    fn build_panel(&self, filtered: bool) -> ControlPanel {
        let mut options = self.page_size_options.clone();
        if !options.contains(&self.per_page) {
            options.push(self.per_page);
        }
        options.sort_unstable();
        options.dedup();

        let mut summary = if self.effective_count == 0 {
            "Showing 0 of 0".to_string()
        } else {
            format!(
                "Showing {}–{} of {}",
                self.window.start + 1,
                self.window.end,
                self.effective_count
            )
        };
        if filtered {
            summary.push_str(&format!(" (filtered from {})", self.total_count));
        }

        ControlPanel {
            page_size: PageSizeSelector {
                options,
                selected: self.per_page,
            },
            pages: page_items(self.current_page, self.total_pages, self.max_page_buttons),
            prev_enabled: self.current_page > 1,
            next_enabled: self.current_page < self.total_pages,
            summary,
        }
    }

    /// Change the page size, persist it for every table and go back to page 1
    pub fn set_per_page(&mut self, per_page: usize) -> Result<()> {
        if per_page == 0 {
            bail!("Page size must be at least 1");
        }
        self.per_page = per_page;
        save_json(self.store.as_ref(), PER_PAGE_KEY, &per_page);
        self.current_page = 1;
        self.render();
        Ok(())
    }

    /// Jump to `page`; out-of-range pages are clamped
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page;
        self.render();
    }

    pub fn prev(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
            self.render();
        }
    }

    pub fn next(&mut self) {
        if self.current_page < self.total_pages {
            self.current_page += 1;
            self.render();
        }
    }
}

impl TableEventSubscriber for PaginationController {
    fn on_table_event(&mut self, event: &TableEvent) {
        debug!(target: "pagination", "Resetting to page 1 after {}", event.kind().name());
        self.current_page = 1;
        self.render();
    }

    fn name(&self) -> &str {
        "PaginationController"
    }
}

/// Paginate every `[data-paginate]` table; a table that cannot be bound is skipped
pub fn init_table_pagination(
    document: &Document,
    default_per_page: usize,
    store: Rc<dyn PreferenceStore>,
    config: &PaginationConfig,
) -> Result<Vec<(usize, Rc<RefCell<PaginationController>>)>> {
    let mut bound = Vec::new();
    for table in document.query_tables("[data-paginate]")? {
        let index = document.index_of(&table).unwrap_or_default();
        match PaginationController::bind(table, default_per_page, store.clone(), config) {
            Ok(controller) => bound.push((index, controller)),
            Err(e) => warn!(target: "pagination", "Skipping table {}: {:#}", index, e),
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::builder::TableBuilder;
    use crate::dom::element::FilterState;
    use crate::preferences::MemoryStore;
    use crate::state::SortDirection;

    fn numbered(count: usize) -> Table {
        let mut builder = TableBuilder::new(&["n"]).paginate();
        for i in 0..count {
            builder = builder.row(&[i.to_string()]);
        }
        Table::new(builder.build())
    }

    fn visible(table: &Table) -> Vec<String> {
        table
            .element()
            .visible_rows()
            .map(|r| r.cells[0].text.clone())
            .collect()
    }

    fn numbers(items: &[PageItem]) -> Vec<Option<usize>> {
        items
            .iter()
            .map(|item| match item {
                PageItem::Page { number, .. } => Some(*number),
                PageItem::Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_page_items_windows() {
        assert_eq!(numbers(&page_items(1, 3, 7)), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            numbers(&page_items(2, 10, 7)),
            vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, Some(10)]
        );
        assert_eq!(
            numbers(&page_items(9, 10, 7)),
            vec![Some(1), None, Some(6), Some(7), Some(8), Some(9), Some(10)]
        );
        assert_eq!(
            numbers(&page_items(5, 10, 7)),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
        assert!(page_items(5, 10, 7).contains(&PageItem::Page { number: 5, current: true }));
    }

    #[test]
    fn test_renders_first_page() {
        let table = numbered(12);
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        let pager = PaginationController::bind(table.clone(), 5, store, &PaginationConfig::default()).unwrap();

        assert_eq!(visible(&table), vec!["0", "1", "2", "3", "4"]);
        let pager = pager.borrow();
        assert_eq!(pager.total_pages(), 3);
        assert!(!pager.panel().prev_enabled);
        assert!(pager.panel().next_enabled);
        assert_eq!(pager.panel().summary, "Showing 1–5 of 12");
        assert_eq!(pager.panel().page_size.options, vec![5, 10, 25, 50, 100]);
    }

    #[test]
    fn test_navigation_clamps() {
        let table = numbered(12);
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        let pager = PaginationController::bind(table.clone(), 5, store, &PaginationConfig::default()).unwrap();
        let mut pager = pager.borrow_mut();

        pager.go_to_page(99);
        assert_eq!(pager.current_page(), 3);
        assert_eq!(visible(&table), vec!["10", "11"]);
        pager.next();
        assert_eq!(pager.current_page(), 3);
        pager.prev();
        assert_eq!(pager.current_page(), 2);
        pager.go_to_page(0);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_per_page_is_persisted_and_shared() {
        let store = Rc::new(MemoryStore::new());
        let shared: Rc<dyn PreferenceStore> = store.clone();

        let first = PaginationController::bind(numbered(30), 10, shared.clone(), &PaginationConfig::default()).unwrap();
        first.borrow_mut().go_to_page(2);
        first.borrow_mut().set_per_page(25).unwrap();
        assert_eq!(first.borrow().current_page(), 1);
        assert_eq!(store.get(PER_PAGE_KEY).unwrap(), Some("25".to_string()));

        let second = PaginationController::bind(numbered(30), 10, shared, &PaginationConfig::default()).unwrap();
        assert_eq!(second.borrow().per_page(), 25);
        assert!(first.borrow_mut().set_per_page(0).is_err());
    }

    #[test]
    fn test_events_reset_to_first_page() {
        let table = numbered(12);
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        let pager = PaginationController::bind(table.clone(), 5, store, &PaginationConfig::default()).unwrap();

        pager.borrow_mut().go_to_page(3);
        table.events().publish(TableEvent::Sort {
            index: 0,
            direction: SortDirection::Desc,
        });
        assert_eq!(pager.borrow().current_page(), 1);

        pager.borrow_mut().go_to_page(2);
        table.element_mut().set_filter_state(&FilterState::new(0, "7"));
        table.events().publish(TableEvent::Filter {
            column: Some(0),
            value: Some("7".to_string()),
        });
        let pager = pager.borrow();
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.effective_count(), 1);
        assert_eq!(visible(&table), vec!["7"]);
        assert_eq!(pager.panel().summary, "Showing 1–1 of 1 (filtered from 12)");
    }

    #[test]
    fn test_empty_effective_set() {
        let table = numbered(0);
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        let pager = PaginationController::bind(table, 5, store, &PaginationConfig::default()).unwrap();
        let pager = pager.borrow();
        assert_eq!(pager.total_pages(), 1);
        assert_eq!(pager.panel().summary, "Showing 0 of 0");
        assert!(!pager.panel().next_enabled);
    }

    #[test]
    fn test_bind_failures() {
        let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
        let div = Table::new(TableBuilder::new(&["a"]).tag("div").build());
        assert!(PaginationController::bind(div, 5, store.clone(), &PaginationConfig::default()).is_err());
        assert!(PaginationController::bind(numbered(1), 0, store, &PaginationConfig::default()).is_err());
    }
}

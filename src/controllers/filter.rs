//! Single-value filters: one button per distinct value of the chosen columns.
//!
//! At most one filter is active per table. Clicking the active button clears
//! it, clicking another replaces it.

use anyhow::{anyhow, bail, Result};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::dom::document::{Document, Node};
use crate::dom::element::{FilterState, Row};
use crate::dom::selector::Selector;
use crate::dom::Table;
use crate::state::TableEvent;
use crate::utils::text::normalize_whitespace;

pub const FILTER_BAR_CLASS: &str = "value-filters";

/// Where and how to build a table's filter bar
pub struct FilterConfig {
    pub table_selector: String,
    /// Header texts of the filterable columns, in bar order
    pub columns: Vec<String>,
    pub mount_selector: Option<String>,
    /// Child of the mount point the bar is inserted before
    pub insert_before: Option<String>,
    /// Runs after the filter changed and before the filter event is published
    pub on_resort: Option<Box<dyn FnMut()>>,
    /// Log filter activity at info level
    pub debug: bool,
}

impl FilterConfig {
    pub fn new<S: AsRef<str>>(table_selector: &str, columns: &[S]) -> Self {
        Self {
            table_selector: table_selector.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            mount_selector: None,
            insert_before: None,
            on_resort: None,
            debug: false,
        }
    }

    pub fn mount(mut self, selector: &str) -> Self {
        self.mount_selector = Some(selector.to_string());
        self
    }

    pub fn insert_before(mut self, selector: &str) -> Self {
        self.insert_before = Some(selector.to_string());
        self
    }

    pub fn on_resort<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.on_resort = Some(Box::new(callback));
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig")
            .field("table_selector", &self.table_selector)
            .field("columns", &self.columns)
            .field("mount_selector", &self.mount_selector)
            .field("insert_before", &self.insert_before)
            .field("on_resort", &self.on_resort.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterButton {
    pub column: usize,
    pub column_name: String,
    /// Normalized value rows are matched against
    pub value: String,
    /// Raw value as first seen in the table
    pub label: String,
    pub title: String,
    pub active: bool,
}

/// A row matches when its normalized cell value equals `value` exactly
pub fn row_matches(row: &Row, column: usize, value: &str) -> bool {
    FilterState::new(column, value).matches(row)
}

pub struct FilterController {
    table: Table,
    buttons: Vec<FilterButton>,
    on_resort: Option<Box<dyn FnMut()>>,
    debug: bool,
    table_selector: String,
    /// Selector of the node holding the bar, once mounted
    mount: Option<String>,
}

/// Build the filter bar for the table matched by `config.table_selector`
pub fn init_value_filters(document: &mut Document, config: FilterConfig) -> Result<FilterController> {
    let table = document
        .find_table(&config.table_selector)?
        .ok_or_else(|| anyhow!("No table matches '{}'", config.table_selector))?;

    let buttons = {
        let element = table.element();
        if !element.is_table() {
            bail!("Cannot bind filters to <{}>: not a table", element.tag);
        }
        if element.body.is_none() {
            bail!("Cannot bind filters: table has no body");
        }

        let mut buttons = Vec::new();
        for name in &config.columns {
            let Some(column) = element.column_index(name) else {
                warn!(target: "filter", "Column '{}' not found, skipping", name);
                continue;
            };

            // normalized -> first raw spelling
            let mut values: BTreeMap<String, String> = BTreeMap::new();
            for row in element.rows() {
                let Some(cell) = row.cell(column) else { continue };
                let raw = cell.value();
                let normalized = normalize_whitespace(raw);
                if normalized.is_empty() {
                    continue;
                }
                values.entry(normalized).or_insert_with(|| raw.trim().to_string());
            }

            debug!(target: "filter", "Column '{}' has {} distinct values", name, values.len());
            buttons.extend(values.into_iter().map(|(value, label)| FilterButton {
                column,
                column_name: name.trim().to_string(),
                value,
                label,
                title: name.trim().to_string(),
                active: false,
            }));
        }
        buttons
    };

    table.element_mut().set_filter_state(&FilterState::default());

    let mut controller = FilterController {
        table,
        buttons,
        on_resort: config.on_resort,
        debug: config.debug,
        table_selector: config.table_selector.clone(),
        mount: None,
    };

    if let Some(mount) = &config.mount_selector {
        let before = config
            .insert_before
            .as_deref()
            .map(Selector::parse)
            .transpose()?;
        let bar = controller.render_bar();
        match document.find_node_mut(mount)? {
            Some(node) => {
                node.insert_before(bar, before.as_ref());
                controller.mount = Some(mount.clone());
            }
            None => warn!(target: "filter", "Mount point '{}' not found, filter bar not mounted", mount),
        }
    }

    controller.log(format!(
        "Initialized {} filter buttons for '{}'",
        controller.buttons.len(),
        config.table_selector
    ));
    Ok(controller)
}

impl FilterController {
    pub fn buttons(&self) -> &[FilterButton] {
        &self.buttons
    }

    pub fn active(&self) -> Option<&FilterButton> {
        self.buttons.iter().find(|b| b.active)
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Install or replace the re-sort callback
    pub fn set_on_resort(&mut self, callback: Box<dyn FnMut()>) {
        self.on_resort = Some(callback);
    }

    pub fn has_on_resort(&self) -> bool {
        self.on_resort.is_some()
    }

    /// Click the button at `index`, refreshing the mounted bar in `document`
    pub fn click(&mut self, document: &mut Document, index: usize) -> Result<()> {
        if index >= self.buttons.len() {
            bail!(
                "Unknown filter button {} (have {})",
                index,
                self.buttons.len()
            );
        }

        let clearing = self.buttons[index].active;
        for (i, button) in self.buttons.iter_mut().enumerate() {
            button.active = !clearing && i == index;
        }

        let state = match self.active() {
            Some(button) => FilterState::new(button.column, button.value.clone()),
            None => FilterState::default(),
        };

        {
            let mut element = self.table.element_mut();
            element.set_filter_state(&state);
            for row in element.rows_mut() {
                let matches = state.matches(row);
                row.hidden = !matches;
            }
        }

        match state.criteria() {
            Some((column, value)) => self.log(format!("Filter on column {} = '{}'", column, value)),
            None => self.log("Filter cleared".to_string()),
        }

        self.refresh_bar(document)?;

        if let Some(resort) = self.on_resort.as_mut() {
            resort();
        }

        self.table.events().publish(TableEvent::Filter {
            column: state.column,
            value: state.value,
        });
        Ok(())
    }

    /// Clear the active filter, if any
    pub fn clear(&mut self, document: &mut Document) -> Result<()> {
        match self.buttons.iter().position(|b| b.active) {
            Some(index) => self.click(document, index),
            None => Ok(()),
        }
    }

    /// The bar as a container of button nodes
    pub fn render_bar(&self) -> Node {
        let bar = Node::new("div")
            .with_attribute("class", FILTER_BAR_CLASS)
            .with_attribute("data-table", self.table_selector.clone());
        self.buttons.iter().fold(bar, |bar, button| {
            let mut node = Node::new("button")
                .with_attribute("data-col", button.column.to_string())
                .with_attribute("data-value", button.value.clone())
                .with_attribute("title", button.title.clone())
                .with_attribute("data-label", button.label.clone());
            if button.active {
                node = node.with_attribute("class", "active");
            }
            bar.with_child(node)
        })
    }

    /// Replace the mounted bar with one reflecting the current buttons
    fn refresh_bar(&self, document: &mut Document) -> Result<()> {
        let Some(mount) = &self.mount else { return Ok(()) };
        let Some(node) = document.find_node_mut(mount)? else {
            warn!(target: "filter", "Mount point '{}' is gone, filter bar not updated", mount);
            return Ok(());
        };
        let is_bar = |child: &Node| {
            child.attributes.get("class").map(String::as_str) == Some(FILTER_BAR_CLASS)
                && child.attributes.get("data-table") == Some(&self.table_selector)
        };
        match node.children.iter_mut().find(|c| is_bar(c)) {
            Some(bar) => *bar = self.render_bar(),
            None => warn!(target: "filter", "Filter bar for '{}' was removed", self.table_selector),
        }
        Ok(())
    }

    fn log(&self, message: String) {
        if self.debug {
            info!(target: "filter", "{}", message);
        } else {
            debug!(target: "filter", "{}", message);
        }
    }
}

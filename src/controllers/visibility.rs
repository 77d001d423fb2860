//! Column visibility: a checkbox menu per table, persisted per table identity

use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::config::VisibilityConfig;
use crate::dom::document::ToggleButton;
use crate::dom::element::TableElement;
use crate::dom::geometry::{Point, Rect, Size};
use crate::dom::Table;
use crate::preferences::{hidden_columns_key, load_json, remove_key, save_json, PreferenceStore};
use crate::utils::text::slugify;

const MENU_ROW_HEIGHT: f64 = 24.0;
const MENU_PADDING: f64 = 8.0;
const MENU_CHAR_WIDTH: f64 = 8.0;
const MENU_CHECKBOX_WIDTH: f64 = 32.0;

/// Persistence key of a table: its id, else a slug of its heading plus `ordinal`
pub fn table_key(element: &TableElement, ordinal: usize) -> String {
    if let Some(id) = element.id() {
        return id.to_string();
    }
    let slug = element
        .heading
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "table".to_string());
    format!("{}-{}", slug, ordinal)
}

/// Top-left corner for a floating menu of `content` size anchored to `anchor`.
///
/// The menu opens below the anchor, left edges aligned. It flips to the
/// anchor's right edge or above the anchor when it would overflow, and is
/// finally clamped to `margin` from the viewport edges.
pub fn compute_position(anchor: Rect, content: Size, viewport: Size, margin: f64, gap: f64) -> Point {
    let mut x = anchor.left();
    let mut y = anchor.bottom() + gap;

    if x + content.width > viewport.width - margin {
        x = anchor.right() - content.width;
    }
    if y + content.height > viewport.height - margin {
        y = anchor.top() - gap - content.height;
    }

    x = x.min(viewport.width - margin - content.width).max(margin);
    y = y.min(viewport.height - margin - content.height).max(margin);
    Point { x, y }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub column: usize,
    pub label: String,
    /// Checked means visible
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    InsideClick,
    OutsideClick,
    Escape,
    Resize,
    Scroll,
}

pub struct ColumnVisibilityController {
    table: Table,
    key: String,
    store: Rc<dyn PreferenceStore>,
    hidden: BTreeSet<usize>,
    anchor: Rect,
    margin: f64,
    gap: f64,
    menu_position: Option<Point>,
}

impl ColumnVisibilityController {
    /// Bind `toggle` to `table`, applying any stored hidden columns
    pub fn new(
        table: Table,
        toggle: &ToggleButton,
        ordinal: usize,
        store: Rc<dyn PreferenceStore>,
        config: &VisibilityConfig,
    ) -> Result<Self> {
        let (key, column_count) = {
            let element = table.element();
            if !element.is_table() {
                bail!("Cannot toggle columns of <{}>: not a table", element.tag);
            }
            (table_key(&element, ordinal), element.column_count())
        };

        let hidden: BTreeSet<usize> = load_json::<Vec<usize>>(store.as_ref(), &hidden_columns_key(&key))
            .unwrap_or_default()
            .into_iter()
            .filter(|&c| c < column_count)
            .collect();
        if !hidden.is_empty() {
            debug!(target: "visibility", "Restoring hidden columns {:?} for '{}'", hidden, key);
        }

        let controller = Self {
            table,
            key,
            store,
            hidden,
            anchor: toggle.anchor,
            margin: config.menu_margin,
            gap: config.menu_gap,
            menu_position: None,
        };
        controller.apply();
        Ok(controller)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn hidden_columns(&self) -> Vec<usize> {
        self.hidden.iter().copied().collect()
    }

    pub fn is_visible(&self, column: usize) -> bool {
        !self.hidden.contains(&column)
    }

    fn apply(&self) {
        let mut element = self.table.element_mut();
        for (index, header) in element.header.iter_mut().enumerate() {
            header.hidden = self.hidden.contains(&index);
        }
        for row in element.rows_mut() {
            for (index, cell) in row.cells.iter_mut().enumerate() {
                cell.hidden = self.hidden.contains(&index);
            }
        }
    }

    fn persist(&self) {
        let columns = self.hidden_columns();
        save_json(self.store.as_ref(), &hidden_columns_key(&self.key), &columns);
    }

    pub fn set_column_visible(&mut self, column: usize, visible: bool) -> Result<()> {
        let count = self.table.element().column_count();
        if column >= count {
            bail!("Column {} out of bounds (table has {} columns)", column, count);
        }

        let changed = if visible {
            self.hidden.remove(&column)
        } else {
            self.hidden.insert(column)
        };
        if changed {
            info!(
                target: "visibility",
                "{} column {} of '{}'",
                if visible { "Showing" } else { "Hiding" },
                column,
                self.key
            );
            self.apply();
            self.persist();
        }
        Ok(())
    }

    /// Flip a column's checkbox; returns the new visibility
    pub fn toggle_column(&mut self, column: usize) -> Result<bool> {
        let visible = !self.is_visible(column);
        self.set_column_visible(column, visible)?;
        Ok(visible)
    }

    /// Show every column and forget the stored set
    pub fn reset(&mut self) {
        self.hidden.clear();
        self.apply();
        remove_key(self.store.as_ref(), &hidden_columns_key(&self.key));
        info!(target: "visibility", "Reset columns of '{}'", self.key);
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.table
            .element()
            .header
            .iter()
            .enumerate()
            .map(|(column, header)| MenuItem {
                column,
                label: header.text.trim().to_string(),
                checked: self.is_visible(column),
            })
            .collect()
    }

    /// Estimated menu size: one row per column plus the reset row
    pub fn menu_size(&self) -> Size {
        let items = self.menu_items();
        let widest = items
            .iter()
            .map(|i| i.label.chars().count())
            .max()
            .unwrap_or(0)
            .max("Reset".len());
        Size::new(
            widest as f64 * MENU_CHAR_WIDTH + MENU_CHECKBOX_WIDTH + 2.0 * MENU_PADDING,
            (items.len() + 1) as f64 * MENU_ROW_HEIGHT + 2.0 * MENU_PADDING,
        )
    }

    pub fn open_menu(&mut self, viewport: Size) -> Point {
        let position = compute_position(self.anchor, self.menu_size(), viewport, self.margin, self.gap);
        self.menu_position = Some(position);
        position
    }

    pub fn close_menu(&mut self) {
        self.menu_position = None;
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_position.is_some()
    }

    pub fn menu_position(&self) -> Option<Point> {
        self.menu_position
    }

    /// Returns true when the event closed the menu
    pub fn handle(&mut self, event: MenuEvent) -> bool {
        if !self.is_menu_open() {
            return false;
        }
        match event {
            MenuEvent::InsideClick => false,
            MenuEvent::OutsideClick | MenuEvent::Escape | MenuEvent::Resize | MenuEvent::Scroll => {
                self.close_menu();
                true
            }
        }
    }
}

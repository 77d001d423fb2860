use anyhow::Result;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::dom::element::TableElement;
use crate::dom::geometry::{Rect, Size};
use crate::dom::selector::Selector;
use crate::state::EventBus;

/// Shared handle to a table element and its event bus.
///
/// Controllers each hold a clone. Borrows of the element must be released
/// before publishing on the bus, since subscribers borrow it too.
#[derive(Clone)]
pub struct Table {
    element: Rc<RefCell<TableElement>>,
    events: Rc<EventBus>,
}

impl Table {
    pub fn new(element: TableElement) -> Self {
        Self {
            element: Rc::new(RefCell::new(element)),
            events: Rc::new(EventBus::new()),
        }
    }

    pub fn element(&self) -> Ref<'_, TableElement> {
        self.element.borrow()
    }

    pub fn element_mut(&self) -> RefMut<'_, TableElement> {
        self.element.borrow_mut()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.element, &other.element)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("element", &self.element.try_borrow().map(|e| e.attributes.clone()))
            .field("subscribers", &self.events.subscriber_count())
            .finish()
    }
}

/// Any non-table element, used as a mount point or child marker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.tag, &self.attributes)
    }

    /// Insert `child` before the first direct child matching `before`, else append
    pub fn insert_before(&mut self, child: Node, before: Option<&Selector>) {
        let position = before.and_then(|s| self.children.iter().position(|c| c.matches(s)));
        match position {
            Some(index) => self.children.insert(index, child),
            None => self.children.push(child),
        }
    }

    fn find_mut(&mut self, selector: &Selector) -> Option<&mut Node> {
        if self.matches(selector) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(selector))
    }
}

/// Button that opens the column menu of the table matched by `target`
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleButton {
    pub target: String,
    pub anchor: Rect,
}

/// The page: its tables, generic containers and column toggles
#[derive(Debug)]
pub struct Document {
    tables: Vec<Table>,
    nodes: Vec<Node>,
    toggles: Vec<ToggleButton>,
    viewport: Size,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            nodes: Vec::new(),
            toggles: Vec::new(),
            viewport: Size::new(1280.0, 800.0),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, element: TableElement) -> Table {
        let table = Table::new(element);
        self.tables.push(table.clone());
        table
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_toggle(&mut self, toggle: ToggleButton) {
        self.toggles.push(toggle);
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn toggles(&self) -> &[ToggleButton] {
        &self.toggles
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Position of `table` among the document's tables
    pub fn index_of(&self, table: &Table) -> Option<usize> {
        self.tables.iter().position(|t| t.ptr_eq(table))
    }

    pub fn query_tables(&self, selector: &str) -> Result<Vec<Table>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tables
            .iter()
            .filter(|t| {
                let element = t.element();
                selector.matches(&element.tag, &element.attributes)
            })
            .cloned()
            .collect())
    }

    pub fn find_table(&self, selector: &str) -> Result<Option<Table>> {
        Ok(self.query_tables(selector)?.into_iter().next())
    }

    pub fn find_node_mut(&mut self, selector: &str) -> Result<Option<&mut Node>> {
        let selector = Selector::parse(selector)?;
        Ok(self.nodes.iter_mut().find_map(|n| n.find_mut(&selector)))
    }
}

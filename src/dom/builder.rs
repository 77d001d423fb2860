use crate::data::type_inference::ColumnType;
use crate::dom::element::{
    Cell, HeaderCell, Row, TableElement, ATTR_CLASS, ATTR_ID, ATTR_PAGINATE, ATTR_SORTABLE,
};

/// Fluent construction of table elements
#[derive(Debug, Clone)]
pub struct TableBuilder {
    element: TableElement,
}

impl TableBuilder {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        let header = headers.iter().map(|h| HeaderCell::new(h.as_ref())).collect();
        Self {
            element: TableElement::new(header, Vec::new()),
        }
    }

    pub fn with_header(header: Vec<HeaderCell>) -> Self {
        Self {
            element: TableElement::new(header, Vec::new()),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.element.tag = tag.to_string();
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.element.set_attribute(ATTR_ID, id);
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.element.set_attribute(ATTR_CLASS, class);
        self
    }

    pub fn heading(mut self, heading: &str) -> Self {
        self.element.heading = Some(heading.to_string());
        self
    }

    pub fn sortable(mut self) -> Self {
        self.element.set_attribute(ATTR_SORTABLE, "");
        self
    }

    pub fn paginate(mut self) -> Self {
        self.element.set_attribute(ATTR_PAGINATE, "");
        self
    }

    pub fn column_type(mut self, column: usize, column_type: ColumnType) -> Self {
        if let Some(header) = self.element.header.get_mut(column) {
            header.declared_type = Some(column_type);
        }
        self
    }

    pub fn unsortable_column(mut self, column: usize) -> Self {
        if let Some(header) = self.element.header.get_mut(column) {
            header.sortable = false;
        }
        self
    }

    pub fn row<S: AsRef<str>>(self, texts: &[S]) -> Self {
        self.row_cells(texts.iter().map(|t| Cell::new(t.as_ref())).collect())
    }

    pub fn row_cells(mut self, cells: Vec<Cell>) -> Self {
        if let Some(body) = self.element.body.as_mut() {
            body.rows.push(Row::new(cells));
        }
        self
    }

    /// Drop the body entirely
    pub fn without_body(mut self) -> Self {
        self.element.body = None;
        self
    }

    pub fn build(self) -> TableElement {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_attributes_and_rows() {
        let table = TableBuilder::new(&["Name", "Qty"])
            .id("stock")
            .heading("Stock")
            .sortable()
            .paginate()
            .column_type(1, ColumnType::Number)
            .row(&["bolt", "10"])
            .row(&["nut", "4"])
            .build();

        assert!(table.is_table());
        assert!(table.is_sortable());
        assert!(table.is_paginated());
        assert_eq!(table.id(), Some("stock"));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.header[1].declared_type, Some(ColumnType::Number));
    }

    #[test]
    fn test_without_body() {
        let table = TableBuilder::new(&["a"]).row(&["1"]).without_body().build();
        assert!(table.body.is_none());
        assert_eq!(table.row_count(), 0);
    }
}

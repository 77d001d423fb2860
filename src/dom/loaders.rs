//! Build documents from CSV files and JSON document descriptions

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::dom::builder::TableBuilder;
use crate::dom::document::{Document, Node, ToggleButton};
use crate::dom::element::{Cell, HeaderCell, TableElement};
use crate::dom::geometry::{Rect, Size};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HeaderSpec {
    Text(String),
    Full(HeaderCell),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSpec {
    Text(String),
    Number(f64),
    Full(Cell),
}

impl From<CellSpec> for Cell {
    fn from(spec: CellSpec) -> Self {
        match spec {
            CellSpec::Text(text) => Cell::new(text),
            CellSpec::Number(n) => Cell::new(n.to_string()),
            CellSpec::Full(cell) => cell,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TableSpec {
    #[serde(default = "default_tag")]
    tag: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    sortable: bool,
    #[serde(default)]
    paginate: bool,
    header: Vec<HeaderSpec>,
    /// Absent for a table without a body
    #[serde(default)]
    rows: Option<Vec<Vec<CellSpec>>>,
}

fn default_tag() -> String {
    "table".to_string()
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    tag: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    children: Vec<NodeSpec>,
}

impl From<NodeSpec> for Node {
    fn from(spec: NodeSpec) -> Self {
        let mut node = Node::new(spec.tag);
        if let Some(id) = spec.id {
            node = node.with_attribute("id", id);
        }
        if let Some(class) = spec.class {
            node = node.with_attribute("class", class);
        }
        for child in spec.children {
            node = node.with_child(child.into());
        }
        node
    }
}

#[derive(Debug, Deserialize)]
struct ToggleSpec {
    target: String,
    #[serde(default)]
    anchor: Rect,
}

/// JSON description of a page
#[derive(Debug, Deserialize)]
struct DocumentSpec {
    #[serde(default)]
    viewport: Option<Size>,
    tables: Vec<TableSpec>,
    #[serde(default)]
    nodes: Vec<NodeSpec>,
    #[serde(default)]
    toggles: Vec<ToggleSpec>,
}

fn table_from_spec(spec: TableSpec) -> TableElement {
    let header = spec
        .header
        .into_iter()
        .map(|h| match h {
            HeaderSpec::Text(text) => HeaderCell::new(text),
            HeaderSpec::Full(cell) => cell,
        })
        .collect();

    let mut builder = TableBuilder::with_header(header).tag(&spec.tag);
    if let Some(id) = &spec.id {
        builder = builder.id(id);
    }
    if let Some(class) = &spec.class {
        builder = builder.class(class);
    }
    if let Some(heading) = &spec.heading {
        builder = builder.heading(heading);
    }
    if spec.sortable {
        builder = builder.sortable();
    }
    if spec.paginate {
        builder = builder.paginate();
    }
    match spec.rows {
        Some(rows) => {
            for row in rows {
                builder = builder.row_cells(row.into_iter().map(Cell::from).collect());
            }
        }
        None => builder = builder.without_body(),
    }
    builder.build()
}

/// Parse a JSON document description
pub fn document_from_json(json: &str) -> Result<Document> {
    let spec: DocumentSpec = serde_json::from_str(json).context("Invalid document description")?;
    let mut document = Document::new();
    if let Some(viewport) = spec.viewport {
        document.set_viewport(viewport);
    }
    for table in spec.tables {
        document.add_table(table_from_spec(table));
    }
    for node in spec.nodes {
        document.add_node(node.into());
    }
    for toggle in spec.toggles {
        document.add_toggle(ToggleButton {
            target: toggle.target,
            anchor: toggle.anchor,
        });
    }
    debug!(
        "Loaded document with {} tables and {} toggles",
        document.tables().len(),
        document.toggles().len()
    );
    Ok(document)
}

pub fn load_json_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    document_from_json(&content)
}

/// Load a CSV file as a single sortable, paginated table with a column toggle
pub fn load_csv_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let heading = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "table".to_string());

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut builder = TableBuilder::new(headers.as_slice())
        .heading(&heading)
        .sortable()
        .paginate();

    let mut row_count = 0;
    for record in reader.records() {
        let record = record?;
        builder = builder.row(record.iter().collect::<Vec<_>>().as_slice());
        row_count += 1;
    }
    info!(
        "Loaded {} rows x {} columns from {}",
        row_count,
        headers.len(),
        path.display()
    );

    let mut document = Document::new();
    document.add_table(builder.build());
    document.add_toggle(ToggleButton {
        target: "table".to_string(),
        anchor: Rect::new(0.0, 0.0, 120.0, 28.0),
    });
    Ok(document)
}

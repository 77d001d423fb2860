//! Headless document model
//!
//! Tables, rows and cells are plain data behind shared handles. Controllers
//! mutate them in place: sorting moves rows, filtering and pagination flip
//! `hidden` flags, column visibility hides cells.

pub mod builder;
pub mod document;
pub mod element;
pub mod geometry;
pub mod loaders;
pub mod selector;

pub use builder::TableBuilder;
pub use document::{Document, Node, Table, ToggleButton};
pub use element::{Cell, FilterState, HeaderCell, Row, SortIndicator, TableBody, TableElement};
pub use geometry::{Point, Rect, Size};
pub use selector::Selector;

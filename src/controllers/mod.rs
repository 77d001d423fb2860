//! The four table views and their bulk binding

pub mod filter;
pub mod page;
pub mod pagination;
pub mod sort;
pub mod visibility;

pub use filter::{init_value_filters, FilterButton, FilterConfig, FilterController};
pub use page::{init_tables, PageBindings, TableBindings};
pub use pagination::{init_table_pagination, page_items, ControlPanel, PageItem, PaginationController};
pub use sort::{ColumnDescriptor, SortController, SortState};
pub use visibility::{compute_position, table_key, ColumnVisibilityController, MenuEvent, MenuItem};

//! Value parsing, column type detection and comparators

pub mod compare;
pub mod type_inference;

pub use compare::{compare_keys, compare_raw, natural_cmp, SortKey};
pub use type_inference::{parse_date, parse_number, parse_time, ColumnType, TypeInference};

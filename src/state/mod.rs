//! Per-table publish/subscribe plumbing
//!
//! Controllers never call into each other; they publish `TableEvent`s on
//! the table's `EventBus` and react to the events they subscribed to.

pub mod dispatcher;
pub mod events;

pub use dispatcher::{EventBus, TableEventSubscriber};
pub use events::{SortDirection, TableEvent, TableEventKind};

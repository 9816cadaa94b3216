pub mod common;
pub mod config;
pub mod drafts;
pub mod errors;
pub mod grid;
pub mod notify;
pub mod paginator;
pub mod record;
pub mod services;

pub use config::GridConfig;
pub use grid::{GridEvent, PagedEditableGrid, RowAction};

pub mod edit_batcher;
pub mod loader;
pub mod record_service;

pub use edit_batcher::*;
pub use loader::*;
pub use record_service::*;

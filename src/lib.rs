pub mod api;
pub mod clock;
pub mod codegen;
pub mod config;
pub mod format;
pub mod models;
pub mod registry;
pub mod storage;
pub mod sweeper;

pub use models::LinkRecord;
pub use registry::{LinkRegistry, RegistryOptions, SharedRegistry, ValidationError};

//! Infrastructure layer for Mobile Studio.
//!
//! Filesystem persistence for the session collection, debounced
//! writing, configuration loading, and project export.

pub mod config_service;
pub mod debounce;
pub mod export;
pub mod paths;
pub mod session_store;

pub use crate::config_service::{ConfigService, StudioConfig};
pub use crate::debounce::DebouncedSaver;
pub use crate::export::{export_file_name, export_session, write_export};
pub use crate::paths::StudioPaths;
pub use crate::session_store::SessionStore;

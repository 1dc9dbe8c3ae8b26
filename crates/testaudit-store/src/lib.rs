//! testaudit-store: Session sources and assessment storage.
//!
//! Implements the `SessionSource` and `AssessmentStore` traits from
//! `testaudit-core` in memory and on top of a directory of JSON files, and
//! loads the `testaudit` configuration.

pub mod config;
pub mod dataset;
pub mod json_dir;
pub mod memory;

pub use config::{load_config, load_config_from, TestauditConfig};
pub use dataset::{Dataset, DatasetWarning};
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

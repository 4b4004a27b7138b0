// Library exports for use in scripts and other binaries

pub mod cleanup;
pub mod config;
pub mod utils;

// Re-export commonly used types
pub use cleanup::{clean_deed_text, CleanupReport, DeedCleaner};
pub use config::{CleanupConfig, ConfigError, ScrubMode};

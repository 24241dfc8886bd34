//! Shared types, error model, and configuration for autocat.
//!
//! This crate is the foundation depended on by all other autocat crates.
//! It provides:
//! - [`CatError`] — the unified error type
//! - Source resolution ([`SourceResolver`], [`ResolvedSource`], [`relative_label`])
//! - Discovery types ([`AutoCompileSpec`], [`AutoCompiled`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod source;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HttpConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, locate_config,
};
pub use error::{CatError, Result};
pub use source::{ResolvedSource, SourceResolver, normalize, relative_label};
pub use types::{AutoCompileSpec, AutoCompiled, DEFAULT_LABEL_PREFIX, GlobPatterns, INLINE_LABEL};

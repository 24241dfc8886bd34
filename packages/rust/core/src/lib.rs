//! Concatenation engine for autocat.
//!
//! This crate ties together source resolution, reading, generator discovery,
//! and output routing:
//! - [`reader`] — retrieves the text behind each resolved source
//! - [`concat`] — the [`Cat`] session that orders, marks, and joins sources
//! - [`router`] — stdout preview vs. sibling-file materialization

pub mod concat;
pub mod reader;
pub mod router;

pub use concat::{Cat, DEFAULT_SEPARATOR, cat_to_stdout};
pub use reader::SourceReader;
pub use router::{Routed, parse_location, replace_suffix, route, write_auto_compile_output};

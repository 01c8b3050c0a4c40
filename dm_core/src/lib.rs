//! `dm_core` is the core library for [dm](https://github.com/ifiokjr/dm), a tool that links source files to the hand written documentation ("lore") describing them and keeps that documentation complete. It provides the marker extractor, repository scanner, template engine and lore file validator used by the `dm` command line.
//!
//! ## Processing Pipeline
//!
//! ```text
//! dmconfig.json
//!   → Config (defaults, validation, command line overrides)
//!   → Repository scanner (walks the tree, applies the directory policy and exclusions)
//!   → Marker extractor (finds `track_lore("…")` comments in each source file)
//!   → LoreMapping (lore path → referencing source files)
//!   → Template engine (creates missing lore files)
//!   → Validator (judges placeholders, sections and diagrams)
//! ```
//!
//! ## Markers
//!
//! Python family files reference lore with a hash comment and TypeScript
//! family files with a slash comment:
//!
//! ```text
//! # track_lore("payments/api.md")
//! // track_lore('payments/api.md')
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `dmconfig.json`, validation and overrides.
//! - [`language`]: Supported extensions and their comment syntax.
//! - [`policy`]: Which directories the scanner never enters.
//! - [`project`]: Repository scanning and the [`LoreMapping`] it produces.
//! - [`report`]: Events emitted while scanning.
//! - [`source_scanner`]: Marker extraction from a single source file.
//! - [`template`]: The lore template and lore file creation.
//! - [`validator`]: Lore file completeness checks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dm_core::DmConfig;
//! use dm_core::ValidationOptions;
//! use dm_core::scan_repository_with_config;
//! use dm_core::validate_lore_file;
//!
//! let config = DmConfig::load(Path::new("dmconfig.json")).unwrap();
//! let mapping = scan_repository_with_config(Path::new("."), &config).unwrap();
//! let options = ValidationOptions::from_config(&config);
//!
//! for (lore_path, sources) in mapping.iter() {
//! 	let lore_file = config.lore_root(Path::new(".")).join(lore_path);
//! 	let result = validate_lore_file(&lore_file, &options).unwrap();
//! 	if !result.is_valid {
//! 		eprintln!("{lore_path} (tracking {}) is incomplete", sources.join(", "));
//! 	}
//! }
//! ```

pub use config::*;
pub use error::*;
pub use language::*;
pub use policy::*;
pub use project::*;
pub use report::*;
pub use source_scanner::*;
pub use template::*;
pub use validator::*;

pub mod config;
#[allow(unused_assignments)]
mod error;
pub mod language;
pub(crate) mod lexer;
pub mod policy;
pub mod project;
pub mod report;
pub mod source_scanner;
pub mod template;
pub mod validator;

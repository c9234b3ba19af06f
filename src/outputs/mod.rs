//! Destinations for extracted articles.
//!
//! # Submodules
//!
//! - [`sqlite`]: the normalized article store (the primary output)
//! - [`json`]: optional per-article JSON files for inspection
//!
//! # Output Structure
//!
//! ```text
//! corpus.db
//! ├── articles, authors, sources, tags
//! └── articles_authors, articles_sources, articles_tags
//!
//! json_output_dir/
//! └── <url-slug>.json
//! ```

pub mod json;
pub mod sqlite;

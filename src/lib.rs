//! # sidx - search index fragment tooling
//!
//! sidx reads the JavaScript search-index fragments that documentation
//! generators emit next to their HTML pages (`search/all_1.js` and friends),
//! and checks them against the pages and sources they point at.
//!
//! ## Architecture
//!
//! - [`index`] - Fragment parsing, the typed index model, discovery and writing
//! - [`lint`] - Integrity checks over parsed fragments
//! - [`output`] - Terminal and JSON rendering
//! - [`utils`] - Configuration, tracing setup, HTML entities, progress bars
//!
//! ## Quick Start
//!
//! ```
//! use sidx::index::SearchIndex;
//!
//! let index = SearchIndex::parse(
//!     "var searchData=[['list_5fpop',['list_pop',['../list_8c.html#a1',1,'list_pop:&#160;list.c']]]];",
//! )
//! .unwrap();
//!
//! let hits = index.lookup("list_p");
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].records[0].owning_file().as_deref(), Some("list.c"));
//! ```

pub mod index;
pub mod lint;
pub mod output;
pub mod utils;

//! Input parsing for citation datasets.
//!
//! Two stages turn a dataset into search keys:
//! - [`read_reference_blocks`] reads one text column from a CSV file, honoring
//!   a starting row offset so interrupted runs can resume.
//! - [`extract_titles`] splits each reference block into candidate titles,
//!   one per bracket-marked line.
//!
//! # Example
//!
//! ```
//! use citefetch_core::parser::extract_titles;
//!
//! let block = "[1] Attention Is All You Need\ncontinued text\n[2] Deep Residual Learning";
//! let titles = extract_titles(block);
//! assert_eq!(titles, vec!["Attention Is All You Need", "Deep Residual Learning"]);
//! ```

mod dataset;
mod error;
mod titles;

pub use dataset::read_reference_blocks;
pub use error::DatasetError;
pub use titles::{extract_title, extract_titles, normalize_title};

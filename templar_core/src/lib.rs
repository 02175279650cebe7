//! `templar_core` turns a directory of template files into two artifacts: an
//! embeddable script representation of every linked file, and a normalized
//! table of the `<PARAMETER>` placeholders found inside them.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template directory
//!   → Walk (sorted, gitignore and exclude patterns applied)
//!   → Classifier (changes file, XML/YANG passthrough, CSV, text)
//!   → Encoder (each line escaped into a script array element)
//!   → Parameter matcher / CSV decision rows (validated by injected checks)
//!   → Aggregator (occurrences merged per token under the `no`, `file` or `all` policy)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `templar.toml`.
//! - [`pipeline`]: Directory walking and the [`scan_templates`] driver.
//! - [`validators`]: Concrete legality and false-positive strategies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use templar_core::ScanOptions;
//! use templar_core::Validators;
//! use templar_core::scan_templates;
//!
//! let options = ScanOptions::default()
//! 	.with_linked(["intf.txt", "decisions.csv"])
//! 	.with_changes_file("changes.txt")
//! 	.with_merge("file")
//! 	.unwrap();
//! let scan = scan_templates(Path::new("templates"), &options, &Validators::new()).unwrap();
//!
//! for row in &scan.parameter_rows {
//! 	println!("{row}");
//! }
//! ```

pub use aggregator::*;
pub use classifier::*;
pub use config::*;
pub use decision::*;
pub use encoder::*;
pub use error::*;
pub use params::*;
pub use pipeline::*;
pub use scanner::*;
pub use validators::*;

mod aggregator;
mod classifier;
pub mod config;
mod decision;
mod encoder;
#[allow(unused_assignments)]
mod error;
mod params;
pub mod pipeline;
mod scanner;
pub mod validators;

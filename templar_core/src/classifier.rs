use std::collections::HashSet;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;

use crate::TemplarError;
use crate::TemplarResult;

/// How an eligible file takes part in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
	/// The designated changes file. Encoded, never scanned, and left out of
	/// the linked template map.
	Changes,
	/// XML and YANG files. Encoded only.
	Passthrough,
	/// CSV templates, scanned into decision rows.
	Csv,
	/// Everything else, scanned for parameters.
	Text,
}

impl FileRole {
	/// Whether files with this role belong in the linked template map.
	pub fn is_linked(self) -> bool {
		self != Self::Changes
	}
}

/// Decide the role of an eligible file from its name and normalized extension
/// (`_csv`, `_xml`, ...).
pub fn classify(file_name: &str, extension: &str, changes_file: Option<&str>) -> FileRole {
	if changes_file.is_some_and(|changes| changes == file_name) {
		return FileRole::Changes;
	}

	match extension {
		"_yang" | "_xml" => FileRole::Passthrough,
		"_csv" => FileRole::Csv,
		_ => FileRole::Text,
	}
}

/// The set of file names referenced elsewhere and therefore worth processing.
///
/// Exact names are matched first, then any glob patterns.
#[derive(Debug, Clone)]
pub struct LinkedNames {
	names: HashSet<String>,
	patterns: GlobSet,
}

impl Default for LinkedNames {
	fn default() -> Self {
		Self {
			names: HashSet::new(),
			patterns: GlobSet::empty(),
		}
	}
}

impl LinkedNames {
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			names: names.into_iter().map(Into::into).collect(),
			patterns: GlobSet::empty(),
		}
	}

	/// Add glob patterns matched against bare file names.
	pub fn with_patterns(mut self, patterns: &[String]) -> TemplarResult<Self> {
		let mut builder = GlobSetBuilder::new();
		for pattern in patterns {
			let glob = Glob::new(pattern).map_err(|e| {
				TemplarError::InvalidPattern {
					pattern: pattern.clone(),
					reason: e.to_string(),
				}
			})?;
			builder.add(glob);
		}
		self.patterns = builder.build().map_err(|e| {
			TemplarError::InvalidPattern {
				pattern: patterns.join(", "),
				reason: e.to_string(),
			}
		})?;
		Ok(self)
	}

	pub fn insert(&mut self, name: impl Into<String>) {
		self.names.insert(name.into());
	}

	pub fn contains(&self, file_name: &str) -> bool {
		self.names.contains(file_name) || self.patterns.is_match(file_name)
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty() && self.patterns.is_empty()
	}
}

/// Only the changes file and linked files are visited at all.
pub fn is_eligible(file_name: &str, linked: &LinkedNames, changes_file: Option<&str>) -> bool {
	linked.contains(file_name) || changes_file.is_some_and(|changes| changes == file_name)
}

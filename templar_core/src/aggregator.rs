use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::TemplarError;
use crate::params::LegalityCheck;
use crate::params::ParameterOccurrence;
use crate::params::Verdict;

/// Literal `\n***\n` placed between merged context lines. The backslashes are
/// part of the output so a row stays on one physical line.
pub const CONTEXT_SEPARATOR: &str = r"\n***\n";

/// Literal `\n` placed between merged source file names.
pub const SOURCE_SEPARATOR: &str = r"\n";

/// Granularity at which repeated parameter occurrences are merged into rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
	/// One row per occurrence.
	#[default]
	No,
	/// One row per token and source file.
	File,
	/// One row per token across every file.
	All,
}

impl MergePolicy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::No => "no",
			Self::File => "file",
			Self::All => "all",
		}
	}
}

impl FromStr for MergePolicy {
	type Err = TemplarError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"no" => Ok(Self::No),
			"file" => Ok(Self::File),
			"all" => Ok(Self::All),
			other => Err(TemplarError::InvalidMergePolicy(other.to_string())),
		}
	}
}

impl fmt::Display for MergePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Context lines for one token within one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContexts {
	pub source: String,
	pub lines: Vec<String>,
}

/// Every occurrence of one unique token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRecord {
	pub token: String,
	/// Source files in the order they first mentioned the token.
	pub sources: Vec<SourceContexts>,
	/// Set once, on first sight, when a legality check is configured.
	pub verdict: Option<Verdict>,
}

impl ParameterRecord {
	pub fn occurrence_count(&self) -> usize {
		self.sources.iter().map(|source| source.lines.len()).sum()
	}

	/// Split the occurrences into row groups of `(sources, lines)` according to
	/// the merge policy.
	fn groups(&self, policy: MergePolicy) -> Vec<(Vec<&str>, Vec<&str>)> {
		match policy {
			MergePolicy::No => {
				self.sources
					.iter()
					.flat_map(|source| {
						source
							.lines
							.iter()
							.map(|line| (vec![source.source.as_str()], vec![line.as_str()]))
					})
					.collect()
			}
			MergePolicy::File => {
				self.sources
					.iter()
					.map(|source| {
						(
							vec![source.source.as_str()],
							source.lines.iter().map(String::as_str).collect(),
						)
					})
					.collect()
			}
			MergePolicy::All => {
				vec![(
					self.sources
						.iter()
						.map(|source| source.source.as_str())
						.collect(),
					self.sources
						.iter()
						.flat_map(|source| source.lines.iter().map(String::as_str))
						.collect(),
				)]
			}
		}
	}
}

/// Rendered parameter rows together with the sticky invalid flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterRows {
	pub rows: Vec<String>,
	/// The subset of `rows` whose token was judged `unauthorized`.
	pub unauthorized: Vec<String>,
	/// True when any rendered token was judged `unauthorized`.
	pub invalid_param_found: bool,
}

/// Parameter records keyed by token, kept in first-discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParameterTable {
	records: Vec<ParameterRecord>,
	#[serde(skip)]
	index: HashMap<String, usize>,
}

impl ParameterTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an occurrence. The legality check runs only the first time a token
	/// is seen; later occurrences never change the verdict.
	pub fn record(&mut self, occurrence: ParameterOccurrence, legality: Option<&dyn LegalityCheck>) {
		let ParameterOccurrence {
			token,
			source,
			context,
		} = occurrence;

		let position = match self.index.get(&token) {
			Some(position) => *position,
			None => {
				let verdict = legality.map(|check| check.verdict(&token));
				self.records.push(ParameterRecord {
					token: token.clone(),
					sources: Vec::new(),
					verdict,
				});
				self.index.insert(token, self.records.len() - 1);
				self.records.len() - 1
			}
		};

		let record = &mut self.records[position];
		match record.sources.iter_mut().find(|entry| entry.source == source) {
			Some(entry) => entry.lines.push(context),
			None => {
				record.sources.push(SourceContexts {
					source,
					lines: vec![context],
				});
			}
		}
	}

	pub fn records(&self) -> &[ParameterRecord] {
		&self.records
	}

	pub fn get(&self, token: &str) -> Option<&ParameterRecord> {
		self.index.get(token).map(|position| &self.records[*position])
	}

	/// Number of unique tokens.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn occurrence_count(&self) -> usize {
		self.records.iter().map(ParameterRecord::occurrence_count).sum()
	}

	/// Render every record into comma separated rows.
	///
	/// Each row is `token,sources,[verdict,]lines`: sources joined with a
	/// literal `\n`, lines with a literal `\n***\n`. The verdict column only
	/// exists for records that carry a verdict.
	pub fn render(&self, policy: MergePolicy) -> ParameterRows {
		let mut output = ParameterRows::default();

		for record in &self.records {
			let verdict = record
				.verdict
				.map(|verdict| format!("{verdict},"))
				.unwrap_or_default();
			let unauthorized = record.verdict.is_some_and(Verdict::is_unauthorized);
			output.invalid_param_found |= unauthorized;

			for (sources, lines) in record.groups(policy) {
				let row = format!(
					"{},{},{verdict}{}",
					record.token,
					sources.join(SOURCE_SEPARATOR),
					lines.join(CONTEXT_SEPARATOR),
				);
				if unauthorized {
					output.unauthorized.push(row.clone());
				}
				output.rows.push(row);
			}
		}

		tracing::debug!(
			policy = %policy,
			tokens = self.records.len(),
			rows = output.rows.len(),
			"rendered parameter rows"
		);

		output
	}
}

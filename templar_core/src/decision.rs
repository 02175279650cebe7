use serde::Serialize;

use crate::params::LegalityCheck;
use crate::params::Verdict;

/// Separator placed between the trailing columns of a decision row.
pub const COLUMN_SEPARATOR: &str = " | ";

/// A flattened, validated line of a CSV template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRow {
	/// First column of the CSV line.
	pub key: String,
	/// Name of the CSV file the line came from.
	pub source: String,
	/// Present only when a legality check is configured.
	pub verdict: Option<Verdict>,
	/// Remaining columns, in order.
	pub columns: Vec<String>,
}

impl DecisionRow {
	/// Build a row from one CSV line. Blank lines produce no row.
	pub fn from_line(
		line: &str,
		source: &str,
		legality: Option<&dyn LegalityCheck>,
	) -> Option<Self> {
		let line = line.trim();
		if line.is_empty() {
			return None;
		}

		let mut items = line.split(',');
		let key = items.next().unwrap_or_default().to_string();
		let columns = items.map(str::to_string).collect();
		let verdict = legality.map(|check| check.verdict(&key));

		Some(Self {
			key,
			source: source.to_string(),
			verdict,
			columns,
		})
	}

	pub fn is_unauthorized(&self) -> bool {
		self.verdict.is_some_and(Verdict::is_unauthorized)
	}

	/// Render as `key,source,[verdict,]col1 | col2 | last`.
	///
	/// A line with only a key has no trailing columns and renders as
	/// `key,source,`; the key is not repeated in the column slot.
	pub fn render(&self) -> String {
		let mut row = format!("{},{},", self.key, self.source);
		if let Some(verdict) = self.verdict {
			row.push_str(verdict.as_str());
			row.push(',');
		}
		row.push_str(&self.columns.join(COLUMN_SEPARATOR));
		row
	}
}

use std::fmt;

use serde::Serialize;

/// Outcome of the legality check for a parameter token or CSV key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
	#[serde(rename = "ok")]
	Legal,
	#[serde(rename = "unauthorized")]
	Unauthorized,
}

impl Verdict {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Legal => "ok",
			Self::Unauthorized => "unauthorized",
		}
	}

	pub fn is_unauthorized(self) -> bool {
		self == Self::Unauthorized
	}
}

impl fmt::Display for Verdict {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Decides whether a parameter token or CSV key is allowed.
pub trait LegalityCheck {
	fn is_legal(&self, token: &str) -> bool;

	fn verdict(&self, token: &str) -> Verdict {
		if self.is_legal(token) {
			Verdict::Legal
		} else {
			Verdict::Unauthorized
		}
	}
}

impl<F> LegalityCheck for F
where
	F: Fn(&str) -> bool,
{
	fn is_legal(&self, token: &str) -> bool {
		self(token)
	}
}

/// Flags `<...>` matches that are not really parameters, such as markup.
pub trait FalsePositiveFilter {
	fn is_false_positive(&self, token: &str) -> bool;
}

impl<F> FalsePositiveFilter for F
where
	F: Fn(&str) -> bool,
{
	fn is_false_positive(&self, token: &str) -> bool {
		self(token)
	}
}

/// One sighting of a parameter token in a template line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterOccurrence {
	/// The token including its angle brackets, e.g. `<NAME>`.
	pub token: String,
	/// Name of the file the token was found in.
	pub source: String,
	/// The surrounding line, trimmed and with every comma removed.
	pub context: String,
}

/// Trim a line and drop its commas so it can sit in a comma separated row.
pub fn line_context(line: &str) -> String {
	line.trim().replace(',', "")
}

/// Find every non-overlapping `<...>` token, shortest match first. A token
/// may contain line breaks; an opening `<` without a later `>` ends the
/// search.
pub fn match_tokens(text: &str) -> Vec<&str> {
	let mut tokens = Vec::new();
	let mut search_from = 0;

	while let Some(open_offset) = text[search_from..].find('<') {
		let abs_open = search_from + open_offset;
		let Some(close_offset) = text[abs_open + 1..].find('>') else {
			break;
		};
		let abs_close_end = abs_open + 1 + close_offset + 1;

		tokens.push(&text[abs_open..abs_close_end]);
		search_from = abs_close_end;
	}

	tokens
}

/// Extract every parameter token from one line, skipping the ones the filter
/// flags as false positives.
pub fn find_parameters(
	line: &str,
	source: &str,
	filter: &dyn FalsePositiveFilter,
) -> Vec<ParameterOccurrence> {
	let context = line_context(line);
	match_tokens(line)
		.into_iter()
		.filter(|token| !filter.is_false_positive(token))
		.map(|token| {
			ParameterOccurrence {
				token: token.to_string(),
				source: source.to_string(),
				context: context.clone(),
			}
		})
		.collect()
}

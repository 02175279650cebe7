use crate::classifier::FileRole;
use crate::classifier::classify;
use crate::decision::DecisionRow;
use crate::encoder::ScriptFragment;
use crate::encoder::normalize_extension;
use crate::encoder::split_extension;
use crate::params::ParameterOccurrence;
use crate::params::find_parameters;
use crate::validators::Validators;

/// Everything extracted from a single eligible file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
	pub file_name: String,
	pub role: FileRole,
	pub fragment: ScriptFragment,
	/// Rows built from a CSV template. Empty for other roles.
	pub decisions: Vec<DecisionRow>,
	/// Parameter occurrences found in a text template. Empty for other roles.
	pub parameters: Vec<ParameterOccurrence>,
}

/// Decode file bytes as UTF-8, silently dropping invalid sequences.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
	let mut decoded = String::with_capacity(bytes.len());
	for chunk in bytes.utf8_chunks() {
		decoded.push_str(chunk.valid());
	}
	decoded
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Encode a file and, depending on its role, extract decision rows or
/// parameter occurrences from it.
pub fn scan_content(
	file_name: &str,
	content: &str,
	changes_file: Option<&str>,
	validators: &Validators,
) -> ScannedFile {
	let content = normalize_line_endings(content);
	let (_, extension) = split_extension(file_name);
	let role = classify(file_name, &normalize_extension(extension), changes_file);
	let fragment = ScriptFragment::from_content(file_name, &content);

	let mut decisions = Vec::new();
	let mut parameters = Vec::new();

	match role {
		FileRole::Changes | FileRole::Passthrough => {}
		FileRole::Csv => {
			decisions.extend(
				content
					.lines()
					.filter_map(|line| DecisionRow::from_line(line, file_name, validators.legality())),
			);
		}
		FileRole::Text => {
			for line in content.lines() {
				parameters.extend(find_parameters(
					line,
					file_name,
					validators.false_positives(),
				));
			}
		}
	}

	ScannedFile {
		file_name: file_name.to_string(),
		role,
		fragment,
		decisions,
		parameters,
	}
}

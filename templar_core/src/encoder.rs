//! Literal-safe encoding of template content into script array declarations.

/// Closing script tag and the split form it is rewritten to, so an embedded
/// line can never end the surrounding `<script>` element.
const SCRIPT_CLOSE: &str = "</script>";
const SCRIPT_CLOSE_ESCAPED: &str = r"<\/script>";

/// Escape one line of raw text so it can be placed between double quotes in a
/// generated script array.
///
/// The steps run in a fixed order: backslashes and double quotes are prefixed
/// with a backslash, then hyphens are, then `</script>` is split into
/// `<\/script>`. Nothing else is touched.
pub fn encode_line(line: &str) -> String {
	let mut quoted = String::with_capacity(line.len() + 8);
	for ch in line.chars() {
		if matches!(ch, '\\' | '"') {
			quoted.push('\\');
		}
		quoted.push(ch);
	}

	let hyphenated = quoted.replace('-', r"\-");

	hyphenated.replace(SCRIPT_CLOSE, SCRIPT_CLOSE_ESCAPED)
}

/// Split a file name into its stem and extension, with the extension keeping
/// its leading dot. Leading dots belong to the stem, so `.bashrc` has no
/// extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
	let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
	match file_name[leading_dots..].rfind('.') {
		Some(index) => file_name.split_at(leading_dots + index),
		None => (file_name, ""),
	}
}

/// Normalize an extension for classification: trailing whitespace is removed
/// and every `.` becomes `_`, so `.csv` turns into `_csv`.
pub fn normalize_extension(extension: &str) -> String {
	extension.trim_end().replace('.', "_")
}

/// Build the script variable name for a file: `v_` followed by the sanitized
/// stem and the normalized extension.
pub fn variable_name(file_name: &str) -> String {
	let (stem, extension) = split_extension(file_name);
	let sanitized: String = stem
		.trim_end()
		.chars()
		.map(|ch| {
			if ch.is_whitespace() || matches!(ch, '-' | '.' | '(' | ')' | '+') {
				'_'
			} else {
				ch
			}
		})
		.collect();

	format!("v_{sanitized}{}", normalize_extension(extension))
}

/// The array-shaped embedding of one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFragment {
	/// Sanitized variable name the array is declared under.
	pub variable: String,
	/// Original file name, stored unescaped as the first array element.
	pub file_name: String,
	/// Escaped content lines in file order.
	pub lines: Vec<String>,
}

impl ScriptFragment {
	pub fn new(file_name: &str) -> Self {
		Self {
			variable: variable_name(file_name),
			file_name: file_name.to_string(),
			lines: Vec::new(),
		}
	}

	/// Encode every line of `content` into a new fragment. Trailing whitespace
	/// is dropped from each line before it is escaped.
	pub fn from_content(file_name: &str, content: &str) -> Self {
		let mut fragment = Self::new(file_name);
		for line in content.lines() {
			fragment.push_line(line);
		}
		fragment
	}

	pub fn push_line(&mut self, raw: &str) {
		self.lines.push(encode_line(raw.trim_end()));
	}

	/// Render the declaration, terminated with `];` and a blank line.
	pub fn render(&self) -> String {
		let mut output = format!("    var {} = [\n \"{}", self.variable, self.file_name);
		for line in &self.lines {
			output.push_str("\",\n\"");
			output.push_str(line);
		}
		output.push_str("\"];\n\n");
		output
	}
}

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::TemplarError;
use crate::TemplarResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"templar.toml",
	".templar.toml",
	".config/templar.toml",
];

/// Configuration loaded from a `templar.toml` file.
///
/// ```toml
/// changes_file = "changes.txt"
/// merge = "file"
///
/// [linked]
/// names = ["intf.txt", "decisions.csv"]
/// patterns = ["*.j2"]
///
/// [exclude]
/// patterns = ["build/"]
/// respect_gitignore = true
///
/// [legality]
/// path = "legal-params.txt"
///
/// [false_positives]
/// tokens = ["<br>"]
/// markup = true
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct TemplarConfig {
	/// Name of the changes file. It is always encoded but never scanned.
	#[serde(default)]
	pub changes_file: Option<String>,
	/// Merge policy for duplicate parameters: `no`, `file` or `all`. Kept as
	/// raw text here and validated when scan options are built.
	#[serde(default)]
	pub merge: Option<String>,
	/// Eligible files larger than this many bytes are skipped. Unlimited when
	/// unset.
	#[serde(default)]
	pub max_file_size: Option<u64>,
	#[serde(default)]
	pub linked: LinkedConfig,
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Presence of this section enables the legality check.
	#[serde(default)]
	pub legality: Option<LegalityConfig>,
	#[serde(default)]
	pub false_positives: FalsePositiveConfig,
}

/// File names that are referenced elsewhere and should be processed.
#[derive(Debug, Default, Deserialize)]
pub struct LinkedConfig {
	/// Exact file names.
	#[serde(default)]
	pub names: Vec<String>,
	/// Glob patterns matched against file names.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Configuration for excluding files and directories from the walk.
///
/// Patterns follow gitignore syntax. The root `.gitignore` is only consulted
/// when `respect_gitignore` is set.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
	#[serde(default)]
	pub respect_gitignore: bool,
}

/// Source of the legal parameter list.
#[derive(Debug, Clone, Deserialize)]
pub struct LegalityConfig {
	/// File of legal tokens, relative to the project root.
	pub path: PathBuf,
}

/// Tokens to ignore when extracting parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FalsePositiveConfig {
	/// Exact tokens (with brackets) that are never parameters.
	#[serde(default)]
	pub tokens: Vec<String>,
	/// Treat markup such as comments, closing tags and self-closing tags as
	/// false positives.
	#[serde(default)]
	pub markup: bool,
}

impl TemplarConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> TemplarResult<Option<TemplarConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	pub fn parse(content: &str) -> TemplarResult<TemplarConfig> {
		toml::from_str(content).map_err(|e| TemplarError::ConfigParse(e.to_string()))
	}
}

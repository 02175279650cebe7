use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TemplarError {
	#[error(transparent)]
	#[diagnostic(code(templar::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid merge policy `{0}`")]
	#[diagnostic(
		code(templar::invalid_merge_policy),
		help("merge must be one of `no`, `file` or `all`")
	)]
	InvalidMergePolicy(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(templar::config_parse),
		help("check that templar.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(templar::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to load legal parameter list `{path}`: {reason}")]
	#[diagnostic(
		code(templar::legality_list),
		help("point `[legality] path` in templar.toml at a readable file")
	)]
	LegalityList { path: String, reason: String },
}

pub type TemplarResult<T> = Result<T, TemplarError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

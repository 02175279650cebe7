use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::TemplarError;
use crate::TemplarResult;
use crate::config::TemplarConfig;
use crate::params::FalsePositiveFilter;
use crate::params::LegalityCheck;

/// Accepts every match as a real parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFalsePositives;

impl FalsePositiveFilter for NoFalsePositives {
	fn is_false_positive(&self, _token: &str) -> bool {
		false
	}
}

/// Exact-token denylist with an optional markup heuristic.
#[derive(Debug, Clone, Default)]
pub struct FalsePositiveList {
	tokens: HashSet<String>,
	markup: bool,
}

impl FalsePositiveList {
	pub fn new<I, S>(tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			tokens: tokens.into_iter().map(Into::into).collect(),
			markup: false,
		}
	}

	#[must_use]
	pub fn with_markup(mut self, markup: bool) -> Self {
		self.markup = markup;
		self
	}
}

/// Comments, processing instructions, closing and self-closing tags, and
/// tokens with nothing between the brackets.
fn looks_like_markup(token: &str) -> bool {
	let inner = token
		.strip_prefix('<')
		.and_then(|rest| rest.strip_suffix('>'))
		.unwrap_or(token);

	inner.trim().is_empty()
		|| inner.starts_with('!')
		|| inner.starts_with('/')
		|| (inner.starts_with('?') && inner.ends_with('?'))
		|| inner.ends_with('/')
}

impl FalsePositiveFilter for FalsePositiveList {
	fn is_false_positive(&self, token: &str) -> bool {
		self.tokens.contains(token) || (self.markup && looks_like_markup(token))
	}
}

/// Legal tokens loaded from a list. Anything not listed is unauthorized.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
	tokens: HashSet<String>,
}

impl AllowList {
	/// Parse a list with one token per line. Only the first comma separated
	/// column counts; blank lines and `#` comments are ignored.
	pub fn parse(content: &str) -> Self {
		content
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty() && !line.starts_with('#'))
			.filter_map(|line| line.split(',').next())
			.map(str::trim)
			.collect()
	}

	pub fn from_path(path: &Path) -> TemplarResult<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			TemplarError::LegalityList {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;
		Ok(Self::parse(&content))
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

impl<S: Into<String>> FromIterator<S> for AllowList {
	fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
		Self {
			tokens: iter.into_iter().map(Into::into).collect(),
		}
	}
}

impl LegalityCheck for AllowList {
	fn is_legal(&self, token: &str) -> bool {
		self.tokens.contains(token)
	}
}

/// The strategies the pipeline consults while extracting parameters.
///
/// The false-positive filter is always present. The legality check is
/// optional; without it no verdict column is produced.
pub struct Validators {
	false_positives: Box<dyn FalsePositiveFilter>,
	legality: Option<Box<dyn LegalityCheck>>,
}

impl Default for Validators {
	fn default() -> Self {
		Self {
			false_positives: Box::new(NoFalsePositives),
			legality: None,
		}
	}
}

impl fmt::Debug for Validators {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Validators")
			.field("legality", &self.legality.is_some())
			.finish_non_exhaustive()
	}
}

impl Validators {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_false_positives(mut self, filter: impl FalsePositiveFilter + 'static) -> Self {
		self.false_positives = Box::new(filter);
		self
	}

	#[must_use]
	pub fn with_legality(mut self, check: impl LegalityCheck + 'static) -> Self {
		self.legality = Some(Box::new(check));
		self
	}

	/// Build validators from `templar.toml`. The legal parameter list is read
	/// relative to `root`.
	pub fn from_config(root: &Path, config: Option<&TemplarConfig>) -> TemplarResult<Self> {
		let Some(config) = config else {
			return Ok(Self::default());
		};

		let mut validators = Self::default();
		let false_positives = &config.false_positives;
		if false_positives.markup || !false_positives.tokens.is_empty() {
			validators = validators.with_false_positives(
				FalsePositiveList::new(false_positives.tokens.iter().cloned())
					.with_markup(false_positives.markup),
			);
		}

		if let Some(legality) = &config.legality {
			let allow_list = AllowList::from_path(&root.join(&legality.path))?;
			tracing::debug!(tokens = allow_list.len(), "loaded legal parameter list");
			validators = validators.with_legality(allow_list);
		}

		Ok(validators)
	}

	pub fn false_positives(&self) -> &dyn FalsePositiveFilter {
		self.false_positives.as_ref()
	}

	pub fn legality(&self) -> Option<&dyn LegalityCheck> {
		self.legality.as_deref()
	}
}

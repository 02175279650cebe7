use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::TemplarError;
use crate::TemplarResult;
use crate::aggregator::MergePolicy;
use crate::aggregator::ParameterTable;
use crate::classifier::LinkedNames;
use crate::classifier::is_eligible;
use crate::config::TemplarConfig;
use crate::scanner::decode_dropping_invalid;
use crate::scanner::scan_content;
use crate::validators::Validators;

/// Options for controlling how a template directory is processed.
///
/// Use [`ScanOptions::default()`] and the builder methods, or
/// [`ScanOptions::from_config`] to construct from a [`TemplarConfig`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
	/// Name of the changes file, if any.
	pub changes_file: Option<String>,
	/// Files eligible for processing.
	pub linked: LinkedNames,
	/// Merge policy applied when rendering parameter rows.
	pub merge: MergePolicy,
	/// Gitignore-style patterns to exclude from the walk.
	pub exclude_patterns: Vec<String>,
	/// Eligible files larger than this many bytes are skipped. No limit when
	/// `None`.
	pub max_file_size: Option<u64>,
	/// Whether the root `.gitignore` filters the walk. Off by default so every
	/// linked file is processed.
	pub respect_gitignore: bool,
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`TemplarConfig`]. The merge policy is
	/// validated here, before any template is read.
	pub fn from_config(config: Option<&TemplarConfig>) -> TemplarResult<Self> {
		let Some(config) = config else {
			return Ok(Self::default());
		};

		let merge = config
			.merge
			.as_deref()
			.map(str::parse::<MergePolicy>)
			.transpose()?
			.unwrap_or_default();
		let linked = LinkedNames::new(config.linked.names.iter().cloned())
			.with_patterns(&config.linked.patterns)?;

		Ok(Self {
			changes_file: config.changes_file.clone(),
			linked,
			merge,
			exclude_patterns: config.exclude.patterns.clone(),
			max_file_size: config.max_file_size,
			respect_gitignore: config.exclude.respect_gitignore,
		})
	}

	/// Set the merge policy from its textual form.
	pub fn with_merge(mut self, merge: &str) -> TemplarResult<Self> {
		self.merge = merge.parse()?;
		Ok(self)
	}

	#[must_use]
	pub fn with_changes_file(mut self, name: impl Into<String>) -> Self {
		self.changes_file = Some(name.into());
		self
	}

	#[must_use]
	pub fn with_linked<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for name in names {
			self.linked.insert(name);
		}
		self
	}
}

/// Linked file names mapped to their paths, serialized as
/// `{ "templates": { name: path } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkedTemplates {
	pub templates: BTreeMap<String, PathBuf>,
}

/// Everything produced by one run over a template directory.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateScan {
	/// Script array declarations, one per eligible file.
	pub script: String,
	/// Linked files (the changes file excluded).
	pub linked: LinkedTemplates,
	/// Decision rows from CSV templates, in discovery order.
	pub decision_rows: Vec<String>,
	/// Parameter rows rendered with `merge`.
	pub parameter_rows: Vec<String>,
	/// Merge policy the parameter rows were rendered with.
	pub merge: MergePolicy,
	/// Aggregated parameter records.
	pub parameters: ParameterTable,
	/// Decision and parameter rows whose verdict is `unauthorized`.
	pub unauthorized_rows: Vec<String>,
	/// Sticky marker set when any token or CSV key was unauthorized.
	pub invalid_param_found: bool,
}

/// Process a template directory configured by the `templar.toml` found at
/// `root`.
pub fn scan_templates_with_config(root: &Path) -> TemplarResult<TemplateScan> {
	let config = TemplarConfig::load(root)?;
	let options = ScanOptions::from_config(config.as_ref())?;
	let validators = Validators::from_config(root, config.as_ref())?;

	scan_templates(root, &options, &validators)
}

/// Walk `root`, encode every eligible file into the script buffer, collect
/// decision rows and parameter occurrences, and render parameter rows once
/// at the end.
pub fn scan_templates(
	root: &Path,
	options: &ScanOptions,
	validators: &Validators,
) -> TemplarResult<TemplateScan> {
	tracing::info!(root = %root.display(), merge = %options.merge, "processing template files");

	let files = collect_files(root, &options.exclude_patterns, options.respect_gitignore)?;
	let changes_file = options.changes_file.as_deref();

	let mut script = String::new();
	let mut linked = LinkedTemplates::default();
	let mut decision_rows = Vec::new();
	let mut unauthorized_rows = Vec::new();
	let mut parameters = ParameterTable::new();
	let mut invalid_param_found = false;

	for path in files {
		let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
			continue;
		};

		if !is_eligible(file_name, &options.linked, changes_file) {
			continue;
		}

		let Some(bytes) = read_eligible_file(&path, options.max_file_size) else {
			continue;
		};
		let content = decode_dropping_invalid(&bytes);
		let scanned = scan_content(file_name, &content, changes_file, validators);
		tracing::debug!(
			file = %path.display(),
			role = ?scanned.role,
			lines = scanned.fragment.lines.len(),
			"processed template"
		);

		if scanned.role.is_linked() {
			linked.templates.insert(file_name.to_string(), path.clone());
		}
		script.push_str(&scanned.fragment.render());

		for row in scanned.decisions {
			let rendered = row.render();
			if row.is_unauthorized() {
				invalid_param_found = true;
				unauthorized_rows.push(rendered.clone());
			}
			decision_rows.push(rendered);
		}
		for occurrence in scanned.parameters {
			parameters.record(occurrence, validators.legality());
		}
	}

	let rendered = parameters.render(options.merge);
	invalid_param_found |= rendered.invalid_param_found;
	unauthorized_rows.extend(rendered.unauthorized);

	if invalid_param_found {
		tracing::info!("unauthorized parameters found");
	}
	tracing::info!(
		templates = linked.templates.len(),
		decisions = decision_rows.len(),
		parameters = rendered.rows.len(),
		"finished processing template files"
	);

	Ok(TemplateScan {
		script,
		linked,
		decision_rows,
		parameter_rows: rendered.rows,
		merge: options.merge,
		parameters,
		unauthorized_rows,
		invalid_param_found,
	})
}

/// Read an eligible file, returning `None` (with a notice) when it is not a
/// regular file, is too large, or cannot be read.
fn read_eligible_file(path: &Path, max_file_size: Option<u64>) -> Option<Vec<u8>> {
	let metadata = match std::fs::metadata(path) {
		Ok(metadata) if metadata.is_file() => metadata,
		Ok(_) => {
			tracing::warn!(file = %path.display(), "skipping eligible entry: not a regular file");
			return None;
		}
		Err(e) => {
			tracing::warn!(file = %path.display(), error = %e, "skipping eligible entry: unreadable");
			return None;
		}
	};

	if let Some(limit) = max_file_size.filter(|limit| metadata.len() > *limit) {
		tracing::warn!(
			file = %path.display(),
			size = metadata.len(),
			limit,
			"skipping eligible entry: file too large"
		);
		return None;
	}

	match std::fs::read(path) {
		Ok(bytes) => Some(bytes),
		Err(e) => {
			tracing::warn!(file = %path.display(), error = %e, "skipping eligible entry: unreadable");
			None
		}
	}
}

/// Build a `Gitignore` matcher from exclude patterns in `templar.toml`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> TemplarResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			TemplarError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		TemplarError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

/// Build a `Gitignore` matcher from the root's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Collect every file below `root`, sorted for deterministic ordering.
///
/// Eligibility is decided later, so entries that are not regular files (a
/// dangling symlink, for example) are collected too. Symlinked directories are
/// listed but never descended into.
fn collect_files(
	root: &Path,
	exclude_patterns: &[String],
	respect_gitignore: bool,
) -> TemplarResult<Vec<PathBuf>> {
	if !root.is_dir() {
		return Err(TemplarError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("template directory not found: {}", root.display()),
		)));
	}

	let gitignore = if respect_gitignore {
		build_gitignore(root)
	} else {
		Gitignore::empty()
	};
	let custom_exclude = build_exclude_matcher(root, exclude_patterns)?;

	let mut files = Vec::new();
	walk_dir(root, &mut files, &gitignore, &custom_exclude);
	files.sort();
	Ok(files)
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	gitignore: &Gitignore,
	custom_exclude: &Gitignore,
) {
	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(e) => {
			tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
			return;
		}
	};

	for entry in entries.flatten() {
		let path = entry.path();

		if path.file_name().is_some_and(|name| name == ".git") {
			continue;
		}

		let Ok(file_type) = entry.file_type() else {
			continue;
		};

		if file_type.is_symlink() && path.is_dir() {
			tracing::debug!(dir = %path.display(), "not following directory symlink");
			continue;
		}

		let is_dir = file_type.is_dir();

		if gitignore.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if custom_exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, files, gitignore, custom_exclude);
		} else {
			files.push(path);
		}
	}
}

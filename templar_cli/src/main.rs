use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use templar_core::AllowList;
use templar_core::MergePolicy;
use templar_core::ScanOptions;
use templar_core::TemplarConfig;
use templar_core::TemplateScan;
use templar_core::Validators;
use templar_core::scan_templates;
use templar_cli::Commands;
use templar_cli::OutputFormat;
use templar_cli::ScanArgs;
use templar_cli::TemplarCli;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

/// Environment variable holding the log filter, e.g. `TEMPLAR_LOG=debug`.
const LOG_ENV: &str = "TEMPLAR_LOG";

const SAMPLE_CONFIG: &str = r#"# templar configuration

# Name of the changes file. It is encoded but never scanned for parameters.
# changes_file = "changes.txt"

# How duplicate parameters are merged: no, file or all.
merge = "no"

[linked]
# Files referenced elsewhere that should be processed.
names = []
# patterns = ["*.j2"]

[exclude]
# patterns = ["build/"]
# respect_gitignore = true

# [legality]
# path = "legal-params.txt"

# [false_positives]
# tokens = ["<br>"]
# markup = true
"#;

fn main() {
	let args = TemplarCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Scan { scan, format, out }) => run_scan(&args, scan, *format, out.as_deref()),
		Some(Commands::Check { scan, format }) => run_check(&args, scan, *format),
		None => {
			eprintln!("No subcommand specified. Run `templar --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<templar_core::TemplarError>() {
			Ok(templar_err) => {
				let report: miette::Report = (*templar_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

fn resolve_root(args: &TemplarCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn run_init(args: &TemplarCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = TemplarConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("templar.toml");
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. List the files to process under [linked] names");
	println!("  2. Run `templar scan` to see the script and parameter rows");

	Ok(())
}

/// Load `templar.toml` and apply command line overrides. An invalid `--merge`
/// is rejected before anything is read from disk.
fn build_scan(
	root: &Path,
	scan: &ScanArgs,
) -> Result<(ScanOptions, Validators), Box<dyn std::error::Error>> {
	let merge = scan
		.merge
		.as_deref()
		.map(str::parse::<MergePolicy>)
		.transpose()?;

	let mut config = TemplarConfig::load(root)?;
	tracing::debug!(config = ?TemplarConfig::resolve_path(root), "resolved configuration");
	// A command line policy replaces the configured one before it is validated.
	if let (Some(config), Some(merge)) = (config.as_mut(), merge) {
		config.merge = Some(merge.to_string());
	}

	let mut options = ScanOptions::from_config(config.as_ref())?;
	if let Some(merge) = merge {
		options.merge = merge;
	}
	if let Some(changes) = &scan.changes {
		options.changes_file = Some(changes.clone());
	}
	options = options.with_linked(scan.linked.iter().cloned());

	let mut validators = Validators::from_config(root, config.as_ref())?;
	if let Some(legal) = &scan.legal {
		validators = validators.with_legality(AllowList::from_path(&root.join(legal))?);
	}

	Ok((options, validators))
}

fn run_templates(
	args: &TemplarCli,
	scan: &ScanArgs,
) -> Result<TemplateScan, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let (options, validators) = build_scan(&root, scan)?;

	if options.linked.is_empty() && options.changes_file.is_none() {
		eprintln!(
			"{} no linked files or changes file configured; nothing will be processed",
			colored!("warning:", yellow)
		);
	}

	Ok(scan_templates(&root, &options, &validators)?)
}

fn run_scan(
	args: &TemplarCli,
	scan: &ScanArgs,
	format: OutputFormat,
	out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let result = run_templates(args, scan)?;

	if let Some(out) = out {
		write_outputs(out, &result)?;
	}

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&result)?);
		}
		OutputFormat::Text => print_scan(&result, args.verbose),
	}

	Ok(())
}

fn print_scan(result: &TemplateScan, verbose: bool) {
	println!(
		"Processed {} linked template(s): {} decision row(s), {} parameter row(s) (merge: {})",
		result.linked.templates.len(),
		result.decision_rows.len(),
		result.parameter_rows.len(),
		result.merge,
	);

	if verbose && !result.linked.templates.is_empty() {
		print_section("Templates");
		for (name, path) in &result.linked.templates {
			println!("  {name:<28} {}", path.display());
		}
	}

	if !result.decision_rows.is_empty() {
		print_section("Decision rows");
		for row in &result.decision_rows {
			println!("  {row}");
		}
	}

	if !result.parameter_rows.is_empty() {
		print_section("Parameter rows");
		for row in &result.parameter_rows {
			println!("  {row}");
		}
	}

	if result.invalid_param_found {
		println!();
		println!(
			"{} unauthorized parameters found (!)",
			colored!("warning:", yellow)
		);
	}
}

fn write_outputs(out: &Path, result: &TemplateScan) -> Result<(), Box<dyn std::error::Error>> {
	std::fs::create_dir_all(out)?;
	std::fs::write(out.join("templates.js"), &result.script)?;
	std::fs::write(
		out.join("templates.json"),
		serde_json::to_string_pretty(&result.linked)?,
	)?;
	std::fs::write(out.join("decisions.csv"), join_rows(&result.decision_rows))?;
	std::fs::write(out.join("parameters.csv"), join_rows(&result.parameter_rows))?;
	tracing::info!(out = %out.display(), "wrote template artifacts");

	Ok(())
}

fn join_rows(rows: &[String]) -> String {
	let mut joined = String::new();
	for row in rows {
		joined.push_str(row);
		joined.push('\n');
	}
	joined
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
	ok: bool,
	unauthorized: Vec<&'a str>,
}

fn run_check(
	args: &TemplarCli,
	scan: &ScanArgs,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let result = run_templates(args, scan)?;
	let report = CheckReport {
		ok: !result.invalid_param_found,
		unauthorized: result.unauthorized_rows.iter().map(String::as_str).collect(),
	};

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
		OutputFormat::Text if report.ok => {
			println!(
				"{} no unauthorized parameters found.",
				colored!("Check passed:", green)
			);
		}
		OutputFormat::Text => {
			eprintln!(
				"{} {} unauthorized row(s):",
				colored!("Check failed:", red),
				report.unauthorized.len()
			);
			for row in &report.unauthorized {
				eprintln!("  {row}");
			}
		}
	}

	if !report.ok {
		process::exit(1);
	}

	Ok(())
}

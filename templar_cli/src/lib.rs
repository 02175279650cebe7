use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Turn a directory of templates into embeddable script arrays and a parameter table.",
	long_about = "templar reads the linked files of a template directory, encodes each one as a \
	              script array that can be inlined in a generated document, and extracts the \
	              <PARAMETER> placeholders they contain into a table.\n\nQuick start:\n  \
	              templar init   Create a templar.toml\n  templar scan   Print the script and \
	              parameter rows\n  templar check  Fail when unauthorized parameters are found"
)]
pub struct TemplarCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the template directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

/// Overrides applied on top of `templar.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
	/// How duplicate parameters are merged: `no`, `file` or `all`.
	#[arg(long)]
	pub merge: Option<String>,

	/// Name of the changes file.
	#[arg(long)]
	pub changes: Option<String>,

	/// Additional linked file names. May be repeated.
	#[arg(long = "linked", value_name = "NAME")]
	pub linked: Vec<String>,

	/// File of legal parameter tokens. Enables the legality check.
	#[arg(long, value_name = "FILE")]
	pub legal: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `templar.toml` in the template directory.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Process the template directory and report the results.
	///
	/// Every linked file and the changes file is encoded as a script array.
	/// Text templates are scanned for `<PARAMETER>` tokens and CSV templates
	/// are turned into decision rows.
	Scan {
		#[command(flatten)]
		scan: ScanArgs,

		/// Output format. `text` prints a summary and the rows, `json`
		/// prints the complete result.
		#[arg(long, default_value = "text")]
		format: OutputFormat,

		/// Write `templates.js`, `templates.json`, `decisions.csv` and
		/// `parameters.csv` into this directory.
		#[arg(long, value_name = "DIR")]
		out: Option<PathBuf>,
	},
	/// Fail when any parameter or CSV key is unauthorized.
	///
	/// Exits with status 1 when the legality check rejects at least one
	/// token. Ideal for CI pipelines.
	Check {
		#[command(flatten)]
		scan: ScanArgs,

		/// Output format for check results.
		#[arg(long, default_value = "text")]
		format: OutputFormat,
	},
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use dm_core::ConfigOverrides;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Link source files to their documentation and keep it complete.",
	long_about = "dm (dungeon master) links source files to the hand written documentation that \
	              describes them. Add a marker comment such as `# track_lore(\"api/payments.md\")` \
	              to a source file and dm keeps track of which lore file documents it.\n\nQuick \
	              start:\n  dm init         Create dmconfig.json and the lore directory\n  dm map  \
	              Show which source files reference which lore files\n  dm create-lore  Create \
	              missing lore files from the template\n  dm validate     Check that every lore \
	              file is filled in"
)]
pub struct DmCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the repository root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Configuration file, resolved against the repository root. Defaults to
	/// `dmconfig.json`.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Override the lore directory configured in `dmconfig.json`.
	#[arg(long, global = true)]
	pub lore_dir: Option<String>,

	/// Override the minimum number of characters a section needs.
	#[arg(long, global = true)]
	pub min_length: Option<u64>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

impl DmCli {
	/// The command line flags that take precedence over `dmconfig.json`.
	pub fn overrides(&self) -> ConfigOverrides {
		ConfigOverrides {
			lore_directory: self.lore_dir.clone(),
			verbose: self.verbose.then_some(true),
			min_section_length: self.min_length,
			no_color: self.no_color.then_some(true),
			..ConfigOverrides::default()
		}
	}
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize dm in a repository.
	///
	/// Writes a default `dmconfig.json` and creates the lore directory. Files
	/// that already exist are left untouched.
	Init,
	/// Show which lore files are referenced by which source files.
	///
	/// Scans every supported source file for `track_lore` markers and prints
	/// the resulting mapping. Use `--write` to also save it as `map.md` in the
	/// lore directory.
	Map {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Save the map as Markdown to `<lore directory>/map.md`.
		#[arg(long, default_value_t = false)]
		write: bool,
	},
	/// Create lore files that are referenced but do not exist yet.
	///
	/// Every created file is rendered from the default template, or from
	/// `customTemplatePath` when configured, and lists the source files that
	/// reference it.
	CreateLore {
		/// Only create this lore file, relative to the lore directory.
		lore_path: Option<String>,

		/// Replace lore files that already exist.
		#[arg(long, default_value_t = false)]
		overwrite: bool,
	},
	/// Check that every referenced lore file exists and is filled in.
	///
	/// A lore file fails when it is missing, still contains
	/// `[PLEASE FILL OUT` placeholders, leaves a required section empty, or
	/// has no diagram while `requireDiagrams` is on. Exits with status 1 on
	/// failure when `enforceDocumentation` is enabled.
	Validate {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Read or change settings in `dmconfig.json`.
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
pub enum ConfigAction {
	/// Print one setting, or the whole configuration when no key is given.
	Get {
		/// Setting name as written in `dmconfig.json`, e.g. `loreDirectory`.
		key: Option<String>,
	},
	/// Change one setting. The value is parsed as JSON and falls back to a
	/// plain string.
	Set {
		/// Setting name as written in `dmconfig.json`, e.g. `minSectionLength`.
		key: String,
		/// New value, e.g. `25`, `false`, `"docs"` or `["Overview"]`.
		value: String,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

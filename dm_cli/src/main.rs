use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dm_cli::Commands;
use dm_cli::ConfigAction;
use dm_cli::DmCli;
use dm_cli::OutputFormat;
use dm_core::CreateLoreOptions;
use dm_core::DmConfig;
use dm_core::DmError;
use dm_core::LoreMapping;
use dm_core::Reporter;
use dm_core::ScanEvent;
use dm_core::ScanOptions;
use dm_core::SkipReason;
use dm_core::ValidationOptions;
use dm_core::config_path;
use dm_core::create_default_config;
use dm_core::create_lore_file;
use dm_core::create_lore_files;
use dm_core::lore_file_path;
use dm_core::normalize_lore_path;
use dm_core::scan_repository_with_reporter;
use dm_core::template_content;
use dm_core::update_setting;
use dm_core::validate_lore_file;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter, e.g. `DM_LOG=dm_core=debug`.
const LOG_ENV: &str = "DM_LOG";

/// Exit status when validation finds incomplete documentation.
const EXIT_VALIDATION_FAILED: u8 = 1;
/// Exit status for usage, configuration and io errors.
const EXIT_ERROR: u8 = 2;

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
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
}

type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
	let args = DmCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose);

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
		Some(Commands::Init) => run_init(&args).map(|()| ExitCode::SUCCESS),
		Some(Commands::Map { format, write }) => {
			run_map(&args, *format, *write).map(|()| ExitCode::SUCCESS)
		}
		Some(Commands::CreateLore {
			lore_path,
			overwrite,
		}) => run_create_lore(&args, lore_path.as_deref(), *overwrite).map(|()| ExitCode::SUCCESS),
		Some(Commands::Validate { format }) => run_validate(&args, *format),
		Some(Commands::Config { action }) => run_config(&args, action).map(|()| ExitCode::SUCCESS),
		None => {
			eprintln!("No subcommand specified. Run `dm --help` for usage.");
			return ExitCode::from(EXIT_ERROR);
		}
	};

	match result {
		Ok(code) => code,
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<DmError>() {
				Ok(dm_err) => {
					let report: miette::Report = (*dm_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			ExitCode::from(EXIT_ERROR)
		}
	}
}

/// Send `tracing` output to stderr, filtered by `DM_LOG` or by `--verbose`.
fn init_tracing(verbose: bool) {
	let default_directive = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_ansi(color_enabled())
		.init();
}

/// The repository being worked on and its resolved configuration.
struct Workspace {
	root: PathBuf,
	config: DmConfig,
}

impl Workspace {
	fn lore_root(&self) -> PathBuf {
		self.config.lore_root(&self.root)
	}

	fn verbose(&self) -> bool {
		self.config.verbose_output
	}

	fn relative(&self, path: &Path) -> String {
		make_relative(path, &self.root)
	}
}

fn resolve_root(args: &DmCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn resolve_config_path(args: &DmCli, root: &Path) -> PathBuf {
	root.join(config_path(args.config.as_deref()))
}

fn load_workspace(args: &DmCli) -> CommandResult<Workspace> {
	let root = resolve_root(args);
	let config_path = resolve_config_path(args, &root);
	let config = DmConfig::load(&config_path)?.merge_with_overrides(&args.overrides());
	let errors = config.validate();
	if !errors.is_empty() {
		return Err(DmError::InvalidConfiguration(errors).into());
	}

	if !config.color_output {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	tracing::debug!(
		root = %root.display(),
		config = %config_path.display(),
		lore_directory = %config.lore_directory,
		"loaded workspace"
	);

	Ok(Workspace { root, config })
}

/// Prints scan progress to stderr. Individual skips are only shown in
/// verbose mode; otherwise they are counted.
struct TerminalReporter {
	verbose: bool,
	skipped: usize,
}

impl TerminalReporter {
	fn new(verbose: bool) -> Self {
		Self {
			verbose,
			skipped: 0,
		}
	}

	fn print_summary(&self) {
		if self.skipped > 0 && !self.verbose {
			eprintln!(
				"{} skipped {} file(s) that could not be scanned; rerun with --verbose for details",
				colored!("warning:", yellow),
				self.skipped
			);
		}
	}
}

impl Reporter for TerminalReporter {
	fn report(&mut self, event: ScanEvent) {
		match event {
			ScanEvent::FileSkipped { path, reason } => {
				if reason != SkipReason::ExcludedPattern {
					self.skipped += 1;
				}
				if self.verbose {
					eprintln!("{} {path}: {reason}", colored!("skipped", yellow));
				}
			}
			ScanEvent::DirectoryPruned { path, reason } => {
				if self.verbose {
					eprintln!("{}", colored!(format!("pruned {path}/: {reason}"), dimmed));
				}
			}
			ScanEvent::FileScanned { path, directives } => {
				if self.verbose && directives > 0 {
					eprintln!("{}", colored!(format!("scanned {path}: {directives} marker(s)"), dimmed));
				}
			}
			ScanEvent::Finished { files, lore_files } => {
				if self.verbose {
					eprintln!(
						"Scanned {files} source file(s), found {lore_files} lore file(s)"
					);
				}
			}
			_ => {}
		}
	}
}

fn scan(workspace: &Workspace) -> CommandResult<LoreMapping> {
	let mut reporter = TerminalReporter::new(workspace.verbose());
	let mapping = scan_repository_with_reporter(
		&workspace.root,
		&ScanOptions::from_config(&workspace.config),
		&mut reporter,
	)?;
	reporter.print_summary();

	Ok(mapping)
}

fn run_init(args: &DmCli) -> CommandResult {
	let root = resolve_root(args);
	let config_path = resolve_config_path(args, &root);
	let config_display = make_relative(&config_path, &root);

	if create_default_config(&config_path)? {
		println!("Created {config_display}");
	} else {
		println!("Configuration already exists: {config_display}");
	}

	let workspace = load_workspace(args)?;
	let lore_root = workspace.lore_root();
	let directory_display = workspace.relative(&lore_root);
	if lore_root.is_dir() {
		println!("Lore directory already exists: {directory_display}");
	} else {
		std::fs::create_dir_all(&lore_root)?;
		println!("Created lore directory: {directory_display}");
	}

	println!();
	println!("Next steps:");
	println!("  1. Add markers to the source files you want to document:");
	println!("     # track_lore(\"payments/api.md\")      (Python)");
	println!("     // track_lore(\"payments/api.md\")     (TypeScript / JavaScript)");
	println!("  2. Run `dm create-lore` to create the lore files");
	println!("  3. Fill them in and run `dm validate`");

	Ok(())
}

fn run_map(args: &DmCli, format: OutputFormat, write: bool) -> CommandResult {
	let workspace = load_workspace(args)?;
	let mapping = scan(&workspace)?;
	let lore_root = workspace.lore_root();

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&mapping)?);
		}
		OutputFormat::Text => {
			if mapping.is_empty() {
				println!("No track_lore markers found.");
			} else {
				for (lore_path, sources) in mapping.iter() {
					let status = if lore_exists(&lore_root, lore_path) {
						String::new()
					} else {
						format!(" {}", colored!("(missing)", yellow))
					};
					println!("{}{status}", colored!(lore_path, bold));
					for source in sources {
						println!("  {source}");
					}
				}
				println!(
					"\n{} lore file(s), {} source file(s)",
					mapping.len(),
					count_sources(&mapping)
				);
			}
		}
	}

	if write {
		let map_path = lore_root.join("map.md");
		std::fs::create_dir_all(&lore_root)?;
		std::fs::write(&map_path, render_map_markdown(&mapping, &lore_root))?;
		eprintln!("Wrote {}", workspace.relative(&map_path));
	}

	Ok(())
}

/// Whether the lore file for `lore_path` exists inside `lore_root`.
fn lore_exists(lore_root: &Path, lore_path: &str) -> bool {
	lore_file_path(lore_root, lore_path).is_ok_and(|path| path.is_file())
}

/// Root relative display form of a lore file, falling back to the raw
/// mapping key when the path is not a valid lore path.
fn lore_display(workspace: &Workspace, lore_root: &Path, lore_path: &str) -> String {
	lore_file_path(lore_root, lore_path).map_or_else(
		|_| lore_path.to_string(),
		|path| workspace.relative(&path),
	)
}

fn count_sources(mapping: &LoreMapping) -> usize {
	let mut sources: Vec<&str> = mapping.values().flatten().map(String::as_str).collect();
	sources.sort_unstable();
	sources.dedup();
	sources.len()
}

/// Render the mapping as the Markdown document saved by `dm map --write`.
fn render_map_markdown(mapping: &LoreMapping, lore_root: &Path) -> String {
	let mut output = String::from("# Lore Map\n\n_Generated by `dm map --write`._\n");

	if mapping.is_empty() {
		output.push_str("\nNo source files reference any lore yet.\n");
		return output;
	}

	for (lore_path, sources) in mapping.iter() {
		let missing = if lore_exists(lore_root, lore_path) {
			""
		} else {
			" (missing)"
		};
		let _ = write!(output, "\n## [{lore_path}]({lore_path}){missing}\n\n");
		for source in sources {
			let _ = writeln!(output, "- `{source}`");
		}
	}

	output
}

fn run_create_lore(args: &DmCli, lore_path: Option<&str>, overwrite: bool) -> CommandResult {
	let workspace = load_workspace(args)?;
	let template = template_content(&workspace.config)?;
	let lore_root = workspace.lore_root();
	let mapping = scan(&workspace)?;

	if let Some(lore_path) = lore_path {
		let lore_path = normalize_lore_path(lore_path);
		let options = CreateLoreOptions {
			tracked_files: mapping.sources_for(&lore_path),
			template: &template,
			overwrite,
		};
		let display = lore_display(&workspace, &lore_root, &lore_path);
		if create_lore_file(&lore_root, &lore_path, &options)? {
			println!("{} {display}", colored!("Created", green));
		} else {
			println!("Lore file already exists: {display}");
		}
		return Ok(());
	}

	if mapping.is_empty() {
		println!("No track_lore markers found. Nothing to create.");
		return Ok(());
	}

	let results = create_lore_files(&lore_root, &mapping, &template, overwrite);
	let mut created = 0;
	let mut existing = 0;
	let mut failed = 0;
	for (lore_path, result) in &results {
		let display = lore_display(&workspace, &lore_root, lore_path);
		match result {
			Ok(true) => {
				created += 1;
				println!("{} {display}", colored!("Created", green));
			}
			Ok(false) => {
				existing += 1;
				if workspace.verbose() {
					println!("{} {display}", colored!("Exists ", dimmed));
				}
			}
			Err(e) => {
				failed += 1;
				eprintln!("{} {display}: {e}", colored!("error:", red));
			}
		}
	}

	println!("\nCreated {created} lore file(s), {existing} already existed.");

	if failed > 0 {
		return Err(format!("failed to create {failed} lore file(s)").into());
	}

	Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum LoreStatus {
	Valid,
	Missing,
	Template,
	Incomplete,
	Error,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoreReport<'a> {
	lore_path: &'a str,
	sources: &'a [String],
	status: LoreStatus,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	missing_sections: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
}

fn validate_mapping<'a>(
	workspace: &Workspace,
	mapping: &'a LoreMapping,
	options: &ValidationOptions,
) -> Vec<LoreReport<'a>> {
	let lore_root = workspace.lore_root();

	mapping
		.iter()
		.map(|(lore_path, sources)| {
			let mut report = LoreReport {
				lore_path,
				sources,
				status: LoreStatus::Valid,
				missing_sections: Vec::new(),
				error: None,
			};
			let path = match lore_file_path(&lore_root, lore_path) {
				Ok(path) => path,
				Err(e) => {
					report.status = LoreStatus::Error;
					report.error = Some(e.to_string());
					return report;
				}
			};

			if !path.is_file() {
				report.status = LoreStatus::Missing;
				return report;
			}

			match validate_lore_file(&path, options) {
				Ok(result) => {
					report.status = if result.is_valid {
						LoreStatus::Valid
					} else if result.is_template {
						LoreStatus::Template
					} else {
						LoreStatus::Incomplete
					};
					report.missing_sections = result.missing_sections;
				}
				Err(e) => {
					report.status = LoreStatus::Error;
					report.error = Some(e.to_string());
				}
			}

			report
		})
		.collect()
}

fn run_validate(args: &DmCli, format: OutputFormat) -> CommandResult<ExitCode> {
	let workspace = load_workspace(args)?;
	let mapping = scan(&workspace)?;
	let options = ValidationOptions::from_config(&workspace.config);
	let reports = validate_mapping(&workspace, &mapping, &options);
	let failures = reports
		.iter()
		.filter(|report| report.status != LoreStatus::Valid)
		.count();

	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"ok": failures == 0,
				"files": reports,
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Text => print_validation(&workspace, &reports, failures),
	}

	if failures == 0 {
		return Ok(ExitCode::SUCCESS);
	}

	if workspace.config.enforce_documentation {
		return Ok(ExitCode::from(EXIT_VALIDATION_FAILED));
	}

	eprintln!(
		"{} enforceDocumentation is disabled, not failing",
		colored!("warning:", yellow)
	);
	Ok(ExitCode::SUCCESS)
}

fn print_validation(workspace: &Workspace, reports: &[LoreReport<'_>], failures: usize) {
	if reports.is_empty() {
		println!("No track_lore markers found. Nothing to validate.");
		return;
	}

	let lore_root = workspace.lore_root();
	for report in reports {
		let display = lore_display(workspace, &lore_root, report.lore_path);
		match report.status {
			LoreStatus::Valid => {
				if workspace.verbose() {
					println!("{} {display}", colored!("valid     ", green));
				}
			}
			LoreStatus::Missing => {
				println!(
					"{} {display} (referenced by {})",
					colored!("missing   ", red),
					report.sources.join(", ")
				);
			}
			LoreStatus::Template | LoreStatus::Incomplete => {
				let label = if report.status == LoreStatus::Template {
					"template  "
				} else {
					"incomplete"
				};
				println!("{} {display}", colored!(label, red));
				if report.status == LoreStatus::Template {
					println!("  still contains [PLEASE FILL OUT] placeholders");
				}
				if !report.missing_sections.is_empty() {
					println!(
						"  missing sections: {}",
						report.missing_sections.join(", ")
					);
				}
			}
			LoreStatus::Error => {
				println!(
					"{} {display}: {}",
					colored!("error     ", red),
					report.error.as_deref().unwrap_or_default()
				);
			}
		}
	}

	if failures == 0 {
		println!(
			"Validation passed: all {} lore file(s) are complete.",
			reports.len()
		);
	} else {
		println!();
		println!(
			"{} {failures} of {} lore file(s) need attention.",
			colored!("Validation failed:", bold),
			reports.len()
		);
		println!("Run `dm create-lore` to create missing files.");
	}
}

fn run_config(args: &DmCli, action: &ConfigAction) -> CommandResult {
	let root = resolve_root(args);
	let config_path = resolve_config_path(args, &root);

	match action {
		ConfigAction::Get { key: None } => {
			let config = DmConfig::load(&config_path)?;
			println!("{}", serde_json::to_string_pretty(&config)?);
		}
		ConfigAction::Get { key: Some(key) } => {
			let config = DmConfig::load(&config_path)?;
			match config.setting(key) {
				Some(Value::String(value)) => println!("{value}"),
				Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
				None => return Err(format!("unknown setting `{key}`").into()),
			}
		}
		ConfigAction::Set { key, value } => {
			let parsed =
				serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.clone()));
			update_setting(&config_path, key, parsed)?;
			println!("Updated {key} in {}", make_relative(&config_path, &root));
		}
	}

	Ok(())
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

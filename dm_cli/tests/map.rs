mod common;

use std::path::Path;

use clap::Parser;
use dm_cli::Commands;
use dm_cli::DmCli;
use dm_cli::OutputFormat;
use dm_core::AnyEmptyResult;
use serde_json::Value;
use serde_json::json;
use similar_asserts::assert_eq;

fn write_sources(root: &Path) -> std::io::Result<()> {
	std::fs::create_dir_all(root.join("src"))?;
	std::fs::write(
		root.join("src/pay.py"),
		"# track_lore(\"api/pay.md\")\ndef pay():\n    pass\n",
	)?;
	std::fs::write(
		root.join("src/refund.py"),
		"def refund():\n    # track_lore(\"api/pay.md\")\n    pass\n",
	)?;
	Ok(())
}

#[test]
fn map_prints_lore_files_and_sources() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;

	common::dm_cmd()
		.arg("map")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("api/pay.md (missing)"))
		.stdout(predicates::str::contains("  src/pay.py\n  src/refund.py"))
		.stdout(predicates::str::contains("1 lore file(s), 2 source file(s)"));

	Ok(())
}

#[test]
fn map_as_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;

	let output = common::dm_cmd()
		.args(["map", "--format", "json", "--path"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let mapping: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(mapping, json!({ "api/pay.md": ["src/pay.py", "src/refund.py"] }));

	Ok(())
}

#[test]
fn map_writes_markdown_map() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;

	common::dm_cmd()
		.args(["map", "--write", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("Wrote .lore/map.md"));

	let map = std::fs::read_to_string(tmp.path().join(".lore/map.md"))?;
	assert!(map.starts_with("# Lore Map\n"));
	assert!(map.contains("## [api/pay.md](api/pay.md) (missing)"));
	assert!(map.contains("- `src/pay.py`\n- `src/refund.py`\n"));

	Ok(())
}

#[test]
fn map_without_markers() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("main.py"), "print('hello')\n")?;

	common::dm_cmd()
		.arg("map")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No track_lore markers found."));

	Ok(())
}

#[test]
fn map_uses_configured_exclusions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;
	std::fs::create_dir_all(tmp.path().join("vendor"))?;
	std::fs::write(
		tmp.path().join("vendor/lib.py"),
		"# track_lore(\"vendor.md\")\n",
	)?;
	std::fs::write(
		tmp.path().join("src/generated.py"),
		"# track_lore(\"generated.md\")\n",
	)?;
	std::fs::write(
		tmp.path().join("dmconfig.json"),
		r#"{ "excludedDirectories": ["vendor"], "excludedFilePatterns": ["generated.py"] }"#,
	)?;

	let output = common::dm_cmd()
		.args(["map", "--format", "json", "--path"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let mapping: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(mapping, json!({ "api/pay.md": ["src/pay.py", "src/refund.py"] }));

	Ok(())
}

#[test]
fn map_reports_skipped_files_in_verbose_mode() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;
	std::fs::write(tmp.path().join("src/binary.py"), [0xff_u8, 0xfe, 0x00])?;

	common::dm_cmd()
		.arg("map")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("skipped 1 file(s)"));

	common::dm_cmd()
		.args(["map", "--verbose", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("skipped src/binary.py"));

	Ok(())
}

#[test]
fn map_fails_on_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("dmconfig.json"), "{ not json")?;

	common::dm_cmd()
		.arg("map")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("Invalid JSON"));

	Ok(())
}

#[test]
fn map_fails_on_missing_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.arg("map")
		.arg("--path")
		.arg(tmp.path().join("missing"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("file not found"));

	Ok(())
}

#[test]
fn map_flags_are_parsed() {
	let cli = DmCli::parse_from(["dm", "map", "--format", "json", "--write"]);
	match cli.command {
		Some(Commands::Map { format, write }) => {
			assert!(matches!(format, OutputFormat::Json));
			assert!(write);
		}
		_ => panic!("expected Map command"),
	}

	let cli = DmCli::parse_from(["dm", "map"]);
	match cli.command {
		Some(Commands::Map { format, write }) => {
			assert!(matches!(format, OutputFormat::Text));
			assert!(!write);
		}
		_ => panic!("expected Map command"),
	}
}

#[test]
fn global_flags_become_overrides() {
	let cli = DmCli::parse_from([
		"dm",
		"validate",
		"--lore-dir",
		"docs",
		"--min-length",
		"3",
		"--no-color",
	]);
	let overrides = cli.overrides();

	assert_eq!(overrides.lore_directory.as_deref(), Some("docs"));
	assert_eq!(overrides.min_section_length, Some(3));
	assert_eq!(overrides.no_color, Some(true));
	assert_eq!(overrides.verbose, None);
}

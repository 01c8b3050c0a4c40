mod common;

use dm_core::AnyEmptyResult;
use rstest::rstest;
use serde_json::Value;

#[test]
fn get_prints_defaults_without_a_config_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["config", "get", "loreDirectory", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(".lore\n");

	common::dm_cmd()
		.args(["config", "get", "minSectionLength", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("10\n");

	Ok(())
}

#[test]
fn get_prints_the_whole_configuration() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let output = common::dm_cmd()
		.args(["config", "get", "--path"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let config: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(config["loreDirectory"], ".lore");
	assert_eq!(config["enforceDocumentation"], true);
	assert_eq!(config["requiredSections"][0], "Overview");

	Ok(())
}

#[test]
fn set_then_get() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["config", "set", "minSectionLength", "25", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Updated minSectionLength in dmconfig.json",
		));

	common::dm_cmd()
		.args(["config", "get", "minSectionLength", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("25\n");

	let saved: Value =
		serde_json::from_str(&std::fs::read_to_string(tmp.path().join("dmconfig.json"))?)?;
	assert_eq!(saved["minSectionLength"], 25);
	assert_eq!(saved["loreDirectory"], ".lore");

	Ok(())
}

#[test]
fn set_falls_back_to_a_string() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["config", "set", "loreDirectory", "docs/lore", "--path"])
		.arg(tmp.path())
		.assert()
		.success();

	let output = common::dm_cmd()
		.args(["config", "get", "loreDirectory", "--path"])
		.arg(tmp.path())
		.output()?;
	insta::assert_snapshot!(String::from_utf8(output.stdout)?, @"docs/lore");

	Ok(())
}

#[test]
fn set_accepts_json_lists() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args([
			"config",
			"set",
			"requiredSections",
			r#"["Overview","Notes"]"#,
			"--path",
		])
		.arg(tmp.path())
		.assert()
		.success();

	let output = common::dm_cmd()
		.args(["config", "get", "requiredSections", "--path"])
		.arg(tmp.path())
		.output()?;
	let sections: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(sections, serde_json::json!(["Overview", "Notes"]));

	Ok(())
}

#[rstest]
#[case::integer("minSectionLength", "many", "minSectionLength must be an integer")]
#[case::boolean("enforceDocumentation", "sometimes", "enforceDocumentation must be a boolean")]
#[case::list("excludedDirectories", "vendor", "excludedDirectories must be a list")]
#[case::empty_lore_directory("loreDirectory", "\"  \"", "loreDirectory must not be empty")]
#[case::encoding("encoding", "latin-1", "only utf-8 is")]
fn set_rejects_invalid_values(
	#[case] key: &str,
	#[case] value: &str,
	#[case] message: &str,
) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["config", "set", key, value, "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains(message));

	assert!(!tmp.path().join("dmconfig.json").exists());

	Ok(())
}

#[test]
fn get_rejects_unknown_keys() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["config", "get", "colour", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unknown setting `colour`"));

	Ok(())
}

#[test]
fn get_reports_invalid_configuration() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("dmconfig.json"),
		r#"{ "minSectionLength": -1, "requiredSections": "Overview" }"#,
	)?;

	common::dm_cmd()
		.args(["config", "get", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("minSectionLength must be >= 0, got -1"))
		.stderr(predicates::str::contains("requiredSections must be a list"));

	Ok(())
}

mod common;

use dm_core::AnyEmptyResult;
use serde_json::Value;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created dmconfig.json"))
		.stdout(predicates::str::contains("Created lore directory: .lore"));

	assert!(tmp.path().join(".lore").is_dir());

	let content = std::fs::read_to_string(tmp.path().join("dmconfig.json"))?;
	let config: Value = serde_json::from_str(&content)?;
	assert_eq!(config["loreDirectory"], ".lore");
	assert_eq!(config["minSectionLength"], 10);
	assert!(config.get("customTemplatePath").is_none());

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join("dmconfig.json");
	let existing = "{ \"loreDirectory\": \"docs/lore\" }\n";
	std::fs::write(&config_path, existing)?;

	common::dm_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Configuration already exists"))
		.stdout(predicates::str::contains("Created lore directory: docs/lore"));

	assert_eq!(std::fs::read_to_string(&config_path)?, existing);
	assert!(tmp.path().join("docs/lore").is_dir());

	Ok(())
}

#[test]
fn init_twice_is_a_no_op() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	for _ in 0..2 {
		common::dm_cmd()
			.arg("init")
			.arg("--path")
			.arg(tmp.path())
			.assert()
			.success();
	}

	common::dm_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Lore directory already exists: .lore"));

	Ok(())
}

#[test]
fn init_honors_lore_dir_override() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["init", "--lore-dir", "wiki", "--path"])
		.arg(tmp.path())
		.assert()
		.success();

	assert!(tmp.path().join("wiki").is_dir());
	assert!(!tmp.path().join(".lore").exists());

	Ok(())
}

#[test]
fn init_with_custom_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["init", "--config", "config/dm.json", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created config/dm.json"));

	assert!(tmp.path().join("config/dm.json").is_file());
	assert!(!tmp.path().join("dmconfig.json").exists());

	Ok(())
}

#[test]
fn missing_subcommand_is_an_error() -> AnyEmptyResult {
	common::dm_cmd()
		.assert()
		.code(2)
		.stderr(predicates::str::contains("No subcommand specified"));

	Ok(())
}

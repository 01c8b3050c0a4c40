mod common;

use std::path::Path;

use dm_core::AnyEmptyResult;

fn write_sources(root: &Path) -> std::io::Result<()> {
	std::fs::create_dir_all(root.join("src"))?;
	std::fs::write(
		root.join("src/pay.py"),
		"# track_lore(\"api/pay.md\")\ndef pay():\n    pass\n",
	)?;
	std::fs::write(
		root.join("src/refund.py"),
		"# track_lore(\"api/pay.md\")\ndef refund():\n    pass\n",
	)?;
	std::fs::write(
		root.join("src/app.ts"),
		"// track_lore(\"frontend/app.md\")\nexport const app = 1;\n",
	)?;
	Ok(())
}

#[test]
fn creates_missing_lore_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;

	common::dm_cmd()
		.arg("create-lore")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created .lore/api/pay.md"))
		.stdout(predicates::str::contains("Created .lore/frontend/app.md"))
		.stdout(predicates::str::contains(
			"Created 2 lore file(s), 0 already existed.",
		));

	let pay = std::fs::read_to_string(tmp.path().join(".lore/api/pay.md"))?;
	assert!(pay.starts_with("# Documentation for pay\n"));
	assert!(pay.contains("[PLEASE FILL OUT: Overview]"));
	assert!(pay.contains("_This documentation is linked to src/pay.py, src/refund.py_"));

	let app = std::fs::read_to_string(tmp.path().join(".lore/frontend/app.md"))?;
	assert!(app.contains("_This documentation is linked to src/app.ts_"));

	Ok(())
}

#[test]
fn keeps_existing_lore_files_unless_overwriting() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;
	let pay = tmp.path().join(".lore/api/pay.md");
	std::fs::create_dir_all(tmp.path().join(".lore/api"))?;
	std::fs::write(&pay, "# Payments\n\nHand written.\n")?;

	common::dm_cmd()
		.arg("create-lore")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Created 1 lore file(s), 1 already existed.",
		));
	assert_eq!(std::fs::read_to_string(&pay)?, "# Payments\n\nHand written.\n");

	common::dm_cmd()
		.args(["create-lore", "--overwrite", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Created 2 lore file(s), 0 already existed.",
		));
	assert!(std::fs::read_to_string(&pay)?.contains("[PLEASE FILL OUT"));

	Ok(())
}

#[test]
fn creates_a_single_lore_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;

	common::dm_cmd()
		.args(["create-lore", "api/pay.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created .lore/api/pay.md"));

	let pay = std::fs::read_to_string(tmp.path().join(".lore/api/pay.md"))?;
	assert!(pay.contains("_This documentation is linked to src/pay.py, src/refund.py_"));
	assert!(!tmp.path().join(".lore/frontend/app.md").exists());

	common::dm_cmd()
		.args(["create-lore", "api/pay.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Lore file already exists: .lore/api/pay.md",
		));

	Ok(())
}

#[test]
fn unreferenced_lore_file_lists_no_sources() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["create-lore", "notes/design.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success();

	let design = std::fs::read_to_string(tmp.path().join(".lore/notes/design.md"))?;
	assert!(design.contains("_This documentation is linked to no files yet_"));

	Ok(())
}

#[test]
fn uses_custom_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_sources(tmp.path())?;
	let template = tmp.path().join("lore-template.md");
	std::fs::write(&template, "# {filename}\n\nSources: {tracked_files}\n")?;
	let config = serde_json::json!({ "customTemplatePath": template });
	std::fs::write(tmp.path().join("dmconfig.json"), config.to_string())?;

	common::dm_cmd()
		.args(["create-lore", "api/pay.md", "--path"])
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join(".lore/api/pay.md"))?,
		"# pay\n\nSources: src/pay.py, src/refund.py\n"
	);

	Ok(())
}

#[test]
fn nothing_to_create_without_markers() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.arg("create-lore")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"No track_lore markers found. Nothing to create.",
		));

	assert!(!tmp.path().join(".lore").exists());

	Ok(())
}

#[test]
fn rejects_blank_lore_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["create-lore", "  ", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("cannot be empty"));

	Ok(())
}

#[test]
fn rejects_lore_path_outside_lore_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::dm_cmd()
		.args(["create-lore", "../escape.md", "--path"])
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("must stay inside"));

	assert!(!tmp.path().join("escape.md").exists());

	Ok(())
}

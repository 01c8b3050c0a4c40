use std::collections::BTreeMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::DmError;
use crate::DmResult;
use crate::config::DmConfig;
use crate::lexer::TemplateSegment;
use crate::lexer::tokenize_template;
use crate::project::LoreMapping;

/// Prefix shared by every unfilled section marker.
pub const PLACEHOLDER_MARKER: &str = "[PLEASE FILL OUT";

/// Substituted for `{tracked_files}` when no sources are known yet.
pub const NO_FILES_YET: &str = "no files yet";

/// The built-in lore file template.
///
/// Only `{filename}` and `{tracked_files}` are substituted. Every section
/// carries a `[PLEASE FILL OUT: <section>]` marker so an untouched file is
/// recognized as a template.
pub const DEFAULT_TEMPLATE: &str = r"# Documentation for {filename}

## Overview

[PLEASE FILL OUT: Overview]

## Dependencies

[PLEASE FILL OUT: Dependencies]

## Key Functions/Components

[PLEASE FILL OUT: Functions/Components]

## Usage Examples

[PLEASE FILL OUT: Examples]

## Diagrams

[PLEASE FILL OUT: Diagrams]

### Sequence Diagram

```mermaid
sequenceDiagram
    participant Caller
    participant Component
    Caller->>Component: [PLEASE FILL OUT: Sequence Diagram]
```

### Architecture Diagram

```mermaid
graph TD
    A[PLEASE FILL OUT: Architecture Diagram] --> B[Component]
```

## Notes

[PLEASE FILL OUT: Notes]

---

_This documentation is linked to {tracked_files}_
";

/// The built-in template.
pub fn default_template() -> &'static str {
	DEFAULT_TEMPLATE
}

/// Read a user supplied template.
pub fn load_custom_template(path: &Path) -> DmResult<String> {
	if !path.is_file() {
		return Err(DmError::TemplateNotFound(path.display().to_string()));
	}

	let template_read = |reason: String| {
		DmError::TemplateRead {
			path: path.display().to_string(),
			reason,
		}
	};
	let bytes = std::fs::read(path).map_err(|e| template_read(e.to_string()))?;
	String::from_utf8(bytes).map_err(|e| template_read(e.to_string()))
}

/// The template configured by `config`: the custom template when
/// `customTemplatePath` is set, the built-in one otherwise.
pub fn template_content(config: &DmConfig) -> DmResult<String> {
	match &config.custom_template_path {
		Some(path) if !path.as_os_str().is_empty() => load_custom_template(path),
		_ => Ok(DEFAULT_TEMPLATE.to_string()),
	}
}

/// Names of the placeholders in `template`, in order of first appearance.
pub fn template_placeholders(template: &str) -> Vec<String> {
	let mut names: Vec<String> = Vec::new();
	for segment in tokenize_template(template) {
		let TemplateSegment::Placeholder(name) = segment else {
			continue;
		};
		if !names.iter().any(|existing| existing == name) {
			names.push(name.to_string());
		}
	}
	names
}

fn render_tracked_files(tracked_files: Option<&[String]>) -> String {
	match tracked_files {
		Some(files) if !files.is_empty() => files.join(", "),
		_ => NO_FILES_YET.to_string(),
	}
}

/// Substitute `{filename}`, `{tracked_files}` and any `custom_vars` into
/// `template`.
///
/// `custom_vars` take precedence over the built-in values. `{{` and `}}`
/// produce literal braces. A placeholder with no value fails with
/// [`DmError::UndefinedPlaceholder`].
pub fn populate_template(
	template: &str,
	filename: &str,
	tracked_files: Option<&[String]>,
	custom_vars: Option<&BTreeMap<String, String>>,
) -> DmResult<String> {
	let tracked = render_tracked_files(tracked_files);
	let mut values: BTreeMap<&str, &str> =
		BTreeMap::from([("filename", filename), ("tracked_files", tracked.as_str())]);
	if let Some(custom_vars) = custom_vars {
		values.extend(
			custom_vars
				.iter()
				.map(|(name, value)| (name.as_str(), value.as_str())),
		);
	}

	let mut output = String::with_capacity(template.len());
	for segment in tokenize_template(template) {
		match segment {
			TemplateSegment::Literal(text) => output.push_str(text),
			TemplateSegment::Placeholder(name) => {
				let Some(value) = values.get(name) else {
					return Err(DmError::UndefinedPlaceholder(name.to_string()));
				};
				output.push_str(value);
			}
		}
	}

	Ok(output)
}

/// Resolve `lore_path` beneath `lore_root`, rejecting blank paths and paths
/// that would leave the lore directory. A leading `/` is relative to
/// `lore_root`.
pub fn lore_file_path(lore_root: &Path, lore_path: &str) -> DmResult<PathBuf> {
	let invalid = |reason: &str| {
		DmError::InvalidLorePath {
			path: lore_path.to_string(),
			reason: reason.to_string(),
		}
	};

	let trimmed = lore_path.trim();
	if trimmed.is_empty() {
		return Err(invalid("cannot be empty"));
	}

	let relative = Path::new(trimmed.trim_start_matches(['/', '\\']));
	if relative
		.components()
		.any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
	{
		return Err(invalid("must stay inside the lore directory"));
	}
	if relative.file_stem().is_none() {
		return Err(invalid("must name a file"));
	}

	Ok(lore_root.join(relative))
}

/// How [`create_lore_file`] renders and writes a lore file.
#[derive(Debug, Clone, Copy)]
pub struct CreateLoreOptions<'a> {
	/// Sources listed in the `{tracked_files}` placeholder.
	pub tracked_files: &'a [String],
	pub template: &'a str,
	/// Replace a lore file that already exists.
	pub overwrite: bool,
}

impl Default for CreateLoreOptions<'_> {
	fn default() -> Self {
		Self {
			tracked_files: &[],
			template: DEFAULT_TEMPLATE,
			overwrite: false,
		}
	}
}

/// Create the lore file `lore_path` under `lore_root`.
///
/// Parent directories are created as needed. Returns `Ok(false)` without
/// touching the file when it exists and `overwrite` is off.
pub fn create_lore_file(
	lore_root: &Path,
	lore_path: &str,
	options: &CreateLoreOptions<'_>,
) -> DmResult<bool> {
	let target = lore_file_path(lore_root, lore_path)?;

	if target.exists() && !options.overwrite {
		tracing::debug!(path = %target.display(), "lore file exists, leaving it untouched");
		return Ok(false);
	}

	let filename = target
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_default();
	let content = populate_template(
		options.template,
		&filename,
		Some(options.tracked_files),
		None,
	)?;

	if let Some(parent) = target.parent() {
		std::fs::create_dir_all(parent).map_err(|e| DmError::from_io(e, parent))?;
	}
	std::fs::write(&target, content).map_err(|e| DmError::from_io(e, &target))?;
	tracing::info!(path = %target.display(), "created lore file");

	Ok(true)
}

/// Create one lore file per entry of `mapping`, each listing its sources.
///
/// Failures are recorded per path and never stop the remaining files.
pub fn create_lore_files(
	lore_root: &Path,
	mapping: &LoreMapping,
	template: &str,
	overwrite: bool,
) -> IndexMap<String, DmResult<bool>> {
	mapping
		.iter()
		.map(|(lore_path, sources)| {
			let options = CreateLoreOptions {
				tracked_files: sources,
				template,
				overwrite,
			};
			let result = create_lore_file(lore_root, lore_path, &options);
			if let Err(e) = &result {
				tracing::warn!(path = %lore_path, error = %e, "failed to create lore file");
			}
			(lore_path.clone(), result)
		})
		.collect()
}

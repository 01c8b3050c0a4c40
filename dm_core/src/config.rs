use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::DmError;
use crate::DmResult;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dmconfig.json";

/// Default lore directory, relative to the repository root.
pub const DEFAULT_LORE_DIRECTORY: &str = ".lore";

/// Default minimum number of characters a section needs to count as filled.
pub const DEFAULT_MIN_SECTION_LENGTH: u64 = 10;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Upper bound accepted for `maxFileSize` (1 GiB).
pub const MAX_FILE_SIZE_LIMIT: u64 = 1024 * 1024 * 1024;

/// Keys that must be present in every configuration.
pub const REQUIRED_KEYS: [&str; 3] = ["loreDirectory", "enforceDocumentation", "requiredSections"];

const BOOLEAN_KEYS: [&str; 5] = [
	"enforceDocumentation",
	"validateOnCommit",
	"requireDiagrams",
	"verboseOutput",
	"colorOutput",
];
const INTEGER_KEYS: [&str; 2] = ["minSectionLength", "maxFileSize"];
const LIST_KEYS: [&str; 3] = [
	"requiredSections",
	"excludedDirectories",
	"excludedFilePatterns",
];
const STRING_KEYS: [&str; 3] = ["version", "loreDirectory", "encoding"];

/// Configuration loaded from `dmconfig.json`.
///
/// ```json
/// {
///   "loreDirectory": ".lore",
///   "enforceDocumentation": true,
///   "requireDiagrams": true,
///   "minSectionLength": 10,
///   "requiredSections": ["Overview", "Dependencies"],
///   "excludedDirectories": ["vendor"],
///   "excludedFilePatterns": ["*.generated.ts"],
///   "customTemplatePath": "docs/lore-template.md"
/// }
/// ```
///
/// Keys missing from the file fall back to [`DmConfig::default`]. Keys this
/// crate does not know about are kept in [`DmConfig::extra`] and written back
/// on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DmConfig {
	pub version: String,
	/// Block commits when documentation is missing or incomplete.
	pub enforce_documentation: bool,
	pub validate_on_commit: bool,
	/// Root of the lore files, relative to the repository root.
	pub lore_directory: String,
	/// Template used instead of the built-in one when creating lore files.
	pub custom_template_path: Option<PathBuf>,
	/// Require at least one fenced diagram block per lore file.
	pub require_diagrams: bool,
	/// Minimum trimmed character count of a filled section.
	pub min_section_length: u64,
	/// Files larger than this many bytes are not scanned.
	pub max_file_size: u64,
	pub verbose_output: bool,
	pub color_output: bool,
	pub encoding: String,
	/// Section names every lore file must fill in.
	pub required_sections: Vec<String>,
	/// Directory names (or root relative paths) never scanned.
	pub excluded_directories: Vec<String>,
	/// Glob patterns matched against file names and root relative paths.
	pub excluded_file_patterns: Vec<String>,
	/// Unrecognized keys, preserved as-is.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Default for DmConfig {
	fn default() -> Self {
		Self {
			version: "1.0.0".to_string(),
			enforce_documentation: true,
			validate_on_commit: true,
			lore_directory: DEFAULT_LORE_DIRECTORY.to_string(),
			custom_template_path: None,
			require_diagrams: true,
			min_section_length: DEFAULT_MIN_SECTION_LENGTH,
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			verbose_output: false,
			color_output: true,
			encoding: "utf-8".to_string(),
			required_sections: to_strings(&[
				"Overview",
				"Dependencies",
				"Functions/Components",
				"Examples",
				"Diagrams",
			]),
			excluded_directories: to_strings(&[
				".git",
				"node_modules",
				"__pycache__",
				".venv",
				"venv",
				"build",
				"dist",
				"examples",
				"tests",
			]),
			excluded_file_patterns: to_strings(&["*.pyc", "*.pyo", "*.min.js", "*.d.ts"]),
			extra: Map::new(),
		}
	}
}

fn to_strings(values: &[&str]) -> Vec<String> {
	values.iter().map(ToString::to_string).collect()
}

/// Command-line style overrides layered on top of a loaded configuration.
/// `None` leaves the configured value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
	pub lore_directory: Option<String>,
	pub verbose: Option<bool>,
	pub min_section_length: Option<u64>,
	/// Inverted into `colorOutput`.
	pub no_color: Option<bool>,
	pub custom_template_path: Option<PathBuf>,
	pub require_diagrams: Option<bool>,
}

/// Return `custom` when provided, otherwise the default `dmconfig.json`.
pub fn config_path(custom: Option<&Path>) -> PathBuf {
	custom.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf)
}

impl DmConfig {
	/// Load the configuration at `path`, merged over the defaults and
	/// validated. A missing file yields the defaults.
	pub fn load(path: &Path) -> DmResult<Self> {
		let raw = load_config_map(path)?;
		let errors = validate_config(&raw);
		if !errors.is_empty() {
			return Err(DmError::InvalidConfiguration(errors));
		}

		serde_json::from_value(Value::Object(raw)).map_err(|e| DmError::ConfigParse(e.to_string()))
	}

	/// Write the configuration to `path` as pretty JSON, creating parent
	/// directories. Null values and empty lists are omitted.
	pub fn save(&self, path: &Path) -> DmResult<()> {
		save_config_map(self.to_map()?, path)
	}

	/// Run [`validate_config`] against this configuration.
	pub fn validate(&self) -> Vec<String> {
		match self.to_map() {
			Ok(map) => validate_config(&map),
			Err(e) => vec![e.to_string()],
		}
	}

	/// Look up a setting by its on-disk (camelCase) key.
	pub fn setting(&self, key: &str) -> Option<Value> {
		self.to_map()
			.ok()?
			.remove(key)
			.filter(|value| !value.is_null())
	}

	/// The lore directory resolved against `root`.
	pub fn lore_root(&self, root: &Path) -> PathBuf {
		root.join(&self.lore_directory)
	}

	/// Apply `overrides` and return the result, leaving `self` untouched.
	#[must_use]
	pub fn merge_with_overrides(&self, overrides: &ConfigOverrides) -> Self {
		let mut merged = self.clone();

		if let Some(lore_directory) = &overrides.lore_directory {
			merged.lore_directory.clone_from(lore_directory);
		}
		if let Some(verbose) = overrides.verbose {
			merged.verbose_output = verbose;
		}
		if let Some(min_section_length) = overrides.min_section_length {
			merged.min_section_length = min_section_length;
		}
		if let Some(no_color) = overrides.no_color {
			merged.color_output = !no_color;
		}
		if let Some(path) = &overrides.custom_template_path {
			merged.custom_template_path = Some(path.clone());
		}
		if let Some(require_diagrams) = overrides.require_diagrams {
			merged.require_diagrams = require_diagrams;
		}

		merged
	}

	fn to_map(&self) -> DmResult<Map<String, Value>> {
		match serde_json::to_value(self) {
			Ok(Value::Object(map)) => Ok(map),
			Ok(other) => Err(DmError::ConfigParse(format!(
				"configuration serialized to a non-object value: {other}"
			))),
			Err(e) => Err(DmError::ConfigParse(e.to_string())),
		}
	}
}

/// The default configuration as a JSON object.
pub fn default_config_map() -> Map<String, Value> {
	DmConfig::default().to_map().unwrap_or_default()
}

/// Read the configuration file at `path` and merge it over the defaults
/// without validating. A missing file yields the defaults.
pub fn load_config_map(path: &Path) -> DmResult<Map<String, Value>> {
	let mut merged = default_config_map();

	if !path.exists() {
		tracing::debug!(path = %path.display(), "configuration file not found, using defaults");
		return Ok(merged);
	}

	let content = std::fs::read_to_string(path).map_err(|e| {
		DmError::ConfigRead {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;
	let value: Value = serde_json::from_str(&content).map_err(|e| {
		DmError::ConfigParse(format!("Invalid JSON in `{}`: {e}", path.display()))
	})?;
	let Value::Object(user) = value else {
		return Err(DmError::ConfigParse(format!(
			"`{}` must contain a JSON object",
			path.display()
		)));
	};

	tracing::info!(
		path = %path.display(),
		custom_settings = user.len(),
		"loading configuration"
	);
	merged.extend(user);

	Ok(merged)
}

fn save_config_map(mut map: Map<String, Value>, path: &Path) -> DmResult<()> {
	map.retain(|_, value| {
		!(value.is_null() || value.as_array().is_some_and(Vec::is_empty))
	});

	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent).map_err(|e| DmError::from_io(e, parent))?;
		}
	}

	let mut payload = serde_json::to_string_pretty(&Value::Object(map))
		.map_err(|e| DmError::ConfigParse(e.to_string()))?;
	payload.push('\n');
	std::fs::write(path, payload).map_err(|e| DmError::from_io(e, path))?;
	tracing::debug!(path = %path.display(), "saved configuration");

	Ok(())
}

/// Write the default configuration to `path` unless a file already exists.
/// Returns `true` when a file was created.
pub fn create_default_config(path: &Path) -> DmResult<bool> {
	if path.exists() {
		tracing::debug!(path = %path.display(), "configuration already exists");
		return Ok(false);
	}

	DmConfig::default().save(path)?;
	Ok(true)
}

/// Set `key` to `value` in the configuration file at `path`.
///
/// The updated configuration is validated before anything is written; on
/// failure the file is left untouched and every problem is returned.
pub fn update_setting(path: &Path, key: &str, value: Value) -> DmResult<()> {
	let mut raw = load_config_map(path)?;
	raw.insert(key.to_string(), value);

	let errors = validate_config(&raw);
	if !errors.is_empty() {
		return Err(DmError::InvalidConfiguration(errors));
	}

	save_config_map(raw, path)
}

/// Check a raw configuration object and collect every problem found.
/// An empty list means the configuration is valid.
pub fn validate_config(config: &Map<String, Value>) -> Vec<String> {
	let mut errors = Vec::new();

	for key in REQUIRED_KEYS {
		if !config.contains_key(key) {
			errors.push(format!("Missing required key: {key}"));
		}
	}

	for key in BOOLEAN_KEYS {
		if config.get(key).is_some_and(|value| !value.is_boolean()) {
			errors.push(format!("{key} must be a boolean"));
		}
	}

	for key in INTEGER_KEYS {
		if config
			.get(key)
			.is_some_and(|value| !(value.is_i64() || value.is_u64()))
		{
			errors.push(format!("{key} must be an integer"));
		}
	}

	for key in LIST_KEYS {
		match config.get(key) {
			None => {}
			Some(Value::Array(items)) => {
				if !items.iter().all(Value::is_string) {
					errors.push(format!("{key} must be a list of strings"));
				}
			}
			Some(_) => errors.push(format!("{key} must be a list")),
		}
	}

	for key in STRING_KEYS {
		if config.get(key).is_some_and(|value| !value.is_string()) {
			errors.push(format!("{key} must be a string"));
		}
	}

	if let Some(min) = config.get("minSectionLength").and_then(Value::as_i64) {
		if min < 0 {
			errors.push(format!("minSectionLength must be >= 0, got {min}"));
		}
	}

	if let Some(value) = config.get("maxFileSize") {
		if let Some(size) = value.as_u64() {
			if size == 0 || size > MAX_FILE_SIZE_LIMIT {
				errors.push(format!(
					"maxFileSize must be between 1 and {MAX_FILE_SIZE_LIMIT} bytes, got {size}"
				));
			}
		} else if let Some(size) = value.as_i64() {
			errors.push(format!(
				"maxFileSize must be between 1 and {MAX_FILE_SIZE_LIMIT} bytes, got {size}"
			));
		}
	}

	if let Some(Value::String(dir)) = config.get("loreDirectory") {
		if dir.trim().is_empty() {
			errors.push("loreDirectory must not be empty".to_string());
		}
	}

	if let Some(Value::String(encoding)) = config.get("encoding") {
		let normalized = encoding.to_ascii_lowercase().replace('_', "-");
		if normalized != "utf-8" && normalized != "utf8" {
			errors.push(format!(
				"encoding `{encoding}` is not supported, only utf-8 is"
			));
		}
	}

	match config.get("customTemplatePath") {
		None | Some(Value::Null) => {}
		Some(Value::String(path)) if path.is_empty() => {}
		Some(Value::String(path)) => {
			let template = Path::new(path);
			if !template.is_file() {
				errors.push(format!("Custom template file not found: {path}"));
			} else if std::fs::File::open(template).is_err() {
				errors.push(format!("Custom template file is not readable: {path}"));
			}
		}
		Some(_) => errors.push("customTemplatePath must be a string".to_string()),
	}

	if let Some(Value::Array(patterns)) = config.get("excludedFilePatterns") {
		for pattern in patterns.iter().filter_map(Value::as_str) {
			if let Err(e) = Glob::new(pattern) {
				errors.push(format!("Invalid file pattern `{pattern}`: {e}"));
			}
		}
	}

	errors
}

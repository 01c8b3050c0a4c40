use std::io;
use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DmError {
	#[error(transparent)]
	#[diagnostic(code(dm::io_error))]
	Io(#[from] io::Error),

	#[error("file not found: `{0}`")]
	#[diagnostic(code(dm::file_not_found))]
	FileNotFound(String),

	#[error("permission denied: `{0}`")]
	#[diagnostic(
		code(dm::permission_denied),
		help("check the file permissions or exclude this path")
	)]
	PermissionDenied(String),

	#[error("file is not valid UTF-8 text: `{0}`")]
	#[diagnostic(code(dm::invalid_encoding))]
	InvalidEncoding(String),

	#[error("Unsupported file type `{extension}` for `{path}`")]
	#[diagnostic(
		code(dm::unsupported_file_type),
		help("supported extensions: .py, .pyi, .pyx, .ts, .tsx, .js, .jsx, .mjs, .cjs, .mts, .cts")
	)]
	UnsupportedFileType { path: String, extension: String },

	#[error("Custom template file not found: `{0}`")]
	#[diagnostic(
		code(dm::template_not_found),
		help("fix `customTemplatePath` in dmconfig.json or remove it to use the default template")
	)]
	TemplateNotFound(String),

	#[error("Error reading custom template `{path}`: {reason}")]
	#[diagnostic(code(dm::template_read))]
	TemplateRead { path: String, reason: String },

	#[error("template contains undefined placeholder: `{{{0}}}`")]
	#[diagnostic(
		code(dm::undefined_placeholder),
		help("supply a value for `{0}` or escape literal braces as `{{{{` and `}}}}`")
	)]
	UndefinedPlaceholder(String),

	#[error("invalid lore path `{path}`: {reason}")]
	#[diagnostic(code(dm::invalid_lore_path))]
	InvalidLorePath { path: String, reason: String },

	#[error("failed to parse configuration: {0}")]
	#[diagnostic(
		code(dm::config_parse),
		help("dmconfig.json must contain a single JSON object")
	)]
	ConfigParse(String),

	#[error("Error reading configuration file `{path}`: {reason}")]
	#[diagnostic(code(dm::config_read))]
	ConfigRead { path: String, reason: String },

	#[error("Invalid configuration values:\n  - {}", .0.join("\n  - "))]
	#[diagnostic(code(dm::invalid_configuration))]
	InvalidConfiguration(Vec<String>),

	#[error("failure to parse markdown: {0}")]
	#[diagnostic(code(dm::markdown))]
	Markdown(String),
}

impl DmError {
	/// Classify an I/O failure on `path` into the matching error kind.
	pub fn from_io(error: io::Error, path: &Path) -> Self {
		let display = path.display().to_string();
		match error.kind() {
			io::ErrorKind::NotFound => Self::FileNotFound(display),
			io::ErrorKind::PermissionDenied => Self::PermissionDenied(display),
			io::ErrorKind::InvalidData => Self::InvalidEncoding(display),
			_ => Self::Io(error),
		}
	}
}

/// Read a whole file as UTF-8 text, mapping failures onto [`DmError`]
/// variants.
pub fn read_text(path: &Path) -> DmResult<String> {
	std::fs::read_to_string(path).map_err(|e| DmError::from_io(e, path))
}

pub type DmResult<T> = Result<T, DmError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

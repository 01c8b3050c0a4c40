use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// A family of source languages sharing the same line comment syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum LanguageFamily {
	/// Python sources, which use `#` line comments.
	Python,
	/// TypeScript and JavaScript sources, which use `//` line comments.
	TypeScript,
}

/// Registered extensions, lowercase and including the leading dot.
const EXTENSIONS: &[(&str, LanguageFamily)] = &[
	(".py", LanguageFamily::Python),
	(".pyi", LanguageFamily::Python),
	(".pyx", LanguageFamily::Python),
	(".ts", LanguageFamily::TypeScript),
	(".tsx", LanguageFamily::TypeScript),
	(".js", LanguageFamily::TypeScript),
	(".jsx", LanguageFamily::TypeScript),
	(".mjs", LanguageFamily::TypeScript),
	(".cjs", LanguageFamily::TypeScript),
	(".mts", LanguageFamily::TypeScript),
	(".cts", LanguageFamily::TypeScript),
];

impl LanguageFamily {
	/// Resolve the family from a normalized extension such as `.py`.
	pub fn from_extension(extension: &str) -> Option<Self> {
		EXTENSIONS
			.iter()
			.find(|(ext, _)| *ext == extension)
			.map(|(_, family)| *family)
	}

	/// Resolve the family of the file at `path` from its extension.
	pub fn from_path(path: &Path) -> Option<Self> {
		Self::from_extension(&file_extension(path))
	}

	/// The line comment introducer for this family.
	pub fn comment_prefix(self) -> &'static str {
		match self {
			Self::Python => "#",
			Self::TypeScript => "//",
		}
	}

	/// All extensions registered for this family.
	pub fn extensions(self) -> impl Iterator<Item = &'static str> {
		EXTENSIONS
			.iter()
			.filter(move |(_, family)| *family == self)
			.map(|(ext, _)| *ext)
	}
}

impl fmt::Display for LanguageFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Python => f.write_str("python"),
			Self::TypeScript => f.write_str("typescript"),
		}
	}
}

/// Return the lowercase extension of `path` including the leading dot, or an
/// empty string when the file has none.
pub fn file_extension(path: &Path) -> String {
	path.extension()
		.map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
		.unwrap_or_default()
}

/// Check whether directives can be extracted from the file at `path`.
pub fn is_supported_file(path: &Path) -> bool {
	LanguageFamily::from_path(path).is_some()
}

use std::path::Path;

use crate::config::DEFAULT_LORE_DIRECTORY;

/// Directory names that never contain tracked sources: version control
/// metadata, dependency caches, virtual environments and build output.
pub const SKIPPED_DIRECTORIES: &[&str] = &[
	".git",
	".hg",
	".svn",
	"__pycache__",
	"node_modules",
	".venv",
	"venv",
	"build",
	"dist",
	"target",
	".tox",
	".mypy_cache",
	".pytest_cache",
	".ruff_cache",
	".idea",
	".vscode",
];

/// Decides which directories the repository walk descends into.
///
/// Hidden (dot-prefixed) directories are skipped, except for the lore
/// directory itself which must stay walkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPolicy {
	lore_directory_name: String,
}

impl Default for DirectoryPolicy {
	fn default() -> Self {
		Self::new(DEFAULT_LORE_DIRECTORY)
	}
}

impl DirectoryPolicy {
	/// Build a policy protecting the final component of `lore_directory`.
	pub fn new(lore_directory: impl AsRef<Path>) -> Self {
		let lore_directory = lore_directory.as_ref();
		let lore_directory_name = lore_directory
			.file_name()
			.map_or_else(
				|| lore_directory.to_string_lossy(),
				|name| name.to_string_lossy(),
			)
			.into_owned();

		Self {
			lore_directory_name,
		}
	}

	/// The protected directory name.
	pub fn lore_directory_name(&self) -> &str {
		&self.lore_directory_name
	}

	/// Returns `true` when a directory called `name` must not be traversed.
	pub fn should_skip(&self, name: &str) -> bool {
		if name == self.lore_directory_name {
			return false;
		}

		name.starts_with('.') || SKIPPED_DIRECTORIES.contains(&name)
	}
}

/// Check `name` against the default policy, which protects `.lore`.
pub fn should_skip_directory(name: &str) -> bool {
	DirectoryPolicy::default().should_skip(name)
}

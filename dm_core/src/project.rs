use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::DmError;
use crate::DmResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::DmConfig;
use crate::error::read_text;
use crate::language::LanguageFamily;
use crate::policy::DirectoryPolicy;
use crate::report::NullReporter;
use crate::report::Reporter;
use crate::report::ScanEvent;
use crate::report::SkipReason;
use crate::source_scanner::extract_lore_paths;
use crate::source_scanner::extract_lore_paths_from_str;

/// Options for controlling how a repository is scanned.
///
/// Use [`ScanOptions::default()`] for the built-in policy only or
/// [`ScanOptions::from_config`] to apply the exclusions of a [`DmConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Built-in directory pruning, protecting the lore directory.
	pub policy: DirectoryPolicy,
	/// Directory names or root relative directory paths to prune.
	pub excluded_directories: Vec<String>,
	/// Glob patterns matched against file names and root relative paths.
	pub exclude_set: GlobSet,
	/// Maximum file size to scan in bytes.
	pub max_file_size: u64,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			policy: DirectoryPolicy::default(),
			excluded_directories: Vec::new(),
			exclude_set: GlobSet::empty(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`DmConfig`].
	pub fn from_config(config: &DmConfig) -> Self {
		Self {
			policy: DirectoryPolicy::new(&config.lore_directory),
			excluded_directories: config.excluded_directories.clone(),
			exclude_set: build_glob_set(&config.excluded_file_patterns),
			max_file_size: config.max_file_size,
		}
	}

	/// Replace the excluded file patterns.
	#[must_use]
	pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Self {
		self.exclude_set = build_glob_set(patterns);
		self
	}

	/// Replace the excluded directory names.
	#[must_use]
	pub fn with_excluded_directories(mut self, directories: &[String]) -> Self {
		self.excluded_directories = directories.to_vec();
		self
	}

	fn is_excluded_directory(&self, name: &str, relative: &str) -> bool {
		self.excluded_directories
			.iter()
			.map(|entry| entry.trim_end_matches('/'))
			.any(|entry| entry == name || entry == relative)
	}

	fn is_excluded_file(&self, name: &str, relative: &str) -> bool {
		self.exclude_set.is_match(name) || self.exclude_set.is_match(relative)
	}
}

/// Build a `GlobSet` from a list of glob pattern strings. Invalid patterns
/// are ignored; configuration validation reports them.
fn build_glob_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		if let Ok(glob) = Glob::new(pattern) {
			builder.add(glob);
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Documentation paths mapped to the source files that reference them.
///
/// Keys keep the order in which they were first seen during the walk and each
/// list holds every source path at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct LoreMapping(IndexMap<String, Vec<String>>);

impl LoreMapping {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record that `source` references `lore_path`. Returns `false` when the
	/// pair was already present.
	pub fn insert(&mut self, lore_path: impl Into<String>, source: impl Into<String>) -> bool {
		let source = source.into();
		let sources = self.0.entry(lore_path.into()).or_default();
		if sources.contains(&source) {
			return false;
		}
		sources.push(source);
		true
	}

	/// Sources referencing `lore_path`, empty when it is unknown.
	pub fn sources_for(&self, lore_path: &str) -> &[String] {
		self.0.get(lore_path).map(Vec::as_slice).unwrap_or_default()
	}

	/// Documentation paths referenced by `source`, in mapping order.
	pub fn lore_paths_for(&self, source: &str) -> Vec<&str> {
		self.0
			.iter()
			.filter(|(_, sources)| sources.iter().any(|s| s == source))
			.map(|(lore_path, _)| lore_path.as_str())
			.collect()
	}

	/// Entries as ordered `(lore path, sources)` pairs.
	pub fn entries(&self) -> Vec<(&str, &[String])> {
		self.0
			.iter()
			.map(|(lore_path, sources)| (lore_path.as_str(), sources.as_slice()))
			.collect()
	}

	pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
		self.0
	}
}

impl FromIterator<(String, String)> for LoreMapping {
	fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
		let mut mapping = Self::new();
		for (lore_path, source) in iter {
			mapping.insert(lore_path, source);
		}
		mapping
	}
}

/// Normalize a path to a `/` separated string.
pub fn normalize_path(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}

fn relative_key(root: &Path, path: &Path) -> String {
	normalize_path(path.strip_prefix(root).unwrap_or(path))
}

/// Scan the repository at `root` and map every referenced documentation path
/// to the sources referencing it.
pub fn scan_repository(root: &Path, options: &ScanOptions) -> DmResult<LoreMapping> {
	scan_repository_with_reporter(root, options, &mut NullReporter)
}

/// Scan using the exclusions of `config`.
pub fn scan_repository_with_config(root: &Path, config: &DmConfig) -> DmResult<LoreMapping> {
	scan_repository(root, &ScanOptions::from_config(config))
}

/// Scan the repository at `root`, sending progress to `reporter`.
///
/// Files that cannot be read are left out of the mapping and reported as
/// [`ScanEvent::FileSkipped`]; they never abort the scan. Only a missing or
/// unreadable `root` is an error.
pub fn scan_repository_with_reporter(
	root: &Path,
	options: &ScanOptions,
	reporter: &mut dyn Reporter,
) -> DmResult<LoreMapping> {
	if !root.is_dir() {
		return Err(DmError::FileNotFound(root.display().to_string()));
	}

	let mut walker = Walker {
		root,
		options,
		reporter,
		mapping: LoreMapping::new(),
		visited_dirs: HashSet::new(),
		scanned_files: 0,
	};

	let entries = read_sorted_dir(root).map_err(|e| DmError::from_io(e, root))?;
	walker.mark_visited(root);
	walker.walk_entries(entries);

	let Walker {
		mapping,
		scanned_files,
		reporter,
		..
	} = walker;

	tracing::info!(
		root = %root.display(),
		files = scanned_files,
		lore_files = mapping.len(),
		"scanned repository"
	);
	reporter.report(ScanEvent::Finished {
		files: scanned_files,
		lore_files: mapping.len(),
	});

	Ok(mapping)
}

/// List the entries of `dir` sorted by file name so the walk order is
/// deterministic.
fn read_sorted_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
	let mut entries = std::fs::read_dir(dir)?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<std::io::Result<Vec<_>>>()?;
	entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
	Ok(entries)
}

struct Walker<'a, 'r> {
	root: &'a Path,
	options: &'a ScanOptions,
	reporter: &'a mut (dyn Reporter + 'r),
	mapping: LoreMapping,
	visited_dirs: HashSet<PathBuf>,
	scanned_files: usize,
}

impl Walker<'_, '_> {
	/// Returns `false` if the canonical form of `dir` was already visited.
	fn mark_visited(&mut self, dir: &Path) -> bool {
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		self.visited_dirs.insert(canonical)
	}

	fn prune(&mut self, relative: String, reason: SkipReason) {
		tracing::debug!(path = %relative, %reason, "pruned directory");
		self.reporter.report(ScanEvent::DirectoryPruned {
			path: relative,
			reason,
		});
	}

	fn skip(&mut self, relative: String, reason: SkipReason) {
		tracing::debug!(path = %relative, %reason, "skipped file");
		self.reporter.report(ScanEvent::FileSkipped {
			path: relative,
			reason,
		});
	}

	fn walk_entries(&mut self, entries: Vec<PathBuf>) {
		for path in entries {
			let name = path
				.file_name()
				.map(|name| name.to_string_lossy().into_owned())
				.unwrap_or_default();
			let relative = relative_key(self.root, &path);

			if path.is_dir() {
				self.walk_dir(&path, &name, relative);
			} else if path.is_file() {
				self.scan_file(&path, &name, relative);
			}
		}
	}

	fn walk_dir(&mut self, dir: &Path, name: &str, relative: String) {
		if self.options.policy.should_skip(name) {
			self.prune(relative, SkipReason::Policy);
			return;
		}

		if self.options.is_excluded_directory(name, &relative) {
			self.prune(relative, SkipReason::ExcludedDirectory);
			return;
		}

		if !self.mark_visited(dir) {
			self.prune(relative, SkipReason::SymlinkCycle);
			return;
		}

		match read_sorted_dir(dir) {
			Ok(entries) => self.walk_entries(entries),
			Err(e) => {
				self.prune(relative, SkipReason::Unreadable {
					reason: e.to_string(),
				});
			}
		}
	}

	fn scan_file(&mut self, path: &Path, name: &str, relative: String) {
		let Some(family) = LanguageFamily::from_path(path) else {
			return;
		};

		if self.options.is_excluded_file(name, &relative) {
			self.skip(relative, SkipReason::ExcludedPattern);
			return;
		}

		let size = match std::fs::metadata(path) {
			Ok(metadata) => metadata.len(),
			Err(e) => {
				self.skip(relative, SkipReason::Unreadable {
					reason: e.to_string(),
				});
				return;
			}
		};
		if size > self.options.max_file_size {
			let limit = self.options.max_file_size;
			self.skip(relative, SkipReason::TooLarge { size, limit });
			return;
		}

		let content = match read_text(path) {
			Ok(content) => content,
			Err(e) => {
				self.skip(relative, SkipReason::Unreadable {
					reason: e.to_string(),
				});
				return;
			}
		};

		let lore_paths = extract_lore_paths_from_str(&content, family);
		self.scanned_files += 1;
		self.reporter.report(ScanEvent::FileScanned {
			path: relative.clone(),
			directives: lore_paths.len(),
		});

		for lore_path in lore_paths {
			self.mapping.insert(normalize_lore_path(&lore_path), relative.clone());
		}
	}
}

/// Normalize a documentation path to `/` separators relative to the lore
/// directory, preserving case. `/api/pay.md` and `api\pay.md` both become
/// `api/pay.md`.
pub fn normalize_lore_path(lore_path: &str) -> String {
	lore_path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Find the source files that reference `lore_path` by scanning `root`.
pub fn find_sources_for(
	lore_path: &str,
	root: &Path,
	options: &ScanOptions,
) -> DmResult<Vec<String>> {
	let mapping = scan_repository(root, options)?;
	Ok(mapping.sources_for(&normalize_lore_path(lore_path)).to_vec())
}

/// Re-read `source` and return the documentation paths it references, in
/// file order. This always reflects the current file content.
pub fn find_lore_for(source: &Path) -> DmResult<Vec<String>> {
	Ok(extract_lore_paths(source)?
		.iter()
		.map(|lore_path| normalize_lore_path(lore_path))
		.collect())
}

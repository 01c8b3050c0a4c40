use std::fmt;

use serde::Serialize;

/// Why a file or directory was left out of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SkipReason {
	/// The directory matched the built-in directory policy.
	Policy,
	/// The directory is listed in `excludedDirectories`.
	ExcludedDirectory,
	/// The file matched one of `excludedFilePatterns`.
	ExcludedPattern,
	/// The file exceeds `maxFileSize`.
	TooLarge { size: u64, limit: u64 },
	/// The directory was already visited through a symlink.
	SymlinkCycle,
	/// Reading the entry failed.
	Unreadable { reason: String },
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Policy => f.write_str("skipped by directory policy"),
			Self::ExcludedDirectory => f.write_str("excluded directory"),
			Self::ExcludedPattern => f.write_str("matches an excluded file pattern"),
			Self::TooLarge { size, limit } => {
				write!(f, "file is {size} bytes (limit: {limit} bytes)")
			}
			Self::SymlinkCycle => f.write_str("symlink cycle"),
			Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
		}
	}
}

/// Something that happened during a repository scan. Paths are relative to
/// the scanned root with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ScanEvent {
	/// A directory was not descended into.
	DirectoryPruned { path: String, reason: SkipReason },
	/// A candidate file contributed nothing to the mapping.
	FileSkipped { path: String, reason: SkipReason },
	/// A file was scanned and yielded `directives` directives.
	FileScanned { path: String, directives: usize },
	/// The scan finished.
	Finished { files: usize, lore_files: usize },
}

/// Receives [`ScanEvent`]s from the scanner. Implemented by whatever renders
/// progress to the user.
pub trait Reporter {
	fn report(&mut self, event: ScanEvent);
}

/// A reporter that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
	fn report(&mut self, _event: ScanEvent) {}
}

/// A reporter that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
	pub events: Vec<ScanEvent>,
}

impl CollectingReporter {
	/// Paths of all skipped files, in the order they were reported.
	pub fn skipped_files(&self) -> Vec<&str> {
		self.events
			.iter()
			.filter_map(|event| {
				match event {
					ScanEvent::FileSkipped { path, .. } => Some(path.as_str()),
					_ => None,
				}
			})
			.collect()
	}
}

impl Reporter for CollectingReporter {
	fn report(&mut self, event: ScanEvent) {
		self.events.push(event);
	}
}

impl<F> Reporter for F
where
	F: FnMut(ScanEvent),
{
	fn report(&mut self, event: ScanEvent) {
		self(event);
	}
}

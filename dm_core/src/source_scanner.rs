use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::DmError;
use crate::DmResult;
use crate::error::read_text;
use crate::language::LanguageFamily;
use crate::language::file_extension;
use crate::lexer::RawToken;
use crate::lexer::SpannedToken;
use crate::lexer::tokenize;

/// The identifier that marks a documentation association.
pub const DIRECTIVE_NAME: &str = "track_lore";

/// A `track_lore("...")` occurrence found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
	/// The referenced documentation path, trimmed.
	pub lore_path: String,
	/// 1-indexed line of the comment introducer.
	pub line: usize,
	/// 1-indexed column of the comment introducer.
	pub column: usize,
}

/// Pre-computed table of line-start byte offsets for efficient offset to
/// line/column conversion.
struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// Convert a byte offset to a 1-indexed `(line, column)` pair.
	fn line_column(&self, offset: usize) -> (usize, usize) {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};
		(line_idx + 1, offset - self.line_starts[line_idx] + 1)
	}
}

/// Walks the token stream of one file looking for directives.
struct DirectiveWalker<'a> {
	source: &'a str,
	tokens: Vec<SpannedToken>,
	cursor: usize,
	introducer: RawToken,
}

impl<'a> DirectiveWalker<'a> {
	fn new(source: &'a str, family: LanguageFamily) -> Self {
		let (introducer, template_literals) = match family {
			LanguageFamily::Python => (RawToken::Hash, false),
			LanguageFamily::TypeScript => (RawToken::SlashComment, true),
		};

		Self {
			source,
			tokens: tokenize(source, template_literals),
			cursor: 0,
			introducer,
		}
	}

	fn peek(&self) -> Option<RawToken> {
		self.tokens.get(self.cursor).and_then(|(token, _)| *token)
	}

	fn skip_whitespace(&mut self) {
		while self.peek() == Some(RawToken::Whitespace) {
			self.cursor += 1;
		}
	}

	fn slice(&self, index: usize) -> &'a str {
		let source = self.source;
		&source[self.tokens[index].1.clone()]
	}

	/// Try to read `track_lore ( "path" )` starting at the cursor. Returns the
	/// raw string body on success. The cursor always advances past whatever
	/// was consumed so malformed occurrences are skipped.
	fn directive_body(&mut self) -> Option<&'a str> {
		self.skip_whitespace();
		if self.peek() != Some(RawToken::Ident) || self.slice(self.cursor) != DIRECTIVE_NAME {
			return None;
		}
		self.cursor += 1;
		self.skip_whitespace();

		if self.peek() != Some(RawToken::ParenOpen) {
			return None;
		}
		self.cursor += 1;
		self.skip_whitespace();

		if !self.peek().is_some_and(RawToken::is_string) {
			return None;
		}
		let literal = self.slice(self.cursor);
		self.cursor += 1;
		self.skip_whitespace();

		if self.peek() != Some(RawToken::ParenClose) {
			return None;
		}
		self.cursor += 1;

		Some(&literal[1..literal.len() - 1])
	}

	fn collect(mut self) -> Vec<Directive> {
		let table = LineTable::new(self.source);
		let mut directives = Vec::new();

		while self.cursor < self.tokens.len() {
			if self.peek() != Some(self.introducer) {
				self.cursor += 1;
				continue;
			}

			let start = self.tokens[self.cursor].1.start;
			self.cursor += 1;

			let Some(body) = self.directive_body() else {
				continue;
			};
			let lore_path = body.trim();
			if lore_path.is_empty() {
				continue;
			}

			let (line, column) = table.line_column(start);
			directives.push(Directive {
				lore_path: lore_path.to_string(),
				line,
				column,
			});
		}

		directives
	}
}

/// Parse every directive in `content`, using the comment syntax of `family`.
/// Directives are returned in order of appearance; duplicates are kept.
pub fn parse_directives(content: &str, family: LanguageFamily) -> Vec<Directive> {
	DirectiveWalker::new(content, family).collect()
}

/// Extract the documentation paths referenced in `content`.
pub fn extract_lore_paths_from_str(content: &str, family: LanguageFamily) -> Vec<String> {
	parse_directives(content, family)
		.into_iter()
		.map(|directive| directive.lore_path)
		.collect()
}

/// Read the file at `path` and extract the documentation paths it references.
///
/// Fails with [`DmError::UnsupportedFileType`] when the extension is not
/// registered and with [`DmError::FileNotFound`] when the file is missing.
pub fn extract_lore_paths(path: &Path) -> DmResult<Vec<String>> {
	let Some(family) = LanguageFamily::from_path(path) else {
		return Err(DmError::UnsupportedFileType {
			path: path.display().to_string(),
			extension: file_extension(path),
		});
	};

	let content = read_text(path)?;
	Ok(extract_lore_paths_from_str(&content, family))
}

/// Lenient variant of [`extract_lore_paths`] used for bulk scanning. Any
/// failure yields an empty list.
pub fn extract_lore_paths_safe(path: &Path) -> Vec<String> {
	match extract_lore_paths(path) {
		Ok(paths) => paths,
		Err(error) => {
			tracing::debug!(path = %path.display(), %error, "skipping file during extraction");
			Vec::new()
		}
	}
}

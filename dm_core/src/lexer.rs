use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for a single pass over source text. Only the
/// shapes that can take part in a `track_lore("...")` directive are
/// recognized; everything else surfaces as a lexer error and is ignored by the
/// directive walker.
///
/// The lexer extras flag whether backticks open template literals, which is
/// only the case for the TypeScript family.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(extras = bool)]
pub(crate) enum RawToken {
	/// `#`, `##`, ... line comment introducer.
	#[regex(r"#+")]
	Hash,
	/// `//`, `///`, ... line comment introducer.
	#[regex(r"//+")]
	SlashComment,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	/// A double quoted string which must close on the same line.
	#[regex(r#""[^"\n]*""#)]
	DoubleQuotedString,
	/// A single quoted string which must close on the same line.
	#[regex(r"'[^'\n]*'")]
	SingleQuotedString,
	/// A backtick. With template literals enabled this spans the whole
	/// literal, which may cover several lines.
	#[token("`", template_literal)]
	Backtick,
}

/// Consume the rest of a template literal when template literals are enabled.
/// An unterminated literal runs to the end of the input.
fn template_literal(lexer: &mut logos::Lexer<'_, RawToken>) {
	if !lexer.extras {
		return;
	}

	let remainder = lexer.remainder().as_bytes();
	let mut end = remainder.len();
	let mut index = 0;
	while index < remainder.len() {
		match remainder[index] {
			b'\\' => index += 2,
			b'`' => {
				end = index + 1;
				break;
			}
			_ => index += 1,
		}
	}
	lexer.bump(end);
}

impl RawToken {
	pub(crate) fn is_string(self) -> bool {
		matches!(self, Self::DoubleQuotedString | Self::SingleQuotedString)
	}
}

/// A token with the byte range it covers. `None` marks text the lexer could
/// not classify.
pub(crate) type SpannedToken = (Option<RawToken>, Range<usize>);

/// Tokenize source text for directive extraction. `template_literals`
/// enables backtick strings.
pub(crate) fn tokenize(source: &str, template_literals: bool) -> Vec<SpannedToken> {
	RawToken::lexer_with_extras(source, template_literals)
		.spanned()
		.map(|(token, span)| (token.ok(), span))
		.collect()
}

/// Tokens of a documentation template.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateToken {
	/// `{{`, rendered as a literal `{`.
	#[token("{{")]
	EscapedOpen,
	/// `}}`, rendered as a literal `}`.
	#[token("}}")]
	EscapedClose,
	/// `{name}` placeholder.
	#[regex(r"\{[a-zA-Z_][a-zA-Z0-9_]*\}")]
	Placeholder,
	/// A brace that does not start a placeholder or an escape.
	#[token("{")]
	#[token("}")]
	LoneBrace,
	#[regex(r"[^{}]+")]
	Text,
}

/// A piece of a template after tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateSegment<'a> {
	/// Text copied to the output unchanged.
	Literal(&'a str),
	/// A placeholder name without the surrounding braces.
	Placeholder(&'a str),
}

/// Split a template into literal and placeholder segments.
pub(crate) fn tokenize_template(template: &str) -> Vec<TemplateSegment<'_>> {
	let mut lexer = TemplateToken::lexer(template);
	let mut segments = Vec::new();

	while let Some(token) = lexer.next() {
		let slice = lexer.slice();
		let segment = match token {
			Ok(TemplateToken::EscapedOpen) => TemplateSegment::Literal("{"),
			Ok(TemplateToken::EscapedClose) => TemplateSegment::Literal("}"),
			Ok(TemplateToken::Placeholder) => {
				TemplateSegment::Placeholder(&slice[1..slice.len() - 1])
			}
			Ok(TemplateToken::LoneBrace | TemplateToken::Text) | Err(()) => {
				TemplateSegment::Literal(slice)
			}
		};
		segments.push(segment);
	}

	segments
}

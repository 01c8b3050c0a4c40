use std::path::Path;

use indexmap::IndexMap;
use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use serde::Serialize;

use crate::DmError;
use crate::DmResult;
use crate::config::DEFAULT_MIN_SECTION_LENGTH;
use crate::config::DmConfig;
use crate::error::read_text;
use crate::template::PLACEHOLDER_MARKER;

/// Fenced code block languages that count as a diagram.
pub const DIAGRAM_LANGUAGES: &[&str] = &["mermaid", "plantuml", "puml", "dot", "graphviz"];

/// Section reported missing when diagrams are required but absent.
pub const DIAGRAMS_SECTION: &str = "Diagrams";

/// What a lore file has to contain to be considered complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
	/// Section names matched case-insensitively against heading text.
	pub required_sections: Vec<String>,
	/// Minimum trimmed character count of a filled section.
	pub min_section_length: usize,
	/// Require at least one fenced diagram block.
	pub require_diagrams: bool,
}

impl Default for ValidationOptions {
	fn default() -> Self {
		Self::from_config(&DmConfig::default())
	}
}

impl ValidationOptions {
	pub fn from_config(config: &DmConfig) -> Self {
		Self {
			required_sections: config.required_sections.clone(),
			min_section_length: usize::try_from(config.min_section_length)
				.unwrap_or(DEFAULT_MIN_SECTION_LENGTH as usize),
			require_diagrams: config.require_diagrams,
		}
	}
}

/// The verdict for one lore file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
	/// The file still contains a `[PLEASE FILL OUT` marker.
	pub is_template: bool,
	/// Required sections that are absent or unfilled, in required order.
	pub missing_sections: Vec<String>,
	pub is_valid: bool,
}

/// A top level heading and the byte range of the content it owns.
#[derive(Debug)]
struct Section {
	depth: u8,
	title: String,
	content_start: usize,
	content_end: usize,
}

fn parse_markdown(content: &str) -> DmResult<Node> {
	let options = ParseOptions::gfm();
	to_mdast(content, &options).map_err(|e| DmError::Markdown(e.to_string()))
}

/// Concatenated text of every inline descendant of `node`.
fn collect_text(node: &Node, text: &mut String) {
	match node {
		Node::Text(value) => text.push_str(&value.value),
		Node::InlineCode(value) => text.push_str(&value.value),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_text(child, text);
				}
			}
		}
	}
}

/// Split the document into sections. A section runs from the end of its
/// heading to the next heading of the same or higher level.
fn collect_sections(root: &Node, content_len: usize) -> Vec<Section> {
	let headings: Vec<(u8, String, usize, usize)> = root
		.children()
		.into_iter()
		.flatten()
		.filter_map(|node| {
			let Node::Heading(heading) = node else {
				return None;
			};
			let position = heading.position.as_ref()?;
			let mut title = String::new();
			collect_text(node, &mut title);
			Some((
				heading.depth,
				title,
				position.start.offset,
				position.end.offset,
			))
		})
		.collect();

	headings
		.iter()
		.enumerate()
		.map(|(index, (depth, title, _, end))| {
			let content_end = headings[index + 1..]
				.iter()
				.find(|(next_depth, ..)| next_depth <= depth)
				.map_or(content_len, |(_, _, start, _)| *start);

			Section {
				depth: *depth,
				title: title.clone(),
				content_start: *end,
				content_end,
			}
		})
		.collect()
}

fn contains_diagram(node: &Node) -> bool {
	match node {
		Node::Code(code) => {
			code.lang.as_deref().is_some_and(|lang| {
				DIAGRAM_LANGUAGES
					.iter()
					.any(|diagram| diagram.eq_ignore_ascii_case(lang))
			})
		}
		_ => node.children().is_some_and(|children| children.iter().any(contains_diagram)),
	}
}

fn is_section_filled(body: &str, min_section_length: usize) -> bool {
	!body.contains(PLACEHOLDER_MARKER) && body.trim().chars().count() >= min_section_length
}

/// The section for lowercase `needle`. Subsection headings win over
/// top level ones so the document title never shadows a real section; among
/// them the shallowest match comes first.
fn find_section<'s>(sections: &'s [Section], needle: &str) -> Option<&'s Section> {
	let matches = |section: &&Section| section.title.to_lowercase().contains(needle);

	sections
		.iter()
		.filter(|section| section.depth > 1)
		.filter(matches)
		.min_by_key(|section| section.depth)
		.or_else(|| sections.iter().find(matches))
}

fn section_status_from_tree(
	content: &str,
	root: &Node,
	options: &ValidationOptions,
) -> IndexMap<String, bool> {
	let sections = collect_sections(root, content.len());

	options
		.required_sections
		.iter()
		.map(|name| {
			let needle = name.to_lowercase();
			let filled = find_section(&sections, &needle).is_some_and(|section| {
				tracing::trace!(section = %name, depth = section.depth, "found section heading");
				let body = content
					.get(section.content_start..section.content_end)
					.unwrap_or_default();
				is_section_filled(body, options.min_section_length)
			});
			(name.clone(), filled)
		})
		.collect()
}

/// Returns `true` while `content` still carries an unfilled placeholder.
pub fn is_template_content(content: &str) -> bool {
	content.contains(PLACEHOLDER_MARKER)
}

/// Whether each required section of `content` is filled, in required order.
///
/// A section matches the shallowest subheading whose text contains its
/// name, ignoring case, and falls back to a top level heading. Headings
/// inside fenced code are not headings.
pub fn section_status_from_str(
	content: &str,
	options: &ValidationOptions,
) -> DmResult<IndexMap<String, bool>> {
	let root = parse_markdown(content)?;
	Ok(section_status_from_tree(content, &root, options))
}

/// Validate already-read lore file text.
pub fn validate_lore_content(
	content: &str,
	options: &ValidationOptions,
) -> DmResult<ValidationResult> {
	let root = parse_markdown(content)?;
	let is_template = is_template_content(content);

	let mut missing_sections: Vec<String> = section_status_from_tree(content, &root, options)
		.into_iter()
		.filter_map(|(name, filled)| (!filled).then_some(name))
		.collect();

	if options.require_diagrams
		&& !contains_diagram(&root)
		&& !missing_sections.iter().any(|name| name == DIAGRAMS_SECTION)
	{
		missing_sections.push(DIAGRAMS_SECTION.to_string());
	}

	let is_valid = !is_template && missing_sections.is_empty();

	Ok(ValidationResult {
		is_template,
		missing_sections,
		is_valid,
	})
}

/// Check whether the lore file at `path` still contains placeholder text.
pub fn is_template_file(path: &Path) -> DmResult<bool> {
	Ok(is_template_content(&read_text(path)?))
}

pub fn section_status(
	path: &Path,
	options: &ValidationOptions,
) -> DmResult<IndexMap<String, bool>> {
	section_status_from_str(&read_text(path)?, options)
}

/// Validate the lore file at `path`.
pub fn validate_lore_file(path: &Path, options: &ValidationOptions) -> DmResult<ValidationResult> {
	let result = validate_lore_content(&read_text(path)?, options)?;
	tracing::debug!(
		path = %path.display(),
		is_valid = result.is_valid,
		missing = ?result.missing_sections,
		"validated lore file"
	);
	Ok(result)
}

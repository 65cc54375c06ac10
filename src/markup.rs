//! Formats, and the handful of text rules of Dradis' field-based textile.

use std::{path::Path, sync::LazyLock};

use clap::ValueEnum;
use regex::Regex;

/// Document formats the tool can produce. Only textile and markdown can be read back.
#[derive(Clone, Copy, Debug, Default, derive_more::Display, Eq, Hash, PartialEq, ValueEnum)]
pub enum Format {
	/// Dradis native markup
	#[default]
	#[display("textile")]
	Textile,
	/// GitHub flavored markdown
	#[value(alias = "md", alias = "gfm")]
	#[display("markdown")]
	Markdown,
	#[display("pdf")]
	Pdf,
	#[value(alias = "docx")]
	#[display("word")]
	Word,
}

impl Format {
	pub fn extension(self) -> &'static str {
		match self {
			Format::Textile => "textile",
			Format::Markdown => "md",
			Format::Pdf => "pdf",
			Format::Word => "docx",
		}
	}

	pub fn from_extension(ext: &str) -> Option<Self> {
		Self::value_variants().iter().copied().find(|f| f.extension().eq_ignore_ascii_case(ext))
	}

	/// Format of a file, judged by its extension.
	pub fn of_path(path: &Path) -> Option<Self> {
		path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
	}

	/// Parse a format name as written in the config file.
	pub fn from_name(name: &str) -> Option<Self> {
		<Self as ValueEnum>::from_str(name.trim(), true).ok()
	}

	/// Whether files in this format can be read and sent to Dradis.
	pub fn is_readable(self) -> bool {
		matches!(self, Format::Textile | Format::Markdown)
	}

	/// Binary formats are written by pandoc straight to a file.
	pub fn is_binary(self) -> bool {
		matches!(self, Format::Pdf | Format::Word)
	}

	/// Pandoc reader name. Bare URI autolinks and header ids get in the way when going back to textile.
	pub fn pandoc_reader(self) -> &'static str {
		match self {
			Format::Textile => "textile",
			Format::Markdown => "gfm-autolink_bare_uris-gfm_auto_identifiers",
			Format::Pdf => "pdf",
			Format::Word => "docx",
		}
	}

	pub fn pandoc_writer(self) -> &'static str {
		match self {
			Format::Textile => "textile",
			Format::Markdown => "gfm",
			Format::Pdf => "pdf",
			Format::Word => "docx",
		}
	}

	/// How an explicit line break inside a paragraph is written in this format.
	pub fn hard_break(self) -> &'static str {
		match self {
			Format::Markdown => "\\\n",
			_ => "\n",
		}
	}
}

static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\[Title\]#[\r\n]+([^\r\n]+)").expect("valid regex"));
static EVIDENCE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\[EvidenceID\]#[\r\n]+([^\r\n]+)").expect("valid regex"));
static EVIDENCE_ID_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n?#\[EvidenceID\]#[\r\n]+[^\r\n]+(\r?\n)?").expect("valid regex"));
static FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(#\[[^\]\r\n]*\]#)[\r\n]+([^\r\n]+)").expect("valid regex"));

/// Value of the `#[Title]#` field, if present and non-empty.
pub fn title(content: &str) -> Option<String> {
	let value = TITLE.captures(content)?.get(1)?.as_str().trim();
	if value.is_empty() || value.starts_with("#[") { None } else { Some(value.to_string()) }
}

/// Value of the `#[EvidenceID]#` field.
pub fn evidence_id(content: &str) -> Option<u64> {
	EVIDENCE_ID.captures(content)?.get(1)?.as_str().trim().parse().ok()
}

/// Content without its `#[EvidenceID]#` field.
pub fn strip_evidence_id(content: &str) -> String {
	EVIDENCE_ID_FIELD.replace_all(content, "").into_owned()
}

/// Content with its `#[EvidenceID]#` field set to `id`, as the last field.
pub fn with_evidence_id(content: &str, id: u64) -> String {
	format!("{}\n#[EvidenceID]#\n\n{id}\n", strip_evidence_id(content))
}

/// Make sure exactly one blank line separates each `#[Field]#` from its value, so pandoc keeps them apart.
pub fn space_fields(content: &str) -> String {
	FIELD.replace_all(content, "$1\n\n$2").into_owned()
}

/// Undo pandoc's over-eager escaping (https://github.com/jgm/pandoc/issues/6259).
pub fn unescape_pandoc(text: &str) -> String {
	[
		(r"\<", "<"),
		(r"\>", ">"),
		(r"\\", r"\"),
		(r"\*", "*"),
		(r"\_", "_"),
		(r"\[", "["),
		(r"\]", "]"),
		(r"\#", "#"),
		(r"\|", "|"),
		(r"\~", "~"),
		(r"\.\.", ".."),
	]
	.iter()
	.fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Decode the HTML entities pandoc's textile writer emits.
pub fn unescape_html(text: &str) -> String {
	static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|[a-zA-Z]+);").expect("valid regex"));
	ENTITY
		.replace_all(text, |caps: &regex::Captures| {
			let entity = &caps[1];
			let decoded = match entity {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				"apos" => Some('\''),
				"nbsp" => Some('\u{a0}'),
				_ => entity
					.strip_prefix("#x")
					.or_else(|| entity.strip_prefix("#X"))
					.and_then(|hex| u32::from_str_radix(hex, 16).ok())
					.or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
					.and_then(char::from_u32),
			};
			decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
		})
		.into_owned()
}

#[cfg(test)]
mod tests {
	use insta::assert_snapshot;

	use super::*;

	#[test]
	fn title_is_first_line_after_field() {
		assert_eq!(title("#[Title]#\nSQL Injection\n\n#[Rating]#\nHigh"), Some("SQL Injection".into()));
		assert_eq!(title("#[Title]#\r\n\r\nSQL Injection"), Some("SQL Injection".into()));
		assert_eq!(title("#[Title]#\n#[Rating]#\nHigh"), None);
		assert_eq!(title("no fields here"), None);
	}

	#[test]
	fn evidence_id_roundtrip_leaves_content_untouched() {
		let remote = "#[Location]#\n\n/login\n";
		let local = with_evidence_id(remote, 42);
		assert_eq!(evidence_id(&local), Some(42));
		assert_eq!(strip_evidence_id(&local), remote);
		// Replacing an id doesn't stack fields
		let relocal = with_evidence_id(&local, 43);
		assert_eq!(evidence_id(&relocal), Some(43));
		assert_eq!(relocal.matches("#[EvidenceID]#").count(), 1);
	}

	#[test]
	fn space_fields_normalizes_gaps() {
		assert_snapshot!(space_fields("#[Title]#\nXSS\n#[Rating]#\n\n\nHigh\n"), @r"
		#[Title]#

		XSS
		#[Rating]#

		High
		");
	}

	#[test]
	fn unescape_pandoc_output() {
		assert_eq!(unescape_pandoc(r"\#\[Title\]\# a\_b \*c\* \<br\>"), "#[Title]# a_b *c* <br>");
	}

	#[test]
	fn unescape_html_entities() {
		assert_eq!(unescape_html("a &amp; b &lt;c&gt; &#39;d&#x27; &bogus;"), "a & b <c> 'd' &bogus;");
	}

	#[test]
	fn formats_by_extension_and_name() {
		assert_eq!(Format::from_extension("md"), Some(Format::Markdown));
		assert_eq!(Format::of_path(Path::new("a/b.textile")), Some(Format::Textile));
		assert_eq!(Format::of_path(Path::new("a/b.txt")), None);
		assert_eq!(Format::from_name("Word"), Some(Format::Word));
		assert_eq!(Format::from_name("gfm"), Some(Format::Markdown));
		assert_eq!(Format::from_name("odt"), None);
		assert_eq!(Format::Markdown.to_string(), "markdown");
	}
}

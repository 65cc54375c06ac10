//! Line-break filter over pandoc's JSON AST.
//!
//! Pandoc's document model tells a hard line break inside a paragraph (`LineBreak`) apart from a
//! paragraph boundary. Writers render the former inconsistently (`<br />` in textile), so it is
//! swapped for a placeholder before writing and re-inserted as the target's own break afterwards.

use serde_json::{Value, json};

use crate::markup::Format;

pub const LINEBREAK_PLACEHOLDER: &str = "{{linebreak}}";

/// Replace every `LineBreak` inline in the AST with a `Str` holding the placeholder.
/// Returns the number of replacements.
pub fn mark_linebreaks(ast: &mut Value) -> usize {
	match ast {
		Value::Object(map) if map.get("t").and_then(Value::as_str) == Some("LineBreak") => {
			*ast = json!({ "t": "Str", "c": LINEBREAK_PLACEHOLDER });
			1
		}
		Value::Object(map) => map.values_mut().map(mark_linebreaks).sum(),
		Value::Array(items) => items.iter_mut().map(mark_linebreaks).sum(),
		_ => 0,
	}
}

/// Turn placeholders in writer output back into explicit line breaks of `target`.
/// Whitespace the writer put around the placeholder is dropped.
pub fn restore_linebreaks(text: &str, target: Format) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(pos) = rest.find(LINEBREAK_PLACEHOLDER) {
		out.push_str(rest[..pos].trim_end_matches([' ', '\t']));
		out.push_str(target.hard_break());
		rest = rest[pos + LINEBREAK_PLACEHOLDER.len()..].trim_start_matches([' ', '\t', '\n']);
	}
	out.push_str(rest);
	out
}

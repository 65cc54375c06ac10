//! `document_properties.ini`: a single `[DOCUMENT_PROPERTIES]` section of `key=value` lines.
//!
//! Multi-line values are written ini-style, continuation lines indented with a tab.

use std::path::Path;

use crate::{
	dradis::DocumentProperties,
	error::{DradisError, Result},
};

pub const SECTION: &str = "DOCUMENT_PROPERTIES";

pub fn render_properties(properties: &DocumentProperties) -> String {
	let mut out = format!("[{SECTION}]\n");
	for (key, value) in properties {
		let mut lines = value.lines();
		out.push_str(&format!("{key}={}\n", lines.next().unwrap_or_default()));
		for line in lines {
			out.push_str(&format!("\t{line}\n"));
		}
	}
	out
}

/// Parse the properties section. Other sections and comments are ignored.
pub fn parse_properties(content: &str, path: &Path) -> Result<DocumentProperties> {
	let mut properties = DocumentProperties::new();
	let mut in_section = false;
	let mut seen_section = false;
	let mut last_key: Option<String> = None;

	for line in content.lines() {
		let trimmed = line.trim();
		if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
			in_section = name.trim() == SECTION;
			seen_section |= in_section;
			last_key = None;
			continue;
		}
		if !in_section || trimmed.starts_with(';') || trimmed.starts_with('#') {
			continue;
		}
		if trimmed.is_empty() {
			last_key = None;
			continue;
		}

		if line.starts_with([' ', '\t'])
			&& let Some(key) = &last_key
			&& let Some(value) = properties.get_mut(key)
		{
			value.push('\n');
			value.push_str(trimmed);
			continue;
		}

		let Some((key, value)) = trimmed.split_once('=') else {
			tracing::warn!("ignoring malformed line in {}: {trimmed}", path.display());
			continue;
		};
		let key = key.trim().to_string();
		properties.insert(key.clone(), value.trim().to_string());
		last_key = Some(key);
	}

	if !seen_section {
		return Err(DradisError::layout(path, format!("missing [{SECTION}] section")));
	}
	Ok(properties)
}

//! Terminal rendering of tables and folder trees.

use std::path::Path;

use colored::Colorize;
use walkdir::WalkDir;

/// Plain column-aligned table with a bold header row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
	let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
	for row in rows {
		for (i, cell) in row.iter().enumerate() {
			if let Some(w) = widths.get_mut(i) {
				*w = (*w).max(cell.chars().count());
			}
		}
	}

	let line = |cells: Vec<&str>| -> String {
		cells
			.iter()
			.zip(&widths)
			.map(|(cell, &w)| format!("{cell:<w$}"))
			.collect::<Vec<_>>()
			.join("  ")
			.trim_end()
			.to_string()
	};

	let mut out = format!("{}\n", line(headers.to_vec()).bold());
	for row in rows {
		out.push_str(&line(row.iter().map(String::as_str).collect()));
		out.push('\n');
	}
	out
}

/// Indented listing of everything below `root`: folders first, hidden entries skipped.
pub fn tree(root: &Path) -> String {
	let mut out = format!("{}\n", root.display().to_string().bold());
	let walker = WalkDir::new(root)
		.min_depth(1)
		.sort_by(|a, b| {
			let key = |e: &walkdir::DirEntry| (e.file_type().is_file(), e.file_name().to_string_lossy().to_lowercase());
			key(a).cmp(&key(b))
		})
		.into_iter()
		.filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));

	for entry in walker.filter_map(|e| e.ok()) {
		let indent = "    ".repeat(entry.depth());
		let name = entry.file_name().to_string_lossy();
		if entry.file_type().is_dir() {
			out.push_str(&format!("{indent}{}/\n", name.magenta().bold()));
		} else {
			let size = entry.metadata().map(|m| m.len()).unwrap_or_default();
			out.push_str(&format!("{indent}{} {}\n", name.blue(), format!("({size} bytes)").dimmed()));
		}
	}
	out
}

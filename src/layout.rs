//! The on-disk shape of a project, and classification of paths within it.
//!
//! ```text
//! <Project>/
//!     document_properties.ini
//!     Content Blocks/<Title>.textile
//!     Issues/<Title>.textile
//!     Nodes/<Node>/Evidences/<Issue>/Evidence-<n>-<Issue>.textile
//! ```

use std::path::{Path, PathBuf};

pub const CONTENT_BLOCKS_DIR: &str = "Content Blocks";
pub const ISSUES_DIR: &str = "Issues";
pub const NODES_DIR: &str = "Nodes";
pub const EVIDENCES_DIR: &str = "Evidences";
pub const DOCUMENT_PROPERTIES_FILE: &str = "document_properties.ini";

/// Remove characters that can't appear in a (Windows) file name.
pub fn clean_filename(name: &str) -> String {
	name.chars().filter(|c| !"<>:]\"/\\|?*.".contains(*c)).collect()
}

/// Whether a local name and a remote name designate the same entity.
pub fn same_name(a: &str, b: &str) -> bool {
	clean_filename(a).to_lowercase() == clean_filename(b).to_lowercase()
}

/// Which remote entity a local path stands for, inferred from its position in the project tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntityPath {
	DocumentProperties,
	ContentBlock,
	Issue,
	Evidence { node: String, issue: String },
}

impl EntityPath {
	/// Classify a file by its trailing path segments. Returns None for anything outside the layout.
	pub fn classify(path: &Path) -> Option<Self> {
		let segments: Vec<&str> = path.components().rev().take(5).filter_map(|c| c.as_os_str().to_str()).collect();

		match segments.as_slice() {
			[file, ..] if *file == DOCUMENT_PROPERTIES_FILE => Some(Self::DocumentProperties),
			[_, parent, ..] if *parent == CONTENT_BLOCKS_DIR => Some(Self::ContentBlock),
			[_, parent, ..] if *parent == ISSUES_DIR => Some(Self::Issue),
			[_, issue, evidences, node, nodes, ..] if *evidences == EVIDENCES_DIR && *nodes == NODES_DIR => Some(Self::Evidence {
				node: node.to_string(),
				issue: issue.to_string(),
			}),
			_ => None,
		}
	}
}

/// Path builders rooted at a local project folder.
#[derive(Clone, Debug, derive_new::new)]
pub struct ProjectDir {
	pub root: PathBuf,
}

impl ProjectDir {
	pub fn content_blocks(&self) -> PathBuf {
		self.root.join(CONTENT_BLOCKS_DIR)
	}

	pub fn issues(&self) -> PathBuf {
		self.root.join(ISSUES_DIR)
	}

	pub fn nodes(&self) -> PathBuf {
		self.root.join(NODES_DIR)
	}

	pub fn document_properties(&self) -> PathBuf {
		self.root.join(DOCUMENT_PROPERTIES_FILE)
	}

	pub fn evidences(&self, node: &str, issue: &str) -> PathBuf {
		self.nodes().join(clean_filename(node)).join(EVIDENCES_DIR).join(clean_filename(issue))
	}
}

/// Name of the n-th (1-based) evidence file of an issue, without extension.
pub fn evidence_file_stem(index: usize, issue: &str) -> String {
	format!("Evidence-{index}-{}", clean_filename(issue))
}

/// Regular files directly inside `dir`, sorted by name.
pub fn files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
	let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?.flatten().map(|e| e.path()).filter(|p| p.is_file()).collect();
	files.sort();
	Ok(files)
}

/// Directories directly inside `dir`, sorted by name.
pub fn dirs_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
	let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)?.flatten().map(|e| e.path()).filter(|p| p.is_dir()).collect();
	dirs.sort();
	Ok(dirs)
}

/// Final path component as an owned string.
pub fn file_name(path: &Path) -> String {
	path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

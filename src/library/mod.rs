//! The remote issue library: searching it, and turning entries (or the local template) into project files.

mod command;
mod similarity;

use std::path::{Path, PathBuf};

pub use command::{AddIssueArgs, IssuesArgs, add_issue_command, issues_command};
pub use similarity::ratio;

use crate::{
	dradis::{DradisClient, LibraryEntry},
	error::{DradisError, IoResultExt, Result},
	layout::{ProjectDir, clean_filename},
	markup::Format,
};

/// Minimum similarity for a title word to match a keyword.
pub const MATCH_THRESHOLD: f64 = 0.8;

#[derive(Clone, Debug)]
pub struct SearchHit {
	pub entry: LibraryEntry,
	/// Sum of the matching words' similarity, over the number of keywords
	pub score: f64,
	/// Title words that matched
	pub matched: Vec<String>,
}

/// Library entries matching `keywords`, best first. Without keywords, every entry with a score of 0.
pub fn search(client: &dyn DradisClient, keywords: &[String]) -> Result<Vec<SearchHit>> {
	let entries = client.list_library()?;
	tracing::debug!(count = entries.len(), "fetched issue library");
	Ok(rank(entries, keywords))
}

pub fn rank(entries: Vec<LibraryEntry>, keywords: &[String]) -> Vec<SearchHit> {
	let keywords: Vec<&str> = keywords.iter().flat_map(|k| k.split_whitespace()).collect();
	if keywords.is_empty() {
		return entries.into_iter().map(|entry| SearchHit { entry, score: 0.0, matched: Vec::new() }).collect();
	}

	let mut hits: Vec<SearchHit> = entries
		.into_iter()
		.filter_map(|entry| {
			let mut total = 0.0;
			let mut matched = Vec::new();
			for word in entry.title.split_whitespace() {
				for keyword in &keywords {
					let r = ratio(&keyword.to_lowercase(), &word.to_lowercase());
					if r > MATCH_THRESHOLD {
						total += r;
						matched.push(word.to_string());
					}
				}
			}
			(!matched.is_empty()).then(|| SearchHit {
				score: total / keywords.len() as f64,
				entry,
				matched,
			})
		})
		.collect();
	hits.sort_by(|a, b| b.score.total_cmp(&a.score));
	hits
}

/// Where a new issue's content comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IssueSource {
	/// Entry of the remote library
	Library(u64),
	/// Local issue template, titled
	Template(String),
}

/// Files written by `add_issue`.
#[derive(Clone, Debug)]
pub struct AddedIssue {
	pub issue: PathBuf,
	pub evidence: Option<PathBuf>,
}

/// Local templates and format `add_issue` writes with.
#[derive(Clone, Debug)]
pub struct Templates {
	pub issue: PathBuf,
	pub evidence: PathBuf,
	pub format: Format,
}

/// Create `Issues/<title>.<ext>` in a project folder, and an evidence stub under `node` when given.
/// Nothing is written if the source can't be resolved. Only library sources need a client.
pub fn add_issue(client: Option<&dyn DradisClient>, project: &Path, source: &IssueSource, node: Option<&str>, templates: &Templates) -> Result<AddedIssue> {
	let evidence_template = match node {
		Some(_) => Some(read_template(&templates.evidence, "evidence")?),
		None => None,
	};

	let (title, content) = match source {
		IssueSource::Library(id) => {
			tracing::info!("creating local issue from library entry {id}");
			let client = client.ok_or_else(|| DradisError::Config("reading the issue library needs a Dradis connection".into()))?;
			let entry = client.get_library_entry(*id)?;
			let content = entry.content.unwrap_or_default();
			(entry.title, content)
		}
		IssueSource::Template(title) => {
			tracing::info!("creating local issue: {title}");
			let template = read_template(&templates.issue, "issue")?;
			(title.clone(), template.replacen("#[Title]#", &format!("#[Title]#\n{title}"), 1))
		}
	};
	let title = clean_filename(&title);
	let ext = templates.format.extension();

	let dir = ProjectDir::new(project.to_path_buf());
	let issues = dir.issues();
	std::fs::create_dir_all(&issues).at(&issues)?;
	let issue = issues.join(format!("{title}.{ext}"));
	std::fs::write(&issue, &content).at(&issue)?;

	let evidence = match (node, evidence_template) {
		(Some(node), Some(template)) => {
			let folder = dir.evidences(node, &title);
			std::fs::create_dir_all(&folder).at(&folder)?;
			let file = free_evidence_path(&folder, ext);
			std::fs::write(&file, template).at(&file)?;
			tracing::info!("evidence stub {} was created", file.display());
			Some(file)
		}
		_ => None,
	};

	Ok(AddedIssue { issue, evidence })
}

fn read_template(path: &Path, kind: &str) -> Result<String> {
	if !path.is_file() {
		return Err(DradisError::not_found(format!("{kind} template {}", path.display())));
	}
	std::fs::read_to_string(path).at(path)
}

/// `Evidence.<ext>`, or the first of `Evidence2.<ext>`, `Evidence3.<ext>`, ... not taken yet.
fn free_evidence_path(folder: &Path, ext: &str) -> PathBuf {
	let first = folder.join(format!("Evidence.{ext}"));
	if !first.exists() {
		return first;
	}
	(2..)
		.map(|n| folder.join(format!("Evidence{n}.{ext}")))
		.find(|p| !p.exists())
		.unwrap_or(first)
}

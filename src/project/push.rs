use std::path::Path;

use super::{attachments::upload_referenced, properties::parse_properties};
use crate::{
	convert::Converter,
	dradis::{DradisClient, Issue, Node},
	error::{DradisError, IoResultExt, Result},
	layout::{self, EntityPath, ProjectDir, same_name},
	markup::{self, Format},
};

/// Label of the node Dradis keeps uploaded files in. Content block attachments live on the node just before it.
const UPLOADED_FILES_NODE: &str = "Uploaded files";

/// What a push did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PushSummary {
	pub created: usize,
	pub updated: usize,
	pub skipped: usize,
}

/// Push a local project folder, or a single file of one, to the remote project.
/// Remote content is replaced by the local one, never merged.
pub fn push_project(client: &dyn DradisClient, converter: &Converter, project_id: u64, source: &Path) -> Result<PushSummary> {
	let project = client.get_project(project_id)?;
	let mut push = Push {
		client,
		converter,
		project_id,
		issues: None,
		nodes: None,
		summary: PushSummary::default(),
	};

	if source.is_file() {
		tracing::info!("{} is being updated to Dradis", layout::file_name(source));
		push.item(source)?;
	} else if source.is_dir() {
		tracing::info!("{} is being updated on Dradis", project.name);
		push.folder(&ProjectDir::new(source.to_path_buf()))?;
	} else {
		return Err(DradisError::layout(source, "does not exist"));
	}
	Ok(push.summary)
}

struct Push<'a> {
	client: &'a dyn DradisClient,
	converter: &'a Converter,
	project_id: u64,
	/// Remote issues and nodes, fetched on first use and kept current as we create
	issues: Option<Vec<Issue>>,
	nodes: Option<Vec<Node>>,
	summary: PushSummary,
}

impl Push<'_> {
	fn folder(&mut self, dir: &ProjectDir) -> Result<()> {
		let content_blocks = dir.content_blocks();
		if content_blocks.is_dir() {
			tracing::debug!("exporting content blocks");
			for file in layout::files_in(&content_blocks).at(&content_blocks)? {
				self.content_block(&file)?;
			}
		} else {
			tracing::warn!("no {} folder found", layout::CONTENT_BLOCKS_DIR);
		}

		let properties = dir.document_properties();
		if properties.is_file() {
			tracing::debug!("exporting document properties");
			self.document_properties(&properties)?;
		} else {
			tracing::warn!("no document properties found");
		}

		let issues = dir.issues();
		if issues.is_dir() {
			tracing::debug!("exporting issues");
			for file in layout::files_in(&issues).at(&issues)? {
				self.issue(&file)?;
			}
		} else {
			tracing::warn!("no {} folder found", layout::ISSUES_DIR);
		}

		let nodes = dir.nodes();
		if nodes.is_dir() {
			tracing::debug!("exporting nodes");
			for folder in layout::dirs_in(&nodes).at(&nodes)? {
				self.node(&folder)?;
			}
		} else {
			tracing::warn!("no {} folder found", layout::NODES_DIR);
		}
		Ok(())
	}

	fn item(&mut self, path: &Path) -> Result<()> {
		match EntityPath::classify(path) {
			Some(EntityPath::DocumentProperties) => self.document_properties(path),
			Some(EntityPath::ContentBlock) => self.content_block(path),
			Some(EntityPath::Issue) => self.issue(path),
			Some(EntityPath::Evidence { node, issue }) => self.evidence(&node, &issue, path),
			None => {
				tracing::warn!("{} is not part of a project layout, skipping", path.display());
				self.summary.skipped += 1;
				Ok(())
			}
		}
	}

	fn content_block(&mut self, file: &Path) -> Result<()> {
		let Some(content) = self.read_textile(file)? else {
			return Ok(());
		};
		let Some(title) = markup::title(&content) else {
			tracing::warn!("{} does not have a #[Title]# field, skipping", layout::file_name(file));
			self.summary.skipped += 1;
			return Ok(());
		};

		let content = match self.content_blocks_node()? {
			Some(node_id) => upload_referenced(self.client, self.project_id, node_id, &content, parent(file))?,
			None => content,
		};

		let blocks = self.client.list_content_blocks(self.project_id)?;
		let existing = blocks.iter().find(|b| b.title().map(String::from).or_else(|| markup::title(&b.content)).is_some_and(|t| same_name(&t, &title)));
		match existing {
			Some(block) => {
				tracing::info!("updating content block {title}");
				self.client.update_content_block(self.project_id, block.id, &content)?;
				self.summary.updated += 1;
			}
			None => {
				tracing::info!("creating content block {title}");
				self.client.create_content_block(self.project_id, &content, &title)?;
				self.summary.created += 1;
			}
		}
		Ok(())
	}

	fn document_properties(&mut self, file: &Path) -> Result<()> {
		let content = std::fs::read_to_string(file).at(file)?;
		for (key, value) in parse_properties(&content, file)? {
			match self.client.update_document_property(self.project_id, &key, &value) {
				Ok(()) => self.summary.updated += 1,
				Err(e) => {
					tracing::error!("property {key} failed to update: {e}");
					self.summary.skipped += 1;
				}
			}
		}
		tracing::info!("document properties exported");
		Ok(())
	}

	fn issue(&mut self, file: &Path) -> Result<()> {
		let Some(content) = self.read_textile(file)? else {
			return Ok(());
		};
		let Some(title) = markup::title(&content) else {
			tracing::warn!("{} does not have a #[Title]# field, skipping", layout::file_name(file));
			self.summary.skipped += 1;
			return Ok(());
		};

		match self.find_issue(&title)? {
			Some(issue_id) => {
				tracing::info!("updating issue {title}");
				self.client.update_issue(self.project_id, issue_id, &content)?;
				self.summary.updated += 1;
			}
			None => {
				tracing::info!("creating issue {title}");
				let id = self.client.create_issue(self.project_id, &content)?;
				self.issues()?.push(Issue { id, title, text: content });
				self.summary.created += 1;
			}
		}
		Ok(())
	}

	fn node(&mut self, folder: &Path) -> Result<()> {
		let label = layout::file_name(folder);
		self.node_id(&label)?;

		let evidences = folder.join(layout::EVIDENCES_DIR);
		if !evidences.is_dir() {
			tracing::info!("no {} folder in node {label}", layout::EVIDENCES_DIR);
			return Ok(());
		}
		for issue_folder in layout::dirs_in(&evidences).at(&evidences)? {
			let issue = layout::file_name(&issue_folder);
			for file in layout::files_in(&issue_folder).at(&issue_folder)? {
				self.evidence(&label, &issue, &file)?;
			}
		}
		Ok(())
	}

	/// The node is only looked up (and created if missing) once the evidence is known to be sent.
	fn evidence(&mut self, node: &str, issue: &str, file: &Path) -> Result<()> {
		let Some(format) = self.markup_format(file) else {
			return Ok(());
		};
		let Some(issue_id) = self.find_issue(issue)? else {
			tracing::warn!("the issue {issue} was not found on Dradis, skipping evidence {}", layout::file_name(file));
			self.summary.skipped += 1;
			return Ok(());
		};
		let raw = std::fs::read_to_string(file).at(file)?;
		let evidence_id = markup::evidence_id(&raw);
		let content = self.to_textile(format, file, &markup::strip_evidence_id(&raw))?;
		let node_id = self.node_id(node)?;
		let content = upload_referenced(self.client, self.project_id, node_id, &content, parent(file))?;

		if let Some(evidence_id) = evidence_id {
			tracing::debug!("updating evidence {evidence_id}");
			match self.client.update_evidence(self.project_id, node_id, issue_id, evidence_id, &content) {
				Ok(()) => {
					self.summary.updated += 1;
					return Ok(());
				}
				Err(e) => tracing::warn!("could not update evidence {evidence_id} ({e}), creating a new one"),
			}
		} else {
			tracing::debug!("no evidence id, creating new");
		}

		let new_id = self.client.create_evidence(self.project_id, node_id, issue_id, &content)?;
		std::fs::write(file, markup::with_evidence_id(&raw, new_id)).at(file)?;
		self.summary.created += 1;
		Ok(())
	}

	/// Textile content of a local file, converting markdown. None (skipped, with a warning) for other formats.
	fn read_textile(&mut self, file: &Path) -> Result<Option<String>> {
		let Some(format) = self.markup_format(file) else {
			return Ok(None);
		};
		let content = std::fs::read_to_string(file).at(file)?;
		self.to_textile(format, file, &content).map(Some)
	}

	/// Format of a file we can read markup from. Decided by extension, before the file is opened.
	fn markup_format(&mut self, file: &Path) -> Option<Format> {
		match Format::of_path(file) {
			Some(format) if format.is_readable() => Some(format),
			_ => {
				tracing::warn!("{} is not a valid markup format, skipping Dradis export", layout::file_name(file));
				self.summary.skipped += 1;
				None
			}
		}
	}

	fn to_textile(&self, format: Format, file: &Path, content: &str) -> Result<String> {
		if format == Format::Textile {
			return Ok(content.to_string());
		}
		tracing::debug!("reading textile from {}", layout::file_name(file));
		self.converter.convert_text(content, format, Format::Textile)
	}

	fn issues(&mut self) -> Result<&mut Vec<Issue>> {
		if self.issues.is_none() {
			self.issues = Some(self.client.list_issues(self.project_id)?);
		}
		Ok(self.issues.get_or_insert_default())
	}

	fn nodes(&mut self) -> Result<&mut Vec<Node>> {
		if self.nodes.is_none() {
			self.nodes = Some(self.client.list_nodes(self.project_id)?);
		}
		Ok(self.nodes.get_or_insert_default())
	}

	fn find_issue(&mut self, title: &str) -> Result<Option<u64>> {
		Ok(self.issues()?.iter().find(|i| same_name(&i.title, title)).map(|i| i.id))
	}

	/// Id of the node labeled `label`, created when missing.
	fn node_id(&mut self, label: &str) -> Result<u64> {
		if let Some(node) = self.nodes()?.iter().find(|n| same_name(&n.label, label)) {
			tracing::debug!("found existing node {label}");
			return Ok(node.id);
		}
		tracing::info!("creating node {label}");
		let id = self.client.create_node(self.project_id, label)?;
		self.nodes()?.push(Node {
			id,
			label: label.to_string(),
			type_id: Some(1),
			evidence: Vec::new(),
		});
		self.summary.created += 1;
		Ok(id)
	}

	/// Node holding content block attachments: Dradis doesn't list it, it is the one right before "Uploaded files".
	fn content_blocks_node(&mut self) -> Result<Option<u64>> {
		let Some(uploaded) = self.nodes()?.iter().find(|n| same_name(&n.label, UPLOADED_FILES_NODE)).map(|n| n.id) else {
			tracing::warn!("no '{UPLOADED_FILES_NODE}' node, content block attachments are not uploaded");
			return Ok(None);
		};
		let node = uploaded.checked_sub(1);
		if node.is_none() {
			tracing::warn!("'{UPLOADED_FILES_NODE}' node has id 0, content block attachments are not uploaded");
		}
		Ok(node)
	}
}

fn parent(file: &Path) -> &Path {
	file.parent().unwrap_or(Path::new("."))
}

//! Mock Dradis client for testing purposes.
//!
//! Stores everything in memory. When created from a state file (`DRADISMD_MOCK_STATE`, used with
//! `--mock`), every mutation is written back so that integration tests can inspect the remote side.

use std::{
	path::{Path, PathBuf},
	sync::Mutex,
};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Attachment, ContentBlock, DocumentProperties, DradisClient, Evidence, Issue, IssueRef, LibraryEntry, Node, Project};
use crate::error::{DradisError, IoResultExt, Result};

pub const MOCK_STATE_ENV: &str = "DRADISMD_MOCK_STATE";

/// Whole remote state, as loaded from / saved to the mock state file.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MockState {
	#[serde(default)]
	pub projects: Vec<MockProject>,
	#[serde(default)]
	pub issue_library: Vec<LibraryEntry>,
	/// Next id handed out by create calls
	#[serde(default = "first_id")]
	pub next_id: u64,
}

fn first_id() -> u64 {
	1000
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MockProject {
	#[serde(flatten)]
	pub project: Project,
	#[serde(default)]
	pub content_blocks: Vec<ContentBlock>,
	#[serde(default)]
	pub document_properties: DocumentProperties,
	#[serde(default)]
	pub issues: Vec<Issue>,
	#[serde(default)]
	pub nodes: Vec<MockNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MockNode {
	#[serde(flatten)]
	pub node: Node,
	#[serde(default)]
	pub attachments: Vec<String>,
}

impl MockState {
	fn project_mut(&mut self, project_id: u64) -> Result<&mut MockProject> {
		self.projects
			.iter_mut()
			.find(|p| p.project.id == project_id)
			.ok_or_else(|| DradisError::not_found(format!("project {project_id}")))
	}

	fn next_id(&mut self) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		id
	}
}

impl MockProject {
	fn node_mut(&mut self, node_id: u64) -> Result<&mut MockNode> {
		self.nodes.iter_mut().find(|n| n.node.id == node_id).ok_or_else(|| DradisError::not_found(format!("node {node_id}")))
	}

	fn issue_ref(&self, issue_id: u64) -> Result<IssueRef> {
		self.issues
			.iter()
			.find(|i| i.id == issue_id)
			.map(|i| IssueRef { id: i.id, title: i.title.clone() })
			.ok_or_else(|| DradisError::not_found(format!("issue {issue_id}")))
	}
}

/// Mock Dradis client that keeps all state in memory.
pub struct MockDradisClient {
	state: Mutex<MockState>,
	/// Where to persist mutations, if loaded from a file
	state_file: Option<PathBuf>,
	call_log: Mutex<Vec<String>>,
}

impl MockDradisClient {
	pub fn new(state: MockState) -> Self {
		Self {
			state: Mutex::new(state),
			state_file: None,
			call_log: Mutex::new(Vec::new()),
		}
	}

	/// Load from the file named by `DRADISMD_MOCK_STATE`, or start empty.
	pub fn from_env() -> Result<Self> {
		match std::env::var_os(MOCK_STATE_ENV) {
			Some(path) => Self::from_state_file(Path::new(&path)),
			None => Ok(Self::new(MockState::default())),
		}
	}

	pub fn from_state_file(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).at(path)?;
		let state: MockState = serde_json::from_str(&content)?;
		tracing::debug!(target: "mock_dradis", ?path, projects = state.projects.len(), "loaded mock state");
		Ok(Self {
			state: Mutex::new(state),
			state_file: Some(path.to_path_buf()),
			call_log: Mutex::new(Vec::new()),
		})
	}

	/// Snapshot of the current state.
	pub fn state(&self) -> MockState {
		self.state.lock().unwrap().clone()
	}

	pub fn get_call_log(&self) -> Vec<String> {
		self.call_log.lock().unwrap().clone()
	}

	fn log_call(&self, call: &str) {
		self.call_log.lock().unwrap().push(call.to_string());
	}

	fn read<T>(&self, f: impl FnOnce(&mut MockState) -> Result<T>) -> Result<T> {
		f(&mut self.state.lock().unwrap())
	}

	/// Apply a mutation and persist it.
	fn write<T>(&self, f: impl FnOnce(&mut MockState) -> Result<T>) -> Result<T> {
		let mut state = self.state.lock().unwrap();
		let out = f(&mut state)?;
		if let Some(path) = &self.state_file {
			std::fs::write(path, serde_json::to_string_pretty(&*state)?).at(path)?;
		}
		Ok(out)
	}
}

impl DradisClient for MockDradisClient {
	#[instrument(skip(self), name = "MockDradisClient::list_projects")]
	fn list_projects(&self) -> Result<Vec<Project>> {
		self.log_call("list_projects");
		self.read(|s| Ok(s.projects.iter().map(|p| p.project.clone()).collect()))
	}

	#[instrument(skip(self), name = "MockDradisClient::get_project")]
	fn get_project(&self, project_id: u64) -> Result<Project> {
		self.log_call(&format!("get_project({project_id})"));
		self.read(|s| Ok(s.project_mut(project_id)?.project.clone()))
	}

	#[instrument(skip(self), name = "MockDradisClient::list_content_blocks")]
	fn list_content_blocks(&self, project_id: u64) -> Result<Vec<ContentBlock>> {
		self.log_call(&format!("list_content_blocks({project_id})"));
		self.read(|s| Ok(s.project_mut(project_id)?.content_blocks.clone()))
	}

	#[instrument(skip(self, content), name = "MockDradisClient::create_content_block")]
	fn create_content_block(&self, project_id: u64, content: &str, block_group: &str) -> Result<u64> {
		self.log_call(&format!("create_content_block({project_id})"));
		self.write(|s| {
			let id = s.next_id();
			let mut fields = std::collections::BTreeMap::new();
			if let Some(title) = crate::markup::title(content) {
				fields.insert("Title".to_string(), title);
			}
			s.project_mut(project_id)?.content_blocks.push(ContentBlock {
				id,
				fields,
				content: content.to_string(),
				block_group: Some(block_group.to_string()),
			});
			Ok(id)
		})
	}

	#[instrument(skip(self, content), name = "MockDradisClient::update_content_block")]
	fn update_content_block(&self, project_id: u64, block_id: u64, content: &str) -> Result<()> {
		self.log_call(&format!("update_content_block({project_id}, {block_id})"));
		self.write(|s| {
			let block = s
				.project_mut(project_id)?
				.content_blocks
				.iter_mut()
				.find(|b| b.id == block_id)
				.ok_or_else(|| DradisError::not_found(format!("content block {block_id}")))?;
			block.content = content.to_string();
			Ok(())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::list_document_properties")]
	fn list_document_properties(&self, project_id: u64) -> Result<DocumentProperties> {
		self.log_call(&format!("list_document_properties({project_id})"));
		self.read(|s| Ok(s.project_mut(project_id)?.document_properties.clone()))
	}

	#[instrument(skip(self), name = "MockDradisClient::update_document_property")]
	fn update_document_property(&self, project_id: u64, key: &str, value: &str) -> Result<()> {
		self.log_call(&format!("update_document_property({project_id}, {key})"));
		self.write(|s| {
			s.project_mut(project_id)?.document_properties.insert(key.to_string(), value.to_string());
			Ok(())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::list_issues")]
	fn list_issues(&self, project_id: u64) -> Result<Vec<Issue>> {
		self.log_call(&format!("list_issues({project_id})"));
		self.read(|s| Ok(s.project_mut(project_id)?.issues.clone()))
	}

	#[instrument(skip(self, text), name = "MockDradisClient::create_issue")]
	fn create_issue(&self, project_id: u64, text: &str) -> Result<u64> {
		self.log_call(&format!("create_issue({project_id})"));
		self.write(|s| {
			let id = s.next_id();
			let title = crate::markup::title(text).unwrap_or_default();
			s.project_mut(project_id)?.issues.push(Issue { id, title, text: text.to_string() });
			Ok(id)
		})
	}

	#[instrument(skip(self, text), name = "MockDradisClient::update_issue")]
	fn update_issue(&self, project_id: u64, issue_id: u64, text: &str) -> Result<()> {
		self.log_call(&format!("update_issue({project_id}, {issue_id})"));
		self.write(|s| {
			let issue = s
				.project_mut(project_id)?
				.issues
				.iter_mut()
				.find(|i| i.id == issue_id)
				.ok_or_else(|| DradisError::not_found(format!("issue {issue_id}")))?;
			issue.text = text.to_string();
			if let Some(title) = crate::markup::title(text) {
				issue.title = title;
			}
			Ok(())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::list_nodes")]
	fn list_nodes(&self, project_id: u64) -> Result<Vec<Node>> {
		self.log_call(&format!("list_nodes({project_id})"));
		self.read(|s| Ok(s.project_mut(project_id)?.nodes.iter().map(|n| n.node.clone()).collect()))
	}

	#[instrument(skip(self), name = "MockDradisClient::create_node")]
	fn create_node(&self, project_id: u64, label: &str) -> Result<u64> {
		self.log_call(&format!("create_node({project_id}, {label})"));
		self.write(|s| {
			let id = s.next_id();
			s.project_mut(project_id)?.nodes.push(MockNode {
				node: Node {
					id,
					label: label.to_string(),
					type_id: Some(1),
					evidence: Vec::new(),
				},
				attachments: Vec::new(),
			});
			Ok(id)
		})
	}

	#[instrument(skip(self, content), name = "MockDradisClient::create_evidence")]
	fn create_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, content: &str) -> Result<u64> {
		self.log_call(&format!("create_evidence({project_id}, {node_id}, {issue_id})"));
		self.write(|s| {
			let id = s.next_id();
			let project = s.project_mut(project_id)?;
			let issue = project.issue_ref(issue_id)?;
			project.node_mut(node_id)?.node.evidence.push(Evidence {
				id,
				content: content.to_string(),
				issue,
			});
			Ok(id)
		})
	}

	#[instrument(skip(self, content), name = "MockDradisClient::update_evidence")]
	fn update_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, evidence_id: u64, content: &str) -> Result<()> {
		self.log_call(&format!("update_evidence({project_id}, {node_id}, {issue_id}, {evidence_id})"));
		self.write(|s| {
			let project = s.project_mut(project_id)?;
			let issue = project.issue_ref(issue_id)?;
			let evidence = project
				.node_mut(node_id)?
				.node
				.evidence
				.iter_mut()
				.find(|e| e.id == evidence_id)
				.ok_or_else(|| DradisError::not_found(format!("evidence {evidence_id}")))?;
			evidence.content = content.to_string();
			evidence.issue = issue;
			Ok(())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::list_attachments")]
	fn list_attachments(&self, project_id: u64, node_id: u64) -> Result<Vec<Attachment>> {
		self.log_call(&format!("list_attachments({project_id}, {node_id})"));
		self.read(|s| {
			let node = s.project_mut(project_id)?.node_mut(node_id)?;
			Ok(node.attachments.iter().map(|filename| Attachment { filename: filename.clone() }).collect())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::upload_attachments")]
	fn upload_attachments(&self, project_id: u64, node_id: u64, files: &[PathBuf]) -> Result<()> {
		self.log_call(&format!("upload_attachments({project_id}, {node_id}, {})", files.len()));
		self.write(|s| {
			let node = s.project_mut(project_id)?.node_mut(node_id)?;
			for file in files {
				node.attachments.push(crate::layout::file_name(file));
			}
			Ok(())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::list_library")]
	fn list_library(&self) -> Result<Vec<LibraryEntry>> {
		self.log_call("list_library");
		self.read(|s| {
			Ok(s.issue_library
				.iter()
				.map(|e| LibraryEntry {
					id: e.id,
					title: e.title.clone(),
					content: None,
				})
				.collect())
		})
	}

	#[instrument(skip(self), name = "MockDradisClient::get_library_entry")]
	fn get_library_entry(&self, entry_id: u64) -> Result<LibraryEntry> {
		self.log_call(&format!("get_library_entry({entry_id})"));
		self.read(|s| {
			s.issue_library
				.iter()
				.find(|e| e.id == entry_id)
				.cloned()
				.ok_or_else(|| DradisError::not_found(format!("issue library entry {entry_id}")))
		})
	}
}

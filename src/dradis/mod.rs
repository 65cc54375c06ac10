//! Dradis Pro REST API access.
//!
//! `DradisClient` is the seam between the sync logic and the network, so that the same
//! code runs against the real instance (`HttpDradisClient`) or an in-memory one (`MockDradisClient`).

mod http;
mod mock;
mod types;

use std::path::PathBuf;

pub use http::HttpDradisClient;
pub use mock::{MockDradisClient, MockState, MOCK_STATE_ENV};
pub use types::*;

use crate::error::Result;

/// Every Dradis API operation the tool consumes.
pub trait DradisClient {
	fn list_projects(&self) -> Result<Vec<Project>>;

	/// Fails with `NotFound` if the project doesn't exist or isn't accessible.
	fn get_project(&self, project_id: u64) -> Result<Project>;

	fn list_content_blocks(&self, project_id: u64) -> Result<Vec<ContentBlock>>;
	fn create_content_block(&self, project_id: u64, content: &str, block_group: &str) -> Result<u64>;
	fn update_content_block(&self, project_id: u64, block_id: u64, content: &str) -> Result<()>;

	fn list_document_properties(&self, project_id: u64) -> Result<DocumentProperties>;
	fn update_document_property(&self, project_id: u64, key: &str, value: &str) -> Result<()>;

	fn list_issues(&self, project_id: u64) -> Result<Vec<Issue>>;
	fn create_issue(&self, project_id: u64, text: &str) -> Result<u64>;
	fn update_issue(&self, project_id: u64, issue_id: u64, text: &str) -> Result<()>;

	/// Nodes, each with its evidence.
	fn list_nodes(&self, project_id: u64) -> Result<Vec<Node>>;
	fn create_node(&self, project_id: u64, label: &str) -> Result<u64>;

	fn create_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, content: &str) -> Result<u64>;
	fn update_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, evidence_id: u64, content: &str) -> Result<()>;

	fn list_attachments(&self, project_id: u64, node_id: u64) -> Result<Vec<Attachment>>;
	fn upload_attachments(&self, project_id: u64, node_id: u64, files: &[PathBuf]) -> Result<()>;

	/// Library entries without their content.
	fn list_library(&self) -> Result<Vec<LibraryEntry>>;
	fn get_library_entry(&self, entry_id: u64) -> Result<LibraryEntry>;
}

pub type BoxedDradisClient = Box<dyn DradisClient>;

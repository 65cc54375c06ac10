use std::path::PathBuf;

use reqwest::{
	Method, StatusCode,
	blocking::{Client, RequestBuilder, Response, multipart::Form},
};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{Attachment, ContentBlock, Created, DocumentProperties, DradisClient, Issue, LibraryEntry, Node, Project};
use crate::{
	config::{AppConfig, TlsVerification},
	error::{DradisError, IoResultExt, Result},
};

const USER_AGENT: &str = concat!("dradismd/", env!("CARGO_PKG_VERSION"));

/// Talks to a real Dradis Pro instance.
pub struct HttpDradisClient {
	http_client: Client,
	base_url: String,
	api_token: String,
}

impl HttpDradisClient {
	pub fn new(config: &AppConfig) -> Result<Self> {
		config.require_remote()?;

		let mut builder = Client::builder().user_agent(USER_AGENT);
		match config.tls_verification() {
			TlsVerification::Default => {}
			TlsVerification::Disabled => builder = builder.danger_accept_invalid_certs(true),
			TlsVerification::ExtraRoot(path) => {
				let pem = std::fs::read(&path).at(&path)?;
				builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
			}
		}

		Ok(Self {
			http_client: builder.build()?,
			base_url: config.dradis.instance_url.trim_end_matches('/').to_string(),
			api_token: config.dradis.api_token.clone(),
		})
	}

	fn auth_header(&self) -> String {
		format!("Token token=\"{}\"", self.api_token)
	}

	fn request(&self, method: Method, path: &str, project_id: Option<u64>) -> RequestBuilder {
		let url = format!("{}/pro/api/{path}", self.base_url);
		tracing::debug!(%method, %url, ?project_id, "dradis request");
		let req = self.http_client.request(method, url).header("Authorization", self.auth_header());
		match project_id {
			Some(id) => req.header("Dradis-Project-Id", id.to_string()),
			None => req,
		}
	}

	/// Send and turn non-success statuses into errors. `what` names the resource for 404s.
	fn send(&self, req: RequestBuilder, what: impl FnOnce() -> String) -> Result<Response> {
		let res = req.send()?;
		let status = res.status();
		if status == StatusCode::NOT_FOUND {
			return Err(DradisError::not_found(what()));
		}
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(DradisError::Remote { status: status.as_u16(), body });
		}
		Ok(res)
	}

	fn get_json<T: DeserializeOwned>(&self, path: &str, project_id: Option<u64>, what: impl FnOnce() -> String) -> Result<T> {
		let res = self.send(self.request(Method::GET, path, project_id), what)?;
		let body = res.text()?;
		tracing::trace!(%body, "dradis response");
		Ok(serde_json::from_str(&body)?)
	}
}

impl DradisClient for HttpDradisClient {
	fn list_projects(&self) -> Result<Vec<Project>> {
		self.get_json("projects", None, || "projects".into())
	}

	fn get_project(&self, project_id: u64) -> Result<Project> {
		self.get_json(&format!("projects/{project_id}"), None, || format!("project {project_id}"))
	}

	fn list_content_blocks(&self, project_id: u64) -> Result<Vec<ContentBlock>> {
		self.get_json("content_blocks", Some(project_id), || format!("content blocks of project {project_id}"))
	}

	fn create_content_block(&self, project_id: u64, content: &str, block_group: &str) -> Result<u64> {
		let req = self
			.request(Method::POST, "content_blocks", Some(project_id))
			.json(&json!({ "content_block": { "content": content, "block_group": block_group } }));
		let created: Created = self.send(req, || format!("project {project_id}"))?.json()?;
		Ok(created.id)
	}

	fn update_content_block(&self, project_id: u64, block_id: u64, content: &str) -> Result<()> {
		let req = self
			.request(Method::PUT, &format!("content_blocks/{block_id}"), Some(project_id))
			.json(&json!({ "content_block": { "content": content } }));
		self.send(req, || format!("content block {block_id}"))?;
		Ok(())
	}

	fn list_document_properties(&self, project_id: u64) -> Result<DocumentProperties> {
		let entries: Vec<DocumentProperties> = self.get_json("document_properties", Some(project_id), || format!("document properties of project {project_id}"))?;
		Ok(entries.into_iter().flatten().collect())
	}

	fn update_document_property(&self, project_id: u64, key: &str, value: &str) -> Result<()> {
		let req = self
			.request(Method::PUT, &format!("document_properties/{}", urlencoding::encode(key)), Some(project_id))
			.json(&json!({ "document_property": { "value": value } }));
		self.send(req, || format!("document property {key}"))?;
		Ok(())
	}

	fn list_issues(&self, project_id: u64) -> Result<Vec<Issue>> {
		self.get_json("issues", Some(project_id), || format!("issues of project {project_id}"))
	}

	fn create_issue(&self, project_id: u64, text: &str) -> Result<u64> {
		let req = self.request(Method::POST, "issues", Some(project_id)).json(&json!({ "issue": { "text": text } }));
		let created: Created = self.send(req, || format!("project {project_id}"))?.json()?;
		Ok(created.id)
	}

	fn update_issue(&self, project_id: u64, issue_id: u64, text: &str) -> Result<()> {
		let req = self.request(Method::PUT, &format!("issues/{issue_id}"), Some(project_id)).json(&json!({ "issue": { "text": text } }));
		self.send(req, || format!("issue {issue_id}"))?;
		Ok(())
	}

	fn list_nodes(&self, project_id: u64) -> Result<Vec<Node>> {
		self.get_json("nodes", Some(project_id), || format!("nodes of project {project_id}"))
	}

	fn create_node(&self, project_id: u64, label: &str) -> Result<u64> {
		let req = self
			.request(Method::POST, "nodes", Some(project_id))
			.json(&json!({ "node": { "label": label, "type_id": 1, "parent_id": null, "position": 1 } }));
		let created: Created = self.send(req, || format!("project {project_id}"))?.json()?;
		Ok(created.id)
	}

	fn create_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, content: &str) -> Result<u64> {
		let req = self
			.request(Method::POST, &format!("nodes/{node_id}/evidence"), Some(project_id))
			.json(&json!({ "evidence": { "content": content, "issue_id": issue_id } }));
		let created: Created = self.send(req, || format!("node {node_id}"))?.json()?;
		Ok(created.id)
	}

	fn update_evidence(&self, project_id: u64, node_id: u64, issue_id: u64, evidence_id: u64, content: &str) -> Result<()> {
		let req = self
			.request(Method::PUT, &format!("nodes/{node_id}/evidence/{evidence_id}"), Some(project_id))
			.json(&json!({ "evidence": { "content": content, "issue_id": issue_id } }));
		self.send(req, || format!("evidence {evidence_id}"))?;
		Ok(())
	}

	fn list_attachments(&self, project_id: u64, node_id: u64) -> Result<Vec<Attachment>> {
		self.get_json(&format!("nodes/{node_id}/attachments"), Some(project_id), || format!("node {node_id}"))
	}

	fn upload_attachments(&self, project_id: u64, node_id: u64, files: &[PathBuf]) -> Result<()> {
		let mut form = Form::new();
		for file in files {
			form = form.file("files[]", file).at(file)?;
		}
		let req = self.request(Method::POST, &format!("nodes/{node_id}/attachments"), Some(project_id)).multipart(form);
		self.send(req, || format!("node {node_id}"))?;
		Ok(())
	}

	fn list_library(&self) -> Result<Vec<LibraryEntry>> {
		let mut entries: Vec<LibraryEntry> = self.get_json("addons/issuelib/entries", None, || "issue library".into())?;
		for entry in &mut entries {
			entry.content = None;
		}
		Ok(entries)
	}

	fn get_library_entry(&self, entry_id: u64) -> Result<LibraryEntry> {
		self.get_json(&format!("addons/issuelib/entries/{entry_id}"), None, || format!("issue library entry {entry_id}"))
	}
}

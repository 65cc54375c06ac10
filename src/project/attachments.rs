//! Uploading images referenced from textile content, and pointing the references at the upload.

use std::{
	ops::Range,
	path::{Path, PathBuf},
	sync::LazyLock,
};

use regex::Regex;

use crate::{dradis::DradisClient, error::Result};

/// `!path!` or `!path(caption)!`
static TEXTILE_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!(?P<path>[^\s!(][^!(\r\n]*?)(?P<caption>\([^)\r\n]*\))?!").expect("valid regex"));

/// Where Dradis serves a node's attachments from.
pub fn attachments_url(project_id: u64, node_id: u64) -> String {
	format!("/pro/projects/{project_id}/nodes/{node_id}/attachments")
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageRef {
	/// The whole `!...!` match
	pub matched: String,
	pub path: String,
	/// Byte range of `path` in the content
	pub path_range: Range<usize>,
	pub caption: Option<String>,
}

pub fn textile_images(content: &str) -> Vec<ImageRef> {
	TEXTILE_IMAGE
		.captures_iter(content)
		.filter_map(|c| {
			let path = c.name("path")?;
			Some(ImageRef {
				matched: c[0].to_string(),
				path: path.as_str().to_string(),
				path_range: path.range(),
				caption: c.name("caption").map(|m| m.as_str().to_string()),
			})
		})
		.collect()
}

/// Upload the local images `content` references (relative to `base_dir`) that the node doesn't have yet,
/// and return `content` with those references rewritten to the node's attachment url.
/// References to missing files are left as they are.
pub fn upload_referenced(client: &dyn DradisClient, project_id: u64, node_id: u64, content: &str, base_dir: &Path) -> Result<String> {
	let images = textile_images(content);
	if images.is_empty() {
		return Ok(content.to_string());
	}
	tracing::debug!(count = images.len(), node_id, "handling attachments");

	let existing = client.list_attachments(project_id, node_id)?;
	let url = attachments_url(project_id, node_id);
	let mut uploads: Vec<PathBuf> = Vec::new();
	let mut content = content.to_string();

	for image in images {
		if image.path.starts_with("/pro/") {
			continue;
		}
		let decoded = urlencoding::decode(&image.path).map(|p| p.into_owned()).unwrap_or_else(|_| image.path.clone());
		let raw_name = image.path.rsplit('/').next().unwrap_or(&image.path).to_string();
		let name = decoded.rsplit('/').next().unwrap_or(&decoded).to_string();

		if existing.iter().any(|a| a.filename == name) {
			tracing::debug!("{name} already exists on node {node_id}, not uploading");
		} else {
			let local = base_dir.join(&decoded);
			if !local.is_file() {
				tracing::warn!("{} was not found. File missing? Skipping", local.display());
				continue;
			}
			if !uploads.contains(&local) {
				uploads.push(local);
			}
		}

		let caption = image.caption.as_deref().unwrap_or_default();
		content = content.replace(&image.matched, &format!("!{url}/{raw_name}{caption}!"));
	}

	if !uploads.is_empty() {
		tracing::info!("uploading {} attachment(s) to node {node_id}", uploads.len());
		client.upload_attachments(project_id, node_id, &uploads)?;
	}
	Ok(content)
}

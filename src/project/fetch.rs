use std::path::{Path, PathBuf};

use super::properties::render_properties;
use crate::{
	convert::{Converter, convert_file},
	dradis::DradisClient,
	error::{DradisError, IoResultExt, Result},
	layout::{ProjectDir, clean_filename, evidence_file_stem},
	markup::{self, Format},
};

/// Mirror a remote project into `<destination>/<project name>/`, in `format`.
/// Returns the project folder.
pub fn fetch_project(client: &dyn DradisClient, converter: &Converter, project_id: u64, destination: &Path, format: Format) -> Result<PathBuf> {
	let project = client.get_project(project_id)?;
	if !destination.is_dir() {
		return Err(DradisError::Io {
			path: destination.to_path_buf(),
			source: std::io::Error::new(std::io::ErrorKind::NotFound, "local folder does not exist"),
		});
	}
	if format != Format::Textile {
		converter.ensure_available()?;
	}

	let dir = ProjectDir::new(destination.join(clean_filename(&project.name)));
	std::fs::create_dir_all(&dir.root).at(&dir.root)?;
	tracing::info!("{} is imported from Dradis", project.name);
	let fetch = Fetch { client, converter, project_id, format };

	fetch.content_blocks(&dir)?;
	fetch.document_properties(&dir)?;
	fetch.issues(&dir)?;
	fetch.nodes(&dir)?;
	Ok(dir.root)
}

struct Fetch<'a> {
	client: &'a dyn DradisClient,
	converter: &'a Converter,
	project_id: u64,
	format: Format,
}

impl Fetch<'_> {
	fn content_blocks(&self, dir: &ProjectDir) -> Result<()> {
		let folder = dir.content_blocks();
		std::fs::create_dir_all(&folder).at(&folder)?;

		for block in self.client.list_content_blocks(self.project_id)? {
			let Some(title) = block.title().map(String::from).or_else(|| markup::title(&block.content)) else {
				tracing::warn!("content block {} has no Title field, skipping", block.id);
				continue;
			};
			tracing::debug!("creating file for {title}, sections length: {}", block.content.len());
			self.write(&folder, &clean_filename(&title), &block.content)?;
			tracing::info!("block [{title}] was created");
		}
		Ok(())
	}

	fn document_properties(&self, dir: &ProjectDir) -> Result<()> {
		let properties = self.client.list_document_properties(self.project_id)?;
		let path = dir.document_properties();
		std::fs::write(&path, render_properties(&properties)).at(&path)?;
		tracing::info!("{} was created", crate::layout::DOCUMENT_PROPERTIES_FILE);
		Ok(())
	}

	fn issues(&self, dir: &ProjectDir) -> Result<()> {
		let folder = dir.issues();
		std::fs::create_dir_all(&folder).at(&folder)?;

		for issue in self.client.list_issues(self.project_id)? {
			tracing::debug!("creating file for {}, sections length: {}", issue.title, issue.text.len());
			self.write(&folder, &clean_filename(&issue.title), &issue.text)?;
			tracing::info!("issue [{}] was created", issue.title);
		}
		Ok(())
	}

	fn nodes(&self, dir: &ProjectDir) -> Result<()> {
		for node in self.client.list_nodes(self.project_id)? {
			let node_folder = dir.nodes().join(clean_filename(&node.label));
			std::fs::create_dir_all(&node_folder).at(&node_folder)?;

			for (i, evidence) in node.evidence.iter().enumerate() {
				let folder = dir.evidences(&node.label, &evidence.issue.title);
				std::fs::create_dir_all(&folder).at(&folder)?;

				let stem = evidence_file_stem(i + 1, &evidence.issue.title);
				let written = self.write(&folder, &stem, &markup::strip_evidence_id(&evidence.content))?;
				if !self.format.is_binary() {
					let content = std::fs::read_to_string(&written).at(&written)?;
					std::fs::write(&written, markup::with_evidence_id(&content, evidence.id)).at(&written)?;
				}
				tracing::info!("evidence [{stem}] was created");
			}
		}
		Ok(())
	}

	/// Write textile `content` as `<folder>/<stem>.textile`, then convert it in place to the target format.
	fn write(&self, folder: &Path, stem: &str, content: &str) -> Result<PathBuf> {
		let file = folder.join(format!("{stem}.{}", Format::Textile.extension()));
		std::fs::write(&file, content).at(&file)?;
		if self.format == Format::Textile {
			return Ok(file);
		}
		convert_file(self.converter, &file, self.format, true)
	}
}

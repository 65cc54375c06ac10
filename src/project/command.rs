use std::path::PathBuf;

use clap::{Args, ValueEnum};
use colored::Colorize;
use jiff::Timestamp;

use super::{
	fetch::fetch_project,
	list::{ProjectField, ProjectFilter, list_projects, time_ago},
	push::push_project,
};
use crate::{
	config::AppConfig,
	convert::Converter,
	dradis::DradisClient,
	error::{DradisError, Result},
	markup::Format,
	output,
};

/// List projects, most recently updated first.
#[derive(Args)]
pub struct ProjectsArgs {
	/// Show only the N most recently updated projects
	#[arg(short, long, value_name = "N")]
	pub limit: Option<usize>,

	/// Only show projects whose FIELD (team, owner or name) contains VALUE
	#[arg(short, long, num_args = 2, value_names = ["FIELD", "VALUE"])]
	pub filter: Option<Vec<String>>,
}

/// Download a project into a local folder.
#[derive(Args)]
pub struct GetArgs {
	pub project_id: u64,

	/// Folder to create the project folder in
	#[arg(default_value = ".")]
	pub destination: PathBuf,

	/// Convert the files to FORMAT. Without a value, uses the configured `preferred_format`
	#[arg(long, num_args = 0..=1, value_name = "FORMAT")]
	pub format: Option<Option<Format>>,
}

/// Push a local project folder, or one file of it, to Dradis. Replaces remote content.
#[derive(Args)]
pub struct UpdateArgs {
	pub project_id: u64,

	/// Project folder, or a single file inside one
	#[arg(default_value = ".")]
	pub source: PathBuf,
}

impl ProjectsArgs {
	fn project_filter(&self) -> Result<Option<ProjectFilter>> {
		let Some(pair) = &self.filter else {
			return Ok(None);
		};
		let [field, value] = pair.as_slice() else {
			return Err(DradisError::InvalidArgument("--filter takes a field and a value".into()));
		};
		let field = <ProjectField as ValueEnum>::from_str(field, true).map_err(|_| DradisError::InvalidArgument(format!("cannot filter on '{field}', expected one of: team, owner, name")))?;
		Ok(Some(ProjectFilter::new(field, value.clone())))
	}
}

pub fn projects_command(config: &AppConfig, client: &dyn DradisClient, args: ProjectsArgs) -> Result<()> {
	let filter = args.project_filter()?;
	let projects = list_projects(client, args.limit, filter.as_ref())?;
	tracing::debug!(shown = projects.len(), "listing projects");

	let custom_fields = config.custom_fields();
	let mut headers = vec!["ID", "Name", "Team", "Last update"];
	headers.extend(custom_fields.iter().map(String::as_str));

	let now = Timestamp::now();
	let rows: Vec<Vec<String>> = projects
		.iter()
		.map(|p| {
			let mut row = vec![
				p.id.to_string(),
				p.name.clone(),
				p.team_name().unwrap_or("none").to_string(),
				format!("{} ({})", p.updated_at.strftime("%Y-%m-%d %H:%M"), time_ago(p.updated_at, now)),
			];
			row.extend(custom_fields.iter().map(|f| p.custom_field(f).unwrap_or_default().to_string()));
			row
		})
		.collect();

	print!("{}", output::table(&headers, &rows));
	Ok(())
}

pub fn get_command(config: &AppConfig, client: &dyn DradisClient, args: GetArgs) -> Result<()> {
	let format = match args.format {
		None => Format::Textile,
		Some(None) => config.preferred_format(),
		Some(Some(format)) => format,
	};
	tracing::debug!("import format is {format}");

	let root = fetch_project(client, &Converter::default(), args.project_id, &args.destination, format)?;
	print!("{}", output::tree(&root));
	println!("{}", format!("Project {} was imported", args.project_id).green());
	Ok(())
}

pub fn update_command(client: &dyn DradisClient, args: UpdateArgs) -> Result<()> {
	println!(
		"{}",
		format!("Warning: content on Dradis project {} is replaced by the local files, not merged.", args.project_id).yellow()
	);
	let summary = push_project(client, &Converter::default(), args.project_id, &args.source)?;
	println!(
		"{} ({} created, {} updated, {} skipped)",
		format!("Project {} was updated", args.project_id).green(),
		summary.created,
		summary.updated,
		summary.skipped
	);
	Ok(())
}

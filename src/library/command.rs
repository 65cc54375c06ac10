use std::path::PathBuf;

use clap::{ArgGroup, Args};
use colored::Colorize;

use super::{IssueSource, Templates, add_issue, search};
use crate::{config::AppConfig, dradis::DradisClient, error::Result, output};

/// Search the issue library. Without keywords, lists all of it.
#[derive(Args)]
pub struct IssuesArgs {
	/// Words to look for in entry titles, typos tolerated
	pub keywords: Vec<String>,
}

/// Add an issue to a local project folder, from the library or the local issue template.
#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["id", "title"])))]
pub struct AddIssueArgs {
	/// Project folder
	#[arg(default_value = ".")]
	pub path: PathBuf,

	/// Issue library entry to create the issue from
	#[arg(long)]
	pub id: Option<u64>,

	/// Create the issue from the local template, with this title
	#[arg(long, num_args = 0..=1, default_missing_value = "New Issue")]
	pub title: Option<String>,

	/// Also create an empty evidence for the issue, under this node
	#[arg(short, long)]
	pub node: Option<String>,
}

pub fn issues_command(client: &dyn DradisClient, args: IssuesArgs) -> Result<()> {
	let hits = search(client, &args.keywords)?;
	if args.keywords.is_empty() {
		let rows: Vec<Vec<String>> = hits.iter().map(|h| vec![h.entry.id.to_string(), h.entry.title.clone()]).collect();
		print!("{}", output::table(&["ID", "Title"], &rows));
		return Ok(());
	}

	let rows: Vec<Vec<String>> = hits
		.iter()
		.map(|h| vec![h.entry.id.to_string(), h.entry.title.clone(), format!("{:.2} %", h.score * 100.0), h.matched.join(", ")])
		.collect();
	print!("{}", output::table(&["ID", "Title", "Matching search at", "Matched"], &rows));
	Ok(())
}

pub fn add_issue_command(config: &AppConfig, client: Option<&dyn DradisClient>, args: AddIssueArgs) -> Result<()> {
	let source = match (args.id, args.title) {
		(Some(id), _) => IssueSource::Library(id),
		(None, title) => IssueSource::Template(title.unwrap_or_else(|| "New Issue".into())),
	};
	let templates = Templates {
		issue: config.issue_template(),
		evidence: config.evidence_template(),
		format: config.preferred_format(),
	};

	let added = add_issue(client, &args.path, &source, args.node.as_deref(), &templates)?;
	println!("{} {}", "Created".green(), added.issue.display());
	if let Some(evidence) = added.evidence {
		println!("{} {}", "Created".green(), evidence.display());
	}
	Ok(())
}

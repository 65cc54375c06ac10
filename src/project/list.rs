use clap::ValueEnum;
use jiff::Timestamp;

use crate::{
	dradis::{DradisClient, Project},
	error::Result,
};

/// Project attribute a listing can be filtered on.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq, ValueEnum)]
pub enum ProjectField {
	/// Team (client) name
	#[value(alias = "client")]
	#[display("team")]
	Team,
	/// Any owner's email
	#[display("owner")]
	Owner,
	/// Project name
	#[display("name")]
	Name,
}

/// Case-insensitive substring match over one project field.
#[derive(Clone, Debug, derive_new::new)]
pub struct ProjectFilter {
	pub field: ProjectField,
	pub value: String,
}

impl ProjectFilter {
	pub fn matches(&self, project: &Project) -> bool {
		let needle = self.value.to_lowercase();
		let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
		match self.field {
			ProjectField::Team => project.team_name().is_some_and(contains),
			ProjectField::Owner => project.owners.iter().any(|o| contains(&o.email)),
			ProjectField::Name => contains(&project.name),
		}
	}
}

/// Projects, most recently updated first. The filter applies before the limit.
pub fn list_projects(client: &dyn DradisClient, limit: Option<usize>, filter: Option<&ProjectFilter>) -> Result<Vec<Project>> {
	let projects = client.list_projects()?;
	tracing::debug!(count = projects.len(), "fetched projects");
	Ok(select_projects(projects, limit, filter))
}

pub fn select_projects(mut projects: Vec<Project>, limit: Option<usize>, filter: Option<&ProjectFilter>) -> Vec<Project> {
	projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
	if let Some(filter) = filter {
		projects.retain(|p| filter.matches(p));
	}
	if let Some(limit) = limit.filter(|&l| l > 0) {
		projects.truncate(limit);
	}
	projects
}

/// Human "3 days ago" rendering of the time elapsed between `then` and `now`.
pub fn time_ago(then: Timestamp, now: Timestamp) -> String {
	let secs = now.as_second() - then.as_second();
	if secs < 0 {
		return "in the future".into();
	}
	const UNITS: [(i64, &str); 6] = [(365 * 86400, "year"), (30 * 86400, "month"), (7 * 86400, "week"), (86400, "day"), (3600, "hour"), (60, "minute")];
	for (size, unit) in UNITS {
		let n = secs / size;
		if n >= 1 {
			let plural = if n == 1 { "" } else { "s" };
			return format!("{n} {unit}{plural} ago");
		}
	}
	"just now".into()
}

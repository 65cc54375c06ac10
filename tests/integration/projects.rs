//! Listing remote projects.

use rstest::{fixture, rstest};
use serde_json::json;

use crate::common::TestContext;

#[fixture]
fn ctx() -> TestContext {
	TestContext::new("//- /data/.keep\n").with_remote(json!({
		"projects": [
			{ "id": 1, "name": "Acme Internal", "team": { "name": "Acme" }, "owners": [{ "email": "alice@example.com" }], "updated_at": "2024-05-01T10:00:00Z",
				"custom_fields": [{ "name": "Status", "value": "draft" }] },
			{ "id": 2, "name": "Globex External", "team": { "name": "Globex" }, "owners": [{ "email": "bob@example.com" }], "updated_at": "2023-01-01T10:00:00Z" },
			{ "id": 3, "name": "Acme Mobile", "owners": [], "updated_at": "2024-06-01T10:00:00Z" }
		]
	}))
}

/// Project names in the order the table lists them.
fn listed(stdout: &str) -> Vec<&str> {
	["Acme Internal", "Globex External", "Acme Mobile"]
		.into_iter()
		.filter_map(|name| stdout.find(name).map(|at| (at, name)))
		.collect::<std::collections::BTreeMap<_, _>>()
		.into_values()
		.collect()
}

#[rstest]
fn lists_most_recently_updated_first(ctx: TestContext) {
	let (status, stdout, stderr) = ctx.run(&["projects"]);
	assert!(status.success(), "stderr: {stderr}");
	assert_eq!(listed(&stdout), vec!["Acme Mobile", "Acme Internal", "Globex External"]);

	let header = stdout.lines().next().unwrap();
	for column in ["ID", "Name", "Team", "Last update"] {
		assert!(header.contains(column), "missing {column} in {header}");
	}
	assert!(stdout.contains("2024-05-01 10:00"));
	assert!(stdout.contains("none"), "project without team shows none:\n{stdout}");
}

#[rstest]
fn limit_keeps_the_most_recent(ctx: TestContext) {
	let (status, stdout, _) = ctx.run(&["list", "-l", "2"]);
	assert!(status.success());
	assert_eq!(listed(&stdout), vec!["Acme Mobile", "Acme Internal"]);
}

#[rstest]
#[case(&["-f", "team", "acme"], vec!["Acme Internal"])]
#[case(&["-f", "client", "GLOBEX"], vec!["Globex External"])]
#[case(&["-f", "owner", "bob@"], vec!["Globex External"])]
#[case(&["-f", "name", "acme"], vec!["Acme Mobile", "Acme Internal"])]
fn filter_by_field(ctx: TestContext, #[case] filter: &[&str], #[case] expected: Vec<&str>) {
	let args: Vec<&str> = ["projects"].into_iter().chain(filter.iter().copied()).collect();
	let (status, stdout, stderr) = ctx.run(&args);
	assert!(status.success(), "stderr: {stderr}");
	assert_eq!(listed(&stdout), expected);
}

#[rstest]
fn custom_fields_become_columns(ctx: TestContext) {
	ctx.write_config("custom_fields = \"Status\"");
	let (status, stdout, _) = ctx.run(&["projects"]);
	assert!(status.success());
	assert!(stdout.lines().next().unwrap().contains("Status"));
	assert!(stdout.contains("draft"));
}

#[rstest]
fn unknown_filter_field_is_rejected(ctx: TestContext) {
	let (status, stdout, _) = ctx.run(&["projects", "-f", "color", "red"]);
	assert!(!status.success());
	assert!(stdout.is_empty());
}

#[test]
fn missing_config_is_reported() {
	let ctx = TestContext::new("//- /data/.keep\n");
	std::fs::remove_file(&ctx.config_path).unwrap();
	let (status, _, stderr) = ctx.run(&["projects"]);
	assert!(!status.success());
	assert!(stderr.contains("config"), "stderr: {stderr}");
}

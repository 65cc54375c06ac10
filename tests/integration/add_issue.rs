//! Creating local issues from the library or the issue template.

use serde_json::json;

use crate::common::TestContext;

fn ctx() -> TestContext {
	let ctx = TestContext::new("//- /data/Acme/Issues/.keep\n").with_remote(json!({
		"issue_library": [
			{ "id": 11, "title": "SQL Injection", "content": "#[Title]#\nSQL Injection\n\n#[Description]#\nUnsanitized input reaches a query.\n" },
			{ "id": 12, "title": "Reflected Cross-Site Scripting", "content": "#[Title]#\nReflected Cross-Site Scripting\n" }
		]
	}));
	ctx.write_config_dir("evidence_template.textile", "#[Location]#\n\n#[Output]#\n");
	ctx
}

#[test]
fn from_library_with_evidence() {
	let ctx = ctx();
	let (status, stdout, stderr) = ctx.run(&["add_issue", "Acme", "--id", "11", "-n", "10.0.0.1"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("Created"));

	assert!(ctx.read("Acme/Issues/SQL Injection.textile").contains("Unsanitized input"));
	assert_eq!(ctx.read("Acme/Nodes/10001/Evidences/SQL Injection/Evidence.textile"), "#[Location]#\n\n#[Output]#\n");

	let (status, _, _) = ctx.run(&["add", "Acme", "--id", "11", "-n", "10.0.0.1"]);
	assert!(status.success());
	assert!(ctx.data_exists("Acme/Nodes/10001/Evidences/SQL Injection/Evidence2.textile"));
}

#[test]
fn from_template_in_preferred_format() {
	let ctx = ctx();
	ctx.write_config_dir("issue_template.textile", "#[Title]#\n\n#[Rating]#\n");

	let (status, _, stderr) = ctx.run(&["add_issue", "Acme", "--title", "Open Redirect"]);
	assert!(status.success(), "stderr: {stderr}");
	assert_eq!(ctx.read("Acme/Issues/Open Redirect.textile"), "#[Title]#\nOpen Redirect\n\n#[Rating]#\n");

	let (status, _, _) = ctx.run(&["add_issue", "Acme", "--title"]);
	assert!(status.success());
	assert!(ctx.data_exists("Acme/Issues/New Issue.textile"));
}

#[test]
fn missing_template_creates_nothing() {
	let ctx = ctx();
	let (status, _, stderr) = ctx.run(&["add_issue", "Acme", "--title", "Open Redirect"]);
	assert!(!status.success());
	assert!(stderr.contains("issue template"), "stderr: {stderr}");
	assert!(!ctx.data_exists("Acme/Issues/Open Redirect.textile"));
}

#[test]
fn needs_a_source() {
	let ctx = ctx();
	let (status, _, _) = ctx.run(&["add_issue", "Acme"]);
	assert!(!status.success());
}

#[test]
fn search_ranks_library_entries() {
	let ctx = ctx();
	let (status, stdout, stderr) = ctx.run(&["search", "injectoin"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("SQL Injection"));
	assert!(stdout.contains("Matching search at"));
	assert!(!stdout.contains("Reflected"));

	let (status, stdout, _) = ctx.run(&["issues"]);
	assert!(status.success());
	assert!(stdout.contains("Reflected Cross-Site Scripting"));
}

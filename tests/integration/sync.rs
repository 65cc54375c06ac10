//! Round trips between the mock remote and a local project folder.

use dradismd::dradis::MockState;
use serde_json::json;

use crate::common::TestContext;

fn acme() -> serde_json::Value {
	json!({
		"projects": [{
			"id": 7,
			"name": "Acme: Web",
			"updated_at": "2024-05-29T12:00:00Z",
			"content_blocks": [
				{ "id": 1, "fields": { "Title": "Executive Summary" }, "content": "#[Title]#\nExecutive Summary\n\n#[Content]#\nAll good.\n", "block_group": "Summary" }
			],
			"document_properties": { "dradis.client": "Acme", "dradis.version": "1.2" },
			"issues": [
				{ "id": 2, "title": "SQL Injection", "text": "#[Title]#\nSQL Injection\n\n#[Rating]#\nHigh\n" },
				{ "id": 3, "title": "Stored XSS", "text": "#[Title]#\nStored XSS\n" }
			],
			"nodes": [
				{ "id": 4, "label": "10.0.0.1", "evidence": [
					{ "id": 5, "content": "#[Port]#\n443", "issue": { "id": 2, "title": "SQL Injection" } },
					{ "id": 6, "content": "#[Port]#\n8443", "issue": { "id": 3, "title": "Stored XSS" } }
				] }
			]
		}]
	})
}

/// Everything a push may touch, for comparing remote states.
fn contents(state: &MockState) -> Vec<String> {
	let project = &state.projects[0];
	let mut out: Vec<String> = project.content_blocks.iter().map(|b| format!("block {}: {}", b.id, b.content)).collect();
	out.extend(project.document_properties.iter().map(|(k, v)| format!("property {k}={v}")));
	out.extend(project.issues.iter().map(|i| format!("issue {}: {}", i.id, i.text)));
	for node in &project.nodes {
		out.extend(node.node.evidence.iter().map(|e| format!("evidence {}@{}/{}: {}", e.id, node.node.label, e.issue.id, e.content)));
	}
	out
}

#[test]
fn get_writes_the_project_tree() {
	let ctx = TestContext::new("//- /data/.keep\n").with_remote(acme());

	let (status, stdout, stderr) = ctx.run(&["get", "7"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("Project 7 was imported"));
	assert!(stdout.contains("Evidence-1-SQL Injection.textile"));

	assert_eq!(ctx.read("Acme Web/Issues/SQL Injection.textile"), "#[Title]#\nSQL Injection\n\n#[Rating]#\nHigh\n");
	assert_eq!(ctx.read("Acme Web/Content Blocks/Executive Summary.textile"), "#[Title]#\nExecutive Summary\n\n#[Content]#\nAll good.\n");
	let properties = ctx.read("Acme Web/document_properties.ini");
	assert!(properties.starts_with("[DOCUMENT_PROPERTIES]\n"));
	assert!(properties.contains("dradis.version=1.2"));
	assert_eq!(
		ctx.read("Acme Web/Nodes/10001/Evidences/Stored XSS/Evidence-2-Stored XSS.textile"),
		"#[Port]#\n8443\n#[EvidenceID]#\n\n6\n"
	);
}

#[test]
fn unchanged_round_trip_keeps_remote_identical() {
	let ctx = TestContext::new("//- /data/.keep\n").with_remote(acme());
	let before = ctx.remote();

	let (status, _, stderr) = ctx.run(&["import", "7"]);
	assert!(status.success(), "stderr: {stderr}");
	let (status, stdout, stderr) = ctx.run(&["export", "7", "Acme Web"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("replaced by the local files"));
	assert!(stdout.contains("Project 7 was updated (0 created"), "stdout: {stdout}");

	let after = ctx.remote();
	assert_eq!(contents(&after), contents(&before));
	assert_eq!(after.next_id, before.next_id);
}

#[test]
fn local_edits_are_pushed_and_new_evidence_gets_its_id() {
	let ctx = TestContext::new("//- /data/.keep\n").with_remote(acme());
	let (status, _, _) = ctx.run(&["get", "7"]);
	assert!(status.success());

	ctx.write("Acme Web/Issues/SQL Injection.textile", "#[Title]#\nSQL Injection\n\n#[Rating]#\nCritical\n");
	ctx.write("Acme Web/Issues/Open Redirect.textile", "#[Title]#\nOpen Redirect\n");
	ctx.write("Acme Web/Nodes/db01/Evidences/Open Redirect/Evidence.textile", "#[Port]#\n80\n");

	let (status, stdout, stderr) = ctx.run(&["update", "7", "Acme Web"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("(3 created"), "issue, node and evidence: {stdout}");

	let remote = ctx.remote();
	let project = &remote.projects[0];
	assert!(project.issues.iter().any(|i| i.id == 2 && i.text.contains("Critical")));
	let redirect = project.issues.iter().find(|i| i.title == "Open Redirect").unwrap();
	let db = project.nodes.iter().find(|n| n.node.label == "db01").unwrap();
	assert_eq!(db.node.evidence.len(), 1);
	assert_eq!(db.node.evidence[0].issue.id, redirect.id);
	assert_eq!(db.node.evidence[0].content, "#[Port]#\n80\n");

	// The id is written back, so pushing again updates instead of duplicating
	let local = ctx.read("Acme Web/Nodes/db01/Evidences/Open Redirect/Evidence.textile");
	assert_eq!(local, format!("#[Port]#\n80\n\n#[EvidenceID]#\n\n{}\n", db.node.evidence[0].id));
	let (status, stdout, _) = ctx.run(&["update", "7", "Acme Web"]);
	assert!(status.success());
	assert!(stdout.contains("(0 created"), "stdout: {stdout}");
	assert_eq!(ctx.remote().projects[0].nodes.iter().find(|n| n.node.label == "db01").unwrap().node.evidence.len(), 1);
}

#[test]
fn single_file_update_touches_only_that_entity() {
	let ctx = TestContext::new("//- /data/.keep\n").with_remote(acme());
	let (status, _, _) = ctx.run(&["get", "7"]);
	assert!(status.success());
	ctx.write("Acme Web/Issues/Stored XSS.textile", "#[Title]#\nStored XSS\n\n#[Rating]#\nMedium\n");
	ctx.write("Acme Web/Issues/SQL Injection.textile", "#[Title]#\nSQL Injection\n\n#[Rating]#\nLow\n");

	let (status, stdout, stderr) = ctx.run(&["update", "7", "Acme Web/Issues/Stored XSS.textile"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("(0 created, 1 updated, 0 skipped)"), "stdout: {stdout}");

	let remote = ctx.remote();
	let issues = &remote.projects[0].issues;
	assert!(issues.iter().any(|i| i.id == 3 && i.text.contains("Medium")));
	assert!(issues.iter().any(|i| i.id == 2 && i.text.contains("High")));
}

#[test]
fn unknown_project_fails_without_writing() {
	let ctx = TestContext::new("//- /data/.keep\n").with_remote(acme());
	let (status, _, stderr) = ctx.run(&["get", "99"]);
	assert!(!status.success());
	assert!(stderr.contains("99"), "stderr: {stderr}");
	assert!(!ctx.data_exists("Acme Web"));

	let (status, _, _) = ctx.run(&["update", "99", "."]);
	assert!(!status.success());
}

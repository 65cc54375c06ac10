//! Renaming attachments referenced from a project folder.

use crate::common::TestContext;

fn ctx() -> TestContext {
	let ctx = TestContext::new(
		"\
//- /data/Acme/Issues/XSS.md
#[Title]#
Stored XSS

![login](../shots/Screenshot%201.png)
![](../shots/gone.png)
//- /data/Acme/Issues/SQLi.textile
#[Title]#
SQL Injection

!../shots/sqlmap.png(dump)!
//- /data/Acme/shots/sqlmap.png
second
//- /data/Acme/shots/unused.png
third
",
	);
	ctx.write("Acme/shots/Screenshot 1.png", "first\n");
	ctx
}

#[test]
fn renames_with_the_configured_format() {
	let ctx = ctx();
	ctx.write_config("renaming_format = \"[section_initials]-[count]\"");

	let (status, stdout, stderr) = ctx.run(&["rename", "Acme"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("Renamed 2 attachment(s)"), "stdout: {stdout}");
	assert!(stdout.contains("gone.png"), "missing files are listed: {stdout}");

	assert!(ctx.read("Acme/Issues/XSS.md").contains("![login](../shots/SX-001.png)"));
	assert!(ctx.read("Acme/Issues/XSS.md").contains("![](../shots/gone.png)"));
	assert!(ctx.read("Acme/Issues/SQLi.textile").contains("!../shots/SI-001.png(dump)!"));
	assert_eq!(ctx.read("Acme/shots/SX-001.png").trim_end(), "first");
	assert_eq!(ctx.read("Acme/shots/SI-001.png").trim_end(), "second");
	assert!(ctx.data_exists("Acme/shots/unused.png"));
	assert!(!ctx.data_exists("Acme/shots/Screenshot 1.png"));
}

#[test]
fn pattern_flag_works_without_config() {
	let ctx = ctx();
	std::fs::remove_file(&ctx.config_path).unwrap();

	let (status, _, stderr) = ctx.run(&["rename", "Acme/Issues/XSS.md", "--pattern", "evidence {n}"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(ctx.read("Acme/Issues/XSS.md").contains("![login](../shots/evidence%201.png)"));
	assert!(ctx.data_exists("Acme/shots/evidence 1.png"));
	// Only the given file is processed
	assert!(ctx.data_exists("Acme/shots/sqlmap.png"));
}

#[test]
fn no_format_is_an_error() {
	let ctx = ctx();
	let (status, _, stderr) = ctx.run(&["rename", "Acme"]);
	assert!(!status.success());
	assert!(stderr.contains("renaming_format"), "stderr: {stderr}");
	assert!(ctx.data_exists("Acme/shots/sqlmap.png"));
}

#[test]
fn renames_inside_a_separate_attachments_folder() {
	let ctx = TestContext::new(
		"\
//- /data/report/report.md
![](img1.png)

text

![shot](img2.png)
//- /data/report/attachments/img1.png
one
//- /data/report/attachments/img2.png
two
//- /data/report/attachments/img3.png
three
",
	);

	let (status, stdout, stderr) = ctx.run(&["rename", "report/report.md", "report/attachments/", "--pattern", "evidence-{n}"]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("Renamed 2 attachment(s)"), "stdout: {stdout}");
	assert!(!stdout.contains("missing"), "stdout: {stdout}");

	assert_eq!(ctx.read("report/report.md").trim_end(), "![](evidence-1.png)\n\ntext\n\n![shot](evidence-2.png)");
	assert_eq!(ctx.read("report/attachments/evidence-1.png").trim_end(), "one");
	assert_eq!(ctx.read("report/attachments/evidence-2.png").trim_end(), "two");
	assert_eq!(ctx.read("report/attachments/img3.png").trim_end(), "three");
	assert!(!ctx.data_exists("report/attachments/img1.png"));
}

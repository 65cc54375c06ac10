//! Renaming the attachments a report file references, and rewriting the references to match.
//!
//! Pattern placeholders:
//! - `{n}`, `[count]`: position of the attachment in the file, from 1 (`[count]` is zero-padded to 3)
//! - `{name}`, `[filename]`: the attachment's current name, without extension
//! - `[caption]`: the image caption
//! - `[section_title]`, `[section_initials]`: from the file's `#[Title]#` field
//! - `{parent}`, `[foldername]`: the folder containing the attachments folder
//!
//! The extension is always kept.

use std::{
	collections::HashMap,
	ops::Range,
	path::{Component, Path, PathBuf},
	sync::LazyLock,
};

use clap::Args;
use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;
use walkdir::WalkDir;

use crate::{
	config::AppConfig,
	error::{DradisError, IoResultExt, Result},
	layout::{clean_filename, file_name},
	markup::{self, Format},
	project::textile_images,
};

/// Rename the attachments referenced by a file, or by every report file below a folder.
#[derive(Args)]
pub struct RenameArgs {
	/// Markdown/textile file, or folder of them
	pub path: PathBuf,

	/// Folder holding the attachments. References are looked up there first, then next to the file
	pub attachments: Option<PathBuf>,

	/// Rename pattern. Defaults to `renaming_format` from the config
	#[arg(short, long)]
	pub pattern: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, derive_new::new)]
pub struct RenamePattern {
	pattern: String,
}

/// What a name is computed from.
#[derive(Clone, Debug, Default)]
pub struct NameContext {
	pub count: usize,
	pub stem: String,
	pub caption: String,
	pub section_title: Option<String>,
	pub folder: String,
}

impl RenamePattern {
	/// New file stem for an attachment.
	pub fn render(&self, ctx: &NameContext) -> String {
		let initials = match &ctx.section_title {
			Some(title) => title.split_whitespace().filter_map(|w| w.chars().next()).flat_map(char::to_uppercase).collect(),
			None => "ZZZ".to_string(),
		};
		let title = ctx.section_title.as_deref().unwrap_or_default().to_lowercase();
		let caption = clean_filename(&ctx.caption);

		[
			("{n}", ctx.count.to_string()),
			("[count]", format!("{:03}", ctx.count)),
			("{name}", ctx.stem.clone()),
			("[filename]", ctx.stem.clone()),
			("[caption]", caption),
			("[section_title]", title),
			("[section_initials]", initials),
			("{parent}", ctx.folder.clone()),
			("[foldername]", ctx.folder.clone()),
		]
		.iter()
		.fold(self.pattern.clone(), |acc, (placeholder, value)| acc.replace(placeholder, value))
	}
}

/// An image reference in a report file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference {
	/// Path as written
	pub path: String,
	/// Byte range of `path` in the file
	pub path_range: Range<usize>,
	pub caption: String,
}

static MARKDOWN_INLINE_IMAGE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)^!\[(?P<caption>.*)\]\(\s*(?:<(?P<angled>[^>\n]*)>|(?P<bare>[^\s)]+))").expect("valid regex"));

/// Inline image references of a markdown document, in order. Images in code are not references.
pub fn markdown_references(content: &str) -> Vec<Reference> {
	Parser::new_ext(content, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS | Options::ENABLE_FOOTNOTES)
		.into_offset_iter()
		.filter_map(|(event, range)| match event {
			Event::Start(Tag::Image { .. }) => {
				let source = &content[range.clone()];
				let caps = MARKDOWN_INLINE_IMAGE.captures(source)?;
				let path = caps.name("angled").or_else(|| caps.name("bare"))?;
				Some(Reference {
					path: path.as_str().to_string(),
					path_range: range.start + path.start()..range.start + path.end(),
					caption: caps["caption"].to_string(),
				})
			}
			_ => None,
		})
		.collect()
}

pub fn textile_references(content: &str) -> Vec<Reference> {
	textile_images(content)
		.into_iter()
		.map(|image| Reference {
			path: image.path,
			path_range: image.path_range,
			caption: image.caption.map(|c| c.trim_start_matches('(').trim_end_matches(')').to_string()).unwrap_or_default(),
		})
		.collect()
}

#[derive(Clone, Debug, Default)]
pub struct RenameReport {
	/// (old, new) absolute paths
	pub renamed: Vec<(PathBuf, PathBuf)>,
	pub missing: Vec<PathBuf>,
	/// (attachment, the existing file its new name would clobber)
	pub collisions: Vec<(PathBuf, PathBuf)>,
	pub rewritten: usize,
}

impl RenameReport {
	fn merge(&mut self, other: RenameReport) {
		self.renamed.extend(other.renamed);
		self.missing.extend(other.missing);
		self.collisions.extend(other.collisions);
		self.rewritten += other.rewritten;
	}
}

/// Rename the attachments `file` references. The counter starts at 1 for every file.
///
/// References resolve inside `attachments` when given, falling back to the file's own folder.
pub fn rename_file(file: &Path, attachments: Option<&Path>, pattern: &RenamePattern) -> Result<RenameReport> {
	let format = Format::of_path(file)
		.filter(|f| f.is_readable())
		.ok_or_else(|| DradisError::layout(file, "only markdown and textile files reference attachments"))?;
	tracing::info!("renaming attachments in {}", file.display());

	let content = std::fs::read_to_string(file).at(file)?;
	let mut references = match format {
		Format::Markdown => markdown_references(&content),
		_ => textile_references(&content),
	};
	references.sort_by_key(|r| r.path_range.start);

	let base = file.parent().unwrap_or(Path::new("."));
	let section_title = markup::title(&content);
	let mut report = RenameReport::default();
	// old absolute path -> new file name
	let mut planned: HashMap<PathBuf, String> = HashMap::new();
	let mut targets: Vec<PathBuf> = Vec::new();
	let mut count = 0;
	// (range, replacement) to apply to the content
	let mut edits: Vec<(Range<usize>, String)> = Vec::new();

	for reference in &references {
		let decoded = urlencoding::decode(&reference.path).map(|p| p.into_owned()).unwrap_or_else(|_| reference.path.clone());
		let source = resolve(&decoded, attachments, base);

		let new_name = match planned.get(&source) {
			Some(name) => name.clone(),
			None => {
				if !source.is_file() {
					tracing::warn!("{} was not found. Is the attachment missing?", source.display());
					report.missing.push(source);
					continue;
				}
				let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
				let folder = source.parent().and_then(Path::parent).map(file_name).unwrap_or_default().to_lowercase();
				let ctx = NameContext {
					count: count + 1,
					stem,
					caption: reference.caption.clone(),
					section_title: section_title.clone(),
					folder,
				};
				let mut name = RenamePattern::render(pattern, &ctx);
				if let Some(ext) = source.extension() {
					name = format!("{name}.{}", ext.to_string_lossy());
				}

				let target = source.with_file_name(&name);
				if target != source && (target.exists() || targets.contains(&target)) {
					tracing::error!("cannot rename {} to {name}: the name is taken", source.display());
					report.collisions.push((source, target));
					continue;
				}
				count += 1;
				targets.push(target.clone());
				if target != source {
					report.renamed.push((source.clone(), target));
				}
				planned.insert(source, name.clone());
				name
			}
		};

		let prefix = match reference.path.rfind('/') {
			Some(i) => &reference.path[..=i],
			None => "",
		};
		let rewritten = format!("{prefix}{}", new_name.replace(' ', "%20"));
		if rewritten != reference.path {
			edits.push((reference.path_range.clone(), rewritten));
		}
	}

	for (old, new) in &report.renamed {
		tracing::debug!("{} -> {}", old.display(), new.display());
		std::fs::rename(old, new).at(old)?;
	}

	if !edits.is_empty() {
		let mut content = content;
		for (range, replacement) in edits.iter().rev() {
			content.replace_range(range.clone(), replacement);
		}
		std::fs::write(file, content).at(file)?;
		report.rewritten = edits.len();
	}
	Ok(report)
}

/// Where a reference points: inside the attachments folder if the file is there, else next to the referencing file.
/// A reference found in neither place resolves to the attachments folder, so that is what gets reported missing.
fn resolve(reference: &str, attachments: Option<&Path>, base: &Path) -> PathBuf {
	let beside = normalize(&base.join(reference));
	match attachments.map(|dir| normalize(&dir.join(reference))) {
		Some(inside) if inside.is_file() || !beside.is_file() => inside,
		_ => beside,
	}
}

/// Resolve `.` and `..` lexically, so that the same attachment reached through different paths compares equal.
fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir if matches!(out.components().next_back(), Some(Component::Normal(_))) => {
				out.pop();
			}
			other => out.push(other),
		}
	}
	out
}

/// `rename_file` on a file, or on every markdown/textile file below a folder.
pub fn rename_path(path: &Path, attachments: Option<&Path>, pattern: &RenamePattern) -> Result<RenameReport> {
	if let Some(dir) = attachments
		&& !dir.is_dir()
	{
		return Err(DradisError::layout(dir, "attachments folder does not exist"));
	}
	if path.is_file() {
		return rename_file(path, attachments, pattern);
	}
	if !path.is_dir() {
		return Err(DradisError::layout(path, "not a folder or file"));
	}

	let files: Vec<PathBuf> = WalkDir::new(path)
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| Format::of_path(p).is_some_and(Format::is_readable))
		.collect();

	let mut report = RenameReport::default();
	for file in files {
		report.merge(rename_file(&file, attachments, pattern)?);
	}
	Ok(report)
}

pub fn rename_command(config: &AppConfig, args: RenameArgs) -> Result<()> {
	let pattern = args
		.pattern
		.or_else(|| config.settings.renaming_format.clone())
		.filter(|p| !p.trim().is_empty())
		.ok_or_else(|| DradisError::Config("no renaming format provided. Set `settings.renaming_format` or pass --pattern".into()))?;
	tracing::debug!("using renaming format: {pattern}");

	let report = rename_path(&args.path, args.attachments.as_deref(), &RenamePattern::new(pattern))?;
	for (old, new) in &report.renamed {
		println!("{} -> {}", file_name(old), file_name(new));
	}
	println!("Renamed {} attachment(s), rewrote {} reference(s)", report.renamed.len(), report.rewritten);
	for missing in &report.missing {
		println!("missing: {}", missing.display());
	}

	if let Some((source, target)) = report.collisions.first() {
		return Err(DradisError::layout(
			target,
			format!("{} attachment(s) not renamed, {} would be overwritten", report.collisions.len(), file_name(source)),
		));
	}
	Ok(())
}

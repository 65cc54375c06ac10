//! Converting project files between formats with pandoc.

mod filter;
mod pandoc;

use std::path::{Path, PathBuf};

use clap::Args;
pub use filter::{LINEBREAK_PLACEHOLDER, mark_linebreaks, restore_linebreaks};
pub use pandoc::{Capability, Converter};
use walkdir::WalkDir;

use crate::{
	error::{ConversionError, DradisError, IoResultExt, Result},
	markup::Format,
};

/// Convert a project file, or every project file in a folder, to another format.
#[derive(Args)]
pub struct ConvertArgs {
	/// File or folder to convert
	pub path: PathBuf,
	/// Target format
	pub format: Format,
}

/// Outcome of converting a batch of files.
#[derive(Debug, Default)]
pub struct ConversionReport {
	pub converted: Vec<PathBuf>,
	pub failed: Vec<(PathBuf, DradisError)>,
}

/// Convert one file, writing the output next to it with the target extension.
/// Returns the path of the output. With `replace`, the input is removed afterwards.
pub fn convert_file(converter: &Converter, path: &Path, to: Format, replace: bool) -> Result<PathBuf> {
	let from = Format::of_path(path)
		.filter(|f| f.is_readable())
		.ok_or_else(|| ConversionError::Unsupported {
			from: path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default(),
			to: to.to_string(),
		})?;
	if from == to {
		tracing::debug!(?path, "no conversion needed");
		return Ok(path.to_path_buf());
	}

	let output = path.with_extension(to.extension());
	let content = std::fs::read_to_string(path).at(path)?;
	tracing::debug!("{} --> {}", path.display(), output.display());

	let dir = path.parent().unwrap_or(Path::new("."));
	let tmp = tempfile::NamedTempFile::new_in(dir).at(dir)?;
	if to.is_binary() {
		converter.convert_to_file(&content, from, to, tmp.path())?;
	} else {
		let converted = converter.convert_text(&content, from, to)?;
		std::fs::write(tmp.path(), converted).at(tmp.path())?;
	}
	tmp.persist(&output).map_err(|e| DradisError::Io {
		path: output.clone(),
		source: e.error,
	})?;

	if replace {
		std::fs::remove_file(path).at(path)?;
	}
	Ok(output)
}

/// Convert a file, or every readable file below a folder. A failing file doesn't stop the batch.
pub fn convert_path(converter: &Converter, path: &Path, to: Format) -> Result<ConversionReport> {
	let mut report = ConversionReport::default();

	if path.is_file() {
		let output = convert_file(converter, path, to, false)?;
		report.converted.push(output);
		return Ok(report);
	}
	if !path.is_dir() {
		return Err(DradisError::layout(path, "not a folder or file"));
	}

	tracing::debug!("converting files in {} to {to}", path.display());
	let files = WalkDir::new(path)
		.sort_by_file_name()
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| Format::of_path(p).is_some_and(|f| f.is_readable() && f != to));

	for file in files {
		match convert_file(converter, &file, to, false) {
			Ok(output) => report.converted.push(output),
			Err(e) => {
				tracing::warn!("could not convert {}: {e}", file.display());
				report.failed.push((file, e));
			}
		}
	}
	Ok(report)
}

pub fn convert_command(args: ConvertArgs) -> Result<()> {
	let converter = Converter::default();
	converter.ensure_available()?;

	let report = convert_path(&converter, &args.path, args.format)?;
	for output in &report.converted {
		println!("{}", output.display());
	}
	if report.failed.is_empty() {
		println!("Converted {} file(s) to {}", report.converted.len(), args.format);
		return Ok(());
	}

	println!("\n{} file(s) failed to convert:", report.failed.len());
	for (file, e) in &report.failed {
		println!("  {}: {e}", file.display());
	}
	Err(ConversionError::Batch {
		failed: report.failed.len(),
		total: report.failed.len() + report.converted.len(),
	}
	.into())
}

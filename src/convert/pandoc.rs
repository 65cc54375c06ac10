//! Driving the `pandoc` binary.

use std::{
	cell::Cell,
	io::{IsTerminal, Write},
	path::{Path, PathBuf},
	process::{Command, Stdio},
};

use super::filter::{mark_linebreaks, restore_linebreaks};
use crate::{
	error::{ConversionError, Result},
	markup::{self, Format},
};

/// Whether the converter can be used, as found by the pre-flight check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Capability {
	Available { version: String },
	Missing,
}

pub struct Converter {
	program: PathBuf,
	checked: Cell<bool>,
	/// Offer to install pandoc when it is missing
	interactive: bool,
}

/// `pandoc` from PATH, offering to install it when missing.
impl Default for Converter {
	fn default() -> Self {
		Self {
			interactive: true,
			..Self::new("pandoc")
		}
	}
}

impl Converter {
	/// A converter running `program`, that never prompts.
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			checked: Cell::new(false),
			interactive: false,
		}
	}

	/// Pre-flight check, without side effects.
	pub fn check(&self) -> Capability {
		match Command::new(&self.program).arg("--version").output() {
			Ok(out) if out.status.success() => {
				let version = String::from_utf8_lossy(&out.stdout).lines().next().unwrap_or_default().trim().to_string();
				Capability::Available { version }
			}
			_ => Capability::Missing,
		}
	}

	/// Make sure pandoc is usable, offering to install it when it isn't. Only checks once.
	pub fn ensure_available(&self) -> Result<()> {
		if self.checked.get() {
			return Ok(());
		}
		if let Capability::Available { version } = self.check() {
			tracing::debug!(%version, program = ?self.program, "pandoc found");
			self.checked.set(true);
			return Ok(());
		}

		tracing::warn!("pandoc is not installed or not detected in PATH");
		if self.interactive && std::io::stdin().is_terminal() && confirm("Do you want to install it now? [Y/n] ") {
			install_pandoc();
		}

		match self.check() {
			Capability::Available { .. } => {
				self.checked.set(true);
				Ok(())
			}
			Capability::Missing => Err(ConversionError::ConverterMissing.into()),
		}
	}

	/// Convert markup text. Converting a format to itself returns the input unchanged.
	pub fn convert_text(&self, text: &str, from: Format, to: Format) -> Result<String> {
		if from == to {
			return Ok(text.to_string());
		}
		ensure_convertible(from, to)?;
		if to.is_binary() {
			return Err(ConversionError::Unsupported {
				from: from.to_string(),
				to: to.to_string(),
			}
			.into());
		}
		self.ensure_available()?;

		let ast = self.to_filtered_ast(text, from)?;
		let written = self.run(&["-f", "json", "-t", to.pandoc_writer(), "--wrap=none"], &ast)?;
		let mut output = markup::unescape_pandoc(&restore_linebreaks(&written, to));
		if to == Format::Textile {
			output = markup::unescape_html(&output);
		}
		Ok(output)
	}

	/// Convert markup text into a binary document written at `out`.
	pub fn convert_to_file(&self, text: &str, from: Format, to: Format, out: &Path) -> Result<()> {
		ensure_convertible(from, to)?;
		self.ensure_available()?;

		let ast = self.to_filtered_ast(text, from)?;
		let out = out.to_string_lossy();
		self.run(&["-f", "json", "-t", to.pandoc_writer(), "--wrap=none", "-o", &out], &ast)?;
		Ok(())
	}

	fn to_filtered_ast(&self, text: &str, from: Format) -> Result<String> {
		let raw = self.run(&["-f", from.pandoc_reader(), "-t", "json"], &markup::space_fields(text))?;
		let mut ast: serde_json::Value = serde_json::from_str(&raw)?;
		let marked = mark_linebreaks(&mut ast);
		tracing::trace!(marked, "line breaks marked");
		Ok(serde_json::to_string(&ast)?)
	}

	fn run(&self, args: &[&str], input: &str) -> Result<String> {
		tracing::debug!(?args, "running pandoc");
		let mut child = Command::new(&self.program)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| match e.kind() {
				std::io::ErrorKind::NotFound => ConversionError::ConverterMissing,
				_ => ConversionError::Failed { stderr: e.to_string() },
			})?;

		if let Some(mut stdin) = child.stdin.take() {
			stdin.write_all(input.as_bytes()).map_err(|e| ConversionError::Failed {
				stderr: format!("failed to write to pandoc stdin: {e}"),
			})?;
		}

		let output = child.wait_with_output().map_err(|e| ConversionError::Failed { stderr: e.to_string() })?;
		if !output.status.success() {
			return Err(ConversionError::Failed {
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			}
			.into());
		}
		String::from_utf8(output.stdout).map_err(|e| ConversionError::Failed { stderr: format!("invalid UTF-8 from pandoc: {e}") }.into())
	}
}

fn ensure_convertible(from: Format, to: Format) -> Result<()> {
	if !from.is_readable() {
		return Err(ConversionError::Unsupported {
			from: from.to_string(),
			to: to.to_string(),
		}
		.into());
	}
	Ok(())
}

fn confirm(question: &str) -> bool {
	loop {
		print!("{question}");
		std::io::stdout().flush().ok();
		let mut input = String::new();
		if std::io::stdin().read_line(&mut input).is_err() {
			return false;
		}
		match input.trim().to_lowercase().as_str() {
			"" | "y" | "yes" => return true,
			"n" | "no" => return false,
			_ => continue,
		}
	}
}

fn install_pandoc() {
	let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
		("brew", &["install", "pandoc"])
	} else if cfg!(target_os = "windows") {
		("choco", &["install", "pandoc"])
	} else {
		("sudo", &["apt-get", "install", "-y", "pandoc"])
	};
	println!("Running: {program} {}", args.join(" "));
	match Command::new(program).args(args).status() {
		Ok(status) if status.success() => println!("pandoc installed"),
		_ => tracing::error!("pandoc install could not be fully completed. Check if it is correctly installed with 'pandoc -v'"),
	}
}

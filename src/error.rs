//! Error types shared by every command.
//!
//! Uses miette for diagnostics; the binary renders them through color-eyre.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T, E = DradisError> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum DradisError {
	#[error("{what} not found")]
	#[diagnostic(code(dradismd::not_found), help("check the id/title, and that your API token has access to it"))]
	NotFound { what: String },

	#[error("cannot access {}", path.display())]
	#[diagnostic(code(dradismd::io))]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("unexpected project layout at {}: {reason}", path.display())]
	#[diagnostic(code(dradismd::layout), help("expected `Content Blocks/`, `Issues/`, `Nodes/<node>/Evidences/<issue>/` and `document_properties.ini`"))]
	Layout { path: PathBuf, reason: String },

	#[error(transparent)]
	#[diagnostic(transparent)]
	Conversion(#[from] ConversionError),

	#[error("Dradis answered {status}: {body}")]
	#[diagnostic(code(dradismd::remote))]
	Remote { status: u16, body: String },

	#[error("request to Dradis failed")]
	#[diagnostic(code(dradismd::http), help("is `instance_url` reachable?"))]
	Http(#[from] reqwest::Error),

	#[error("unexpected payload from Dradis")]
	#[diagnostic(code(dradismd::payload))]
	Payload(#[from] serde_json::Error),

	#[error("invalid configuration: {0}")]
	#[diagnostic(code(dradismd::config))]
	Config(String),

	#[error("{0}")]
	#[diagnostic(code(dradismd::args))]
	InvalidArgument(String),
}

impl DradisError {
	pub fn not_found(what: impl Into<String>) -> Self {
		Self::NotFound { what: what.into() }
	}

	pub fn layout(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
		Self::Layout {
			path: path.into(),
			reason: reason.into(),
		}
	}
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ConversionError {
	#[error("pandoc is not installed or not in PATH")]
	#[diagnostic(
		code(dradismd::convert::missing),
		help("install it with one of:\n  sudo apt-get install pandoc\n  brew install pandoc\n  choco install pandoc\nmore info: https://pandoc.org/installing.html")
	)]
	ConverterMissing,

	#[error("cannot convert from {from} to {to}")]
	#[diagnostic(code(dradismd::convert::unsupported), help("readable formats are textile (.textile) and markdown (.md)"))]
	Unsupported { from: String, to: String },

	#[error("pandoc failed: {stderr}")]
	#[diagnostic(code(dradismd::convert::failed), help("is this a valid markup file (md/textile)?"))]
	Failed { stderr: String },

	#[error("{failed} of {total} file(s) failed to convert")]
	#[diagnostic(code(dradismd::convert::batch))]
	Batch { failed: usize, total: usize },
}

/// Attach the offending path to an io error.
pub trait IoResultExt<T> {
	fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
	fn at(self, path: impl Into<PathBuf>) -> Result<T> {
		self.map_err(|source| DradisError::Io { path: path.into(), source })
	}
}

//! User configuration: Dradis credentials and local preferences.
//!
//! Read from `$XDG_CONFIG_HOME/dradismd/config.toml` (or `--config <path>`, any format the `config`
//! crate infers from the extension), overridable with `DRADISMD_<SECTION>__<KEY>` env vars.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smart_default::SmartDefault;

use crate::{
	error::{DradisError, Result},
	markup::Format,
};

pub const APP_NAME: &str = "dradismd";
pub const CONFIG_FILENAME: &str = "config.toml";
const API_TOKEN_LEN: usize = 20;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
	#[serde(default)]
	pub dradis: DradisSection,
	#[serde(default)]
	pub settings: Settings,
	/// Where the config was read from; template paths are relative to it.
	#[serde(skip)]
	pub source: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DradisSection {
	#[serde(default)]
	pub instance_url: String,
	#[serde(default)]
	pub api_token: String,
}

#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
	#[default(_code = "String::from(\"textile\")")]
	pub preferred_format: String,
	/// Attachment rename pattern, see `rename::RenamePattern`.
	pub renaming_format: Option<String>,
	/// Empty: default verification. `"false"`: disabled. Otherwise a PEM file to trust.
	pub ssl_certificate: String,
	/// Comma-separated project custom fields shown by `projects`.
	pub custom_fields: String,
	pub issue_template: Option<PathBuf>,
	pub evidence_template: Option<PathBuf>,
}

/// How to verify the instance's TLS certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TlsVerification {
	Default,
	Disabled,
	ExtraRoot(PathBuf),
}

impl AppConfig {
	/// Load from an explicit path, or the XDG default location.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		let path = match explicit {
			Some(p) => p.to_path_buf(),
			None => default_config_path().ok_or_else(|| DradisError::Config(format!("no config file found. Create `{APP_NAME}/{CONFIG_FILENAME}` in your XDG config dir, or pass --config")))?,
		};
		Self::from_path(&path)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		if !path.is_file() {
			return Err(DradisError::Config(format!("the config file {} is missing", path.display())));
		}
		let raw = config::Config::builder()
			.add_source(config::File::from(path))
			.add_source(config::Environment::with_prefix("DRADISMD").prefix_separator("_").separator("__"))
			.build()
			.map_err(|e| DradisError::Config(e.to_string()))?;
		let mut cfg: AppConfig = raw.try_deserialize().map_err(|e| DradisError::Config(e.to_string()))?;
		cfg.source = Some(path.to_path_buf());
		tracing::debug!(?path, "loaded config");
		Ok(cfg)
	}

	/// Checks required before talking to Dradis.
	pub fn require_remote(&self) -> Result<()> {
		if self.dradis.instance_url.trim().is_empty() {
			return Err(DradisError::Config("`dradis.instance_url` is not set".into()));
		}
		url::Url::parse(&self.dradis.instance_url).map_err(|e| DradisError::Config(format!("`dradis.instance_url` is not a valid url: {e}")))?;
		if self.dradis.api_token.len() != API_TOKEN_LEN {
			return Err(DradisError::Config("invalid or missing Dradis API token".into()));
		}
		Ok(())
	}

	/// The preferred local format, falling back to textile when unsupported.
	pub fn preferred_format(&self) -> Format {
		match Format::from_name(&self.settings.preferred_format) {
			Some(f) if f.is_readable() => f,
			_ => {
				tracing::warn!("{} is not supported as preferred_format, using textile", self.settings.preferred_format);
				Format::Textile
			}
		}
	}

	pub fn tls_verification(&self) -> TlsVerification {
		let value = self.settings.ssl_certificate.trim();
		if value.is_empty() {
			TlsVerification::Default
		} else if value.eq_ignore_ascii_case("false") {
			tracing::warn!("DISABLING SSL VERIFICATION. Should only be used for testing");
			TlsVerification::Disabled
		} else if Path::new(value).is_file() {
			TlsVerification::ExtraRoot(PathBuf::from(value))
		} else {
			tracing::warn!("the SSL certificate {value} was not found, enabling default SSL behavior");
			TlsVerification::Default
		}
	}

	pub fn custom_fields(&self) -> Vec<String> {
		self.settings.custom_fields.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
	}

	pub fn issue_template(&self) -> PathBuf {
		self.template(self.settings.issue_template.as_deref(), "issue_template.textile")
	}

	pub fn evidence_template(&self) -> PathBuf {
		self.template(self.settings.evidence_template.as_deref(), "evidence_template.textile")
	}

	fn template(&self, configured: Option<&Path>, default_name: &str) -> PathBuf {
		let dir = self.source.as_deref().and_then(Path::parent).unwrap_or(Path::new("."));
		match configured {
			Some(p) if p.is_absolute() => p.to_path_buf(),
			Some(p) => dir.join(p),
			None => dir.join(default_name),
		}
	}
}

pub fn default_config_path() -> Option<PathBuf> {
	xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, content).unwrap();
		(dir, path)
	}

	#[test]
	fn parses_sections_and_defaults() {
		let (_dir, path) = write_config(
			r#"
			[dradis]
			instance_url = "https://dradis.example.com"
			api_token = "abcdefghij0123456789"

			[settings]
			renaming_format = "evidence-{n}"
			custom_fields = "Start date, , Status"
			"#,
		);
		let cfg = AppConfig::from_path(&path).unwrap();
		assert!(cfg.require_remote().is_ok());
		assert_eq!(cfg.preferred_format(), Format::Textile);
		assert_eq!(cfg.settings.renaming_format.as_deref(), Some("evidence-{n}"));
		assert_eq!(cfg.custom_fields(), vec!["Start date".to_string(), "Status".to_string()]);
		assert_eq!(cfg.tls_verification(), TlsVerification::Default);
		assert_eq!(cfg.issue_template(), path.parent().unwrap().join("issue_template.textile"));
	}

	#[test]
	fn rejects_short_token() {
		let (_dir, path) = write_config("[dradis]\ninstance_url = \"https://dradis.example.com\"\napi_token = \"short\"\n");
		let cfg = AppConfig::from_path(&path).unwrap();
		assert!(matches!(cfg.require_remote(), Err(DradisError::Config(_))));
	}

	#[test]
	fn unsupported_preferred_format_falls_back() {
		let (_dir, path) = write_config("[settings]\npreferred_format = \"pdf\"\nssl_certificate = \"false\"\n");
		let cfg = AppConfig::from_path(&path).unwrap();
		assert_eq!(cfg.preferred_format(), Format::Textile);
		assert_eq!(cfg.tls_verification(), TlsVerification::Disabled);
	}

	#[test]
	fn missing_file_is_config_error() {
		let err = AppConfig::from_path(Path::new("/nonexistent/dradismd/config.toml")).unwrap_err();
		assert!(matches!(err, DradisError::Config(_)));
	}
}

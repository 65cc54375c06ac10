//! Shared test infrastructure for integration tests.
//!
//! `TestContext` runs the compiled binary against a temporary XDG tree, with the remote
//! replaced by the mock client (`--mock`), whose state lives in a JSON file next to the config.
//!
//! # Example
//!
//! ```ignore
//! let ctx = TestContext::new("//- /data/Acme/Issues/XSS.textile\n#[Title]#\nXSS\n").with_remote(state);
//! let (status, stdout, stderr) = ctx.run(&["update", "7", "Acme"]);
//! assert!(status.success());
//! ```

use std::{
	path::PathBuf,
	process::{Command, ExitStatus},
};

use dradismd::dradis::{MOCK_STATE_ENV, MockState};
use v_fixtures::{Fixture, fs_standards::xdg::Xdg};

pub const API_TOKEN: &str = "abcdefghij0123456789";

pub struct TestContext {
	/// The Xdg wrapper managing temp directories
	pub xdg: Xdg,
	pub config_path: PathBuf,
	/// Remote state read and written by the mock client
	pub mock_state_path: PathBuf,
}

impl TestContext {
	/// Create a context from a fixture string, with a valid config and an empty remote.
	///
	/// Project trees go under `/data/`, and commands run from the data directory.
	pub fn new(fixture_str: &str) -> Self {
		let fixture = Fixture::parse(fixture_str);
		let xdg = Xdg::new(fixture.write_to_tempdir(), env!("CARGO_PKG_NAME"));

		let config_path = xdg.inner.root.join("config.toml");
		let mock_state_path = xdg.inner.root.join("mock_state.json");
		let ctx = Self { xdg, config_path, mock_state_path };
		ctx.write_config("");
		ctx.set_remote(&MockState::default());
		ctx
	}

	pub fn with_remote(self, state: serde_json::Value) -> Self {
		let state: MockState = serde_json::from_value(state).unwrap();
		self.set_remote(&state);
		self
	}

	/// Replace the config, keeping the connection settings. `settings` is the body of its `[settings]` table.
	pub fn write_config(&self, settings: &str) {
		let content = format!("[dradis]\ninstance_url = \"https://dradis.example.com\"\napi_token = \"{API_TOKEN}\"\n\n[settings]\n{settings}\n");
		std::fs::write(&self.config_path, content).unwrap();
	}

	/// Write a file next to the config (templates live there by default).
	pub fn write_config_dir(&self, name: &str, content: &str) {
		std::fs::write(self.xdg.inner.root.join(name), content).unwrap();
	}

	pub fn set_remote(&self, state: &MockState) {
		std::fs::write(&self.mock_state_path, serde_json::to_string_pretty(state).unwrap()).unwrap();
	}

	pub fn remote(&self) -> MockState {
		serde_json::from_str(&std::fs::read_to_string(&self.mock_state_path).unwrap()).unwrap()
	}

	/// Run the binary from the data directory, against the mock remote.
	///
	/// Returns (exit_status, stdout, stderr) for easy assertions.
	pub fn run(&self, args: &[&str]) -> (ExitStatus, String, String) {
		let mut cmd = Command::new(env!("CARGO_BIN_EXE_dradismd"));
		cmd.arg("--mock").arg("--config").arg(&self.config_path).args(args);
		cmd.current_dir(self.data_dir());
		for (key, value) in self.xdg.env_vars() {
			cmd.env(key, value);
		}
		cmd.env(MOCK_STATE_ENV, &self.mock_state_path);
		cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
		let output = cmd.output().unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	/// Read a file from the data directory.
	pub fn read(&self, relative_path: &str) -> String {
		self.xdg.read_data(relative_path.trim_start_matches('/'))
	}

	/// Write a file to the data directory.
	pub fn write(&self, relative_path: &str, content: &str) {
		self.xdg.write_data(relative_path.trim_start_matches('/'), content);
	}

	/// Check if a file exists in the data directory.
	pub fn data_exists(&self, relative_path: &str) -> bool {
		self.xdg.data_exists(relative_path.trim_start_matches('/'))
	}

	pub fn data_dir(&self) -> PathBuf {
		self.xdg.data_dir()
	}
}

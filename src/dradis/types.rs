use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Project {
	pub id: u64,
	pub name: String,
	/// Called `client` on older Dradis versions.
	#[serde(default, alias = "client")]
	pub team: Option<NamedRef>,
	#[serde(default)]
	pub owners: Vec<Owner>,
	pub updated_at: Timestamp,
	#[serde(default)]
	pub custom_fields: Vec<CustomField>,
}

impl Project {
	pub fn team_name(&self) -> Option<&str> {
		self.team.as_ref().map(|t| t.name.as_str())
	}

	pub fn custom_field(&self, name: &str) -> Option<&str> {
		self.custom_fields.iter().find(|f| f.name == name).and_then(|f| f.value.as_deref())
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NamedRef {
	#[serde(default)]
	pub id: Option<u64>,
	pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Owner {
	pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CustomField {
	pub name: String,
	#[serde(default)]
	pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContentBlock {
	pub id: u64,
	#[serde(default)]
	pub fields: BTreeMap<String, String>,
	pub content: String,
	#[serde(default)]
	pub block_group: Option<String>,
}

impl ContentBlock {
	pub fn title(&self) -> Option<&str> {
		self.fields.get("Title").map(String::as_str)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Issue {
	pub id: u64,
	pub title: String,
	pub text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Node {
	pub id: u64,
	pub label: String,
	#[serde(default)]
	pub type_id: Option<u64>,
	#[serde(default)]
	pub evidence: Vec<Evidence>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Evidence {
	pub id: u64,
	pub content: String,
	pub issue: IssueRef,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssueRef {
	pub id: u64,
	pub title: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Attachment {
	pub filename: String,
}

/// Entry of the issue library. `content` is only filled when fetching a single entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LibraryEntry {
	pub id: u64,
	pub title: String,
	#[serde(default)]
	pub content: Option<String>,
}

/// Dradis answers document properties as a list of single-key objects.
pub type DocumentProperties = BTreeMap<String, String>;

/// Response of a create call; only the id matters to us.
#[derive(Clone, Debug, Deserialize)]
pub struct Created {
	pub id: u64,
}

//! Mirroring a Dradis project to a local folder and back.

mod attachments;
mod command;
mod fetch;
mod list;
mod properties;
mod push;

pub use attachments::{ImageRef, attachments_url, textile_images, upload_referenced};
pub use command::{GetArgs, ProjectsArgs, UpdateArgs, get_command, projects_command, update_command};
pub use fetch::fetch_project;
pub use list::{ProjectField, ProjectFilter, list_projects, select_projects, time_ago};
pub use properties::{parse_properties, render_properties};
pub use push::{PushSummary, push_project};

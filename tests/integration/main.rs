//! Integration tests entry point, following https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod add_issue;
mod common;
mod projects;
mod rename;
mod sync;

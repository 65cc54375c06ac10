//! Sync Dradis Pro report projects with a local folder of textile/markdown files.

pub mod config;
pub mod convert;
pub mod dradis;
pub mod error;
pub mod layout;
pub mod library;
pub mod markup;
pub mod output;
pub mod project;
pub mod rename;

pub use error::{ConversionError, DradisError, Result};
pub use layout::EntityPath;
pub use markup::Format;

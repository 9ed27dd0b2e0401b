//! Utility modules shared by the generator and the dev server.

pub mod browser;
pub mod mime;
pub mod path;
pub mod plural;

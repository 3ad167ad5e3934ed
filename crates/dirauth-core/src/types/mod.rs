//! Core types for Dirauth

mod catalog;
mod credential;
mod entry;
mod provider;
mod result;

pub use catalog::*;
pub use credential::*;
pub use entry::*;
pub use provider::*;
pub use result::*;

//! Tree-shaking linker for kOS KerboScript libraries
//!
//! Given an entry script that imports libraries and calls their functions as
//! `lib:func(...)`, the linker finds every library function reachable from
//! the script, and emits one self-contained script holding only those
//! functions, renamed to flat `lib_func` identifiers, followed by the script.

pub mod config;
pub mod discovery;
pub mod error;
pub mod flatten;
pub mod library;
pub mod linker;
pub mod reachability;
pub mod registry;
pub mod scanner;

pub use config::Conventions;
pub use error::{LinkError, Result};
pub use linker::{LinkOutput, LinkStats, Linker};
pub use reachability::{CallSite, UnimportedCall};

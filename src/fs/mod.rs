//! Thin synchronous file helpers (spec §10 "fs").

mod file;

pub use file::{remove, File, OpenFlags};

//! Helpers behind the `depcon` binary.
//!
//! `main.rs` owns argument parsing; the file handling and the batch check live
//! here so they can be unit tested without spawning the binary.

pub mod check;
pub mod refactor_apply;

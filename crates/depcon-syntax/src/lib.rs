//! Class-level syntax model for C#-family source files.
//!
//! This crate provides:
//! - the tree model the refactorings operate on (`ClassNode`, `Member`, ...)
//! - a comment/string aware declaration parser that also records a source
//!   layout for splicing edits back into the original text
//! - a renderer for nodes that have no source text yet

pub mod ast;
mod parser;
pub mod render;
mod scan;
mod text;

pub use ast::*;
pub use parser::{
    parse_class, parse_source, BlockLayout, CallableLayout, ClassLayout, MemberLayout,
    ParseError, ParsedClass, SourceFile,
};
pub use render::MemberStyle;
pub use text::{line_indent, line_number, line_start, starts_line, TextRange};

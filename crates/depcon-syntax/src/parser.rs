//! A small, best-effort declaration parser for C#-style classes.
//!
//! It recognizes class declarations anywhere in a file (including nested
//! classes and classes inside namespaces), splits their bodies into members,
//! and parses fields, constructors and methods deeply enough for the
//! refactorings. Everything else is kept as [`Member::Other`]. Parsing never
//! fails on odd input; unrecognized text simply stays opaque.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::ast::{
    Body, ClassNode, ConstructorMember, FieldMember, FieldVariable, Member, MethodMember,
    OpaqueText, Parameter, Statement, TypeRef,
};
use crate::scan::{
    blank_trivia, contains_word, find_top_level_eq, is_boundary, is_ident_char_byte,
    matching_close, skip_ws, split_top_level_commas,
};
use crate::text::TextRange;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no class declaration found")]
    NoClass,
    #[error("class declaration at offset {offset} has unbalanced braces")]
    Unbalanced { offset: usize },
}

/// Source positions for one parsed class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLayout {
    /// From the first attribute/modifier through the closing brace.
    pub range: TextRange,
    /// From the first attribute/modifier up to (excluding) the opening brace.
    pub header: TextRange,
    pub body_open: usize,
    pub body_close: usize,
    pub members: Vec<MemberLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberLayout {
    /// The member text, without leading trivia.
    pub range: TextRange,
    /// Modifiers, return type, name and parameter list (no attributes, no body).
    pub signature: TextRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callable: Option<CallableLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallableLayout {
    /// Modifiers and return type, up to the member name.
    pub prefix: TextRange,
    pub params_open: usize,
    pub params_close: usize,
    pub params: Vec<TextRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BlockLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockLayout {
    pub open: usize,
    pub close: usize,
    pub statements: Vec<TextRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    pub node: ClassNode,
    pub layout: ClassLayout,
    /// Number of enclosing classes (0 for a top-level or namespace-level class).
    pub nesting: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    /// Every class in the file, in source order of their `class` keyword.
    pub classes: Vec<ParsedClass>,
}

impl SourceFile {
    pub fn class_named(&self, name: &str) -> Option<&ParsedClass> {
        self.classes.iter().find(|class| class.node.name == name)
    }
}

/// Parses every class declaration in `text`.
pub fn parse_source(text: &str) -> SourceFile {
    let code = blank_trivia(text);
    let bytes = code.as_bytes();
    let mut classes: Vec<ParsedClass> = Vec::new();

    let mut search = 0usize;
    while let Some(rel) = code[search..].find("class") {
        let idx = search + rel;
        search = idx + "class".len();
        if !(idx == 0 || is_boundary(bytes, idx - 1)) || !is_boundary(bytes, idx + 5) {
            continue;
        }
        if let Some(class) = parse_class_at(text, &code, idx) {
            classes.push(class);
        }
    }

    for idx in 0..classes.len() {
        let range = classes[idx].layout.range;
        let nesting = classes
            .iter()
            .filter(|outer| outer.layout.range != range && outer.layout.range.contains_range(range))
            .count();
        classes[idx].nesting = nesting;
    }

    tracing::trace!(target = "depcon.syntax", classes = classes.len(), "parsed source");
    SourceFile { classes }
}

/// Parses the first class declaration in `text`.
pub fn parse_class(text: &str) -> Result<ParsedClass, ParseError> {
    if let Some(class) = parse_source(text).classes.into_iter().next() {
        return Ok(class);
    }
    let code = blank_trivia(text);
    match code.find("class") {
        Some(offset) if code[offset..].contains('{') => Err(ParseError::Unbalanced { offset }),
        _ => Err(ParseError::NoClass),
    }
}

const TYPE_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "abstract", "sealed", "partial",
    "unsafe", "new", "file", "readonly",
];

const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "readonly", "const", "volatile",
    "unsafe", "new", "virtual", "override", "abstract", "sealed", "extern", "async", "partial",
    "required", "fixed", "ref",
];

const PARAMETER_MODIFIERS: &[&str] = &["ref", "out", "in", "params", "this", "scoped"];

fn parse_class_at(source: &str, code: &str, class_kw: usize) -> Option<ParsedClass> {
    let bytes = code.as_bytes();

    let name_start = skip_ws(bytes, class_kw + 5, bytes.len());
    let mut idx = name_start;
    while idx < bytes.len() && is_ident_char_byte(bytes[idx]) {
        idx += 1;
    }
    let name = code.get(name_start..idx)?.to_string();
    // `where T : class` constraints are not declarations.
    if name.is_empty() || name == "where" {
        return None;
    }

    idx = skip_ws(bytes, idx, bytes.len());
    let type_params = if bytes.get(idx) == Some(&b'<') {
        let close = matching_close(bytes, idx, b'<', b'>')?;
        let tp = source[idx..=close].to_string();
        idx = close + 1;
        Some(tp)
    } else {
        None
    };

    // Base list, primary constructor and constraints up to the body.
    let tail_start = idx;
    let mut depth = 0usize;
    while idx < bytes.len() {
        match bytes[idx] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'{' if depth == 0 => break,
            b';' | b'}' if depth == 0 => return None,
            _ => {}
        }
        idx += 1;
    }
    let body_open = idx;
    if body_open >= bytes.len() {
        return None;
    }
    let body_close = matching_close(bytes, body_open, b'{', b'}')?;
    let bases = Some(source[tail_start..body_open].trim())
        .filter(|tail| !tail.is_empty())
        .map(OpaqueText::new);

    let decl_start = declaration_start(bytes, class_kw);
    let modifiers = leading_words(code, decl_start, class_kw)
        .into_iter()
        .filter(|word| TYPE_MODIFIERS.contains(&word.as_str()))
        .collect();

    let mut members = Vec::new();
    let mut member_layouts = Vec::new();
    for (start, end) in split_members(bytes, body_open + 1, body_close) {
        let (member, layout) = classify_member(source, code, start, end, &name);
        members.push(member);
        member_layouts.push(layout);
    }

    Some(ParsedClass {
        node: ClassNode {
            name,
            type_params,
            modifiers,
            bases,
            members,
        },
        layout: ClassLayout {
            range: TextRange::new(decl_start, body_close + 1),
            header: TextRange::new(decl_start, body_open),
            body_open,
            body_close,
            members: member_layouts,
        },
        nesting: 0,
    })
}

/// Walks back from the `class` keyword over modifiers and attributes to the
/// previous `;`, `{` or `}`.
fn declaration_start(code: &[u8], class_kw: usize) -> usize {
    let mut idx = class_kw;
    let mut bracket_depth = 0usize;
    while idx > 0 {
        let b = code[idx - 1];
        match b {
            b']' => bracket_depth += 1,
            b'[' => bracket_depth = bracket_depth.saturating_sub(1),
            b';' | b'{' | b'}' if bracket_depth == 0 => break,
            _ => {}
        }
        idx -= 1;
    }
    skip_ws(code, idx, class_kw)
}

/// Identifier words in `code[start..end]` outside of attribute brackets.
fn leading_words(code: &str, start: usize, end: usize) -> Vec<String> {
    let bytes = code.as_bytes();
    let mut words = Vec::new();
    let mut idx = start;
    let mut bracket_depth = 0usize;
    while idx < end {
        let b = bytes[idx];
        match b {
            b'[' => bracket_depth += 1,
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if bracket_depth == 0 && is_ident_char_byte(b) => {
                let word_start = idx;
                while idx < end && is_ident_char_byte(bytes[idx]) {
                    idx += 1;
                }
                words.push(code[word_start..idx].to_string());
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    words
}

/// Splits a class body into member ranges (leading whitespace/trivia excluded).
///
/// A member ends at a top-level `;`, or at the `}` closing a top-level block
/// unless that block belongs to an initializer or expression body, in which
/// case the member runs to its `;`. Property initializers after an accessor
/// block (`{ get; } = 5;`) are kept with their property.
fn split_members(code: &[u8], start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut members = Vec::new();
    let mut member_start = start;
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut block_in_expression = false;
    let mut idx = start;

    while idx < end {
        match code[idx] {
            b'(' | b'[' => paren_depth += 1,
            b')' | b']' => paren_depth = paren_depth.saturating_sub(1),
            b'{' => {
                if brace_depth == 0 && paren_depth == 0 && !block_in_expression {
                    block_in_expression = find_top_level_eq(code, member_start, idx).is_some();
                }
                brace_depth += 1;
            }
            b'}' => {
                brace_depth = brace_depth.saturating_sub(1);
                if brace_depth == 0 && paren_depth == 0 && !block_in_expression {
                    let next = skip_ws(code, idx + 1, end);
                    if next < end && code[next] == b'=' && code.get(next + 1) != Some(&b'=') {
                        block_in_expression = true;
                    } else {
                        push_member(code, &mut members, member_start, idx + 1);
                        member_start = idx + 1;
                    }
                }
            }
            b';' if brace_depth == 0 && paren_depth == 0 => {
                push_member(code, &mut members, member_start, idx + 1);
                member_start = idx + 1;
                block_in_expression = false;
            }
            _ => {}
        }
        idx += 1;
    }

    // Trailing text without a terminator (broken code) is still a member.
    push_member(code, &mut members, member_start, end);
    members
}

fn push_member(code: &[u8], members: &mut Vec<(usize, usize)>, start: usize, end: usize) {
    let start = skip_ws(code, start, end);
    if start >= end || (end - start == 1 && code[start] == b';') {
        return;
    }
    members.push((start, end));
}

fn skip_attributes(code: &[u8], mut idx: usize, end: usize) -> usize {
    loop {
        idx = skip_ws(code, idx, end);
        if idx < end && code[idx] == b'[' {
            match matching_close(&code[..end], idx, b'[', b']') {
                Some(close) => idx = close + 1,
                None => return idx,
            }
        } else {
            return idx;
        }
    }
}

fn classify_member(
    source: &str,
    code: &str,
    start: usize,
    end: usize,
    class_name: &str,
) -> (Member, MemberLayout) {
    let bytes = code.as_bytes();
    let sig_start = skip_attributes(bytes, start, end);
    let range = TextRange::new(start, end);
    let other = |signature_end: usize| {
        (
            Member::Other(OpaqueText::new(&source[start..end])),
            MemberLayout {
                range,
                signature: TextRange::new(sig_start, signature_end.max(sig_start)),
                callable: None,
            },
        )
    };

    // The first top-level `(`, `{`, `=` or `;` decides the member kind. A `(`
    // opening a tuple type is skipped.
    let mut stop = end;
    let mut angle = 0usize;
    let mut idx = sig_start;
    while idx < end {
        match bytes[idx] {
            b'<' => angle += 1,
            b'>' if angle > 0 => angle -= 1,
            b'(' if angle == 0 && opens_tuple_type(code, sig_start, idx) => {
                match matching_close(&bytes[..end], idx, b'(', b')') {
                    Some(close) => idx = close,
                    None => return other(end),
                }
            }
            b'(' | b'{' | b';' | b'=' if angle == 0 => {
                stop = idx;
                break;
            }
            _ => {}
        }
        idx += 1;
    }
    if stop >= end {
        return other(end);
    }

    let head = &code[sig_start..stop];
    if ["event", "delegate", "operator", "class", "struct", "interface", "enum", "record"]
        .iter()
        .any(|kw| contains_word(head, kw))
    {
        return other(stop);
    }

    match bytes[stop] {
        b'(' => match parse_callable(source, code, sig_start, stop, end, class_name) {
            Some((member, callable, signature_end)) => (
                member,
                MemberLayout {
                    range,
                    signature: TextRange::new(sig_start, signature_end),
                    callable: Some(callable),
                },
            ),
            None => other(stop),
        },
        b'=' if bytes.get(stop + 1) == Some(&b'>') => other(stop),
        b'=' | b';' => match parse_field(source, code, sig_start, end) {
            Some(field) => (
                Member::Field(field),
                MemberLayout {
                    range,
                    signature: TextRange::new(sig_start, end),
                    callable: None,
                },
            ),
            None => other(end),
        },
        _ => other(stop),
    }
}

/// A `(` starts a parameter list only right after a name or a generic
/// parameter list; anywhere else in a signature it opens a tuple type.
fn opens_tuple_type(code: &str, sig_start: usize, open_paren: usize) -> bool {
    let bytes = code.as_bytes();
    let mut prev_end = open_paren;
    while prev_end > sig_start && bytes[prev_end - 1].is_ascii_whitespace() {
        prev_end -= 1;
    }
    if prev_end == sig_start {
        return true;
    }
    match bytes[prev_end - 1] {
        b'>' => false,
        b if is_ident_char_byte(b) => {
            let mut word_start = prev_end;
            while word_start > sig_start && is_ident_char_byte(bytes[word_start - 1]) {
                word_start -= 1;
            }
            MEMBER_MODIFIERS.contains(&&code[word_start..prev_end])
        }
        _ => true,
    }
}

/// Splits `code[start..end]` into leading modifiers (from `known`) and the rest.
fn split_modifiers(code: &str, start: usize, end: usize, known: &[&str]) -> (Vec<String>, usize) {
    let bytes = code.as_bytes();
    let mut modifiers = Vec::new();
    let mut idx = skip_ws(bytes, start, end);
    while idx < end && is_ident_char_byte(bytes[idx]) {
        let word_start = idx;
        let mut word_end = idx;
        while word_end < end && is_ident_char_byte(bytes[word_end]) {
            word_end += 1;
        }
        let word = &code[word_start..word_end];
        if !known.contains(&word) {
            break;
        }
        modifiers.push(word.to_string());
        idx = skip_ws(bytes, word_end, end);
    }
    (modifiers, idx)
}

fn parse_field(source: &str, code: &str, start: usize, end: usize) -> Option<FieldMember> {
    let bytes = code.as_bytes();
    let decl_end = if bytes[end - 1] == b';' { end - 1 } else { end };
    let (modifiers, rest_start) = split_modifiers(code, start, decl_end, MEMBER_MODIFIERS);

    let mut pieces = split_top_level_commas(bytes, rest_start, decl_end).into_iter();
    let (first_start, first_end) = pieces.next()?;
    let first_eq = find_top_level_eq(bytes, first_start, first_end);
    let (ty_text, first_name) = split_type_and_name(&code[first_start..first_eq.unwrap_or(first_end)])?;
    let ty = TypeRef::parse(&source[first_start..first_start + ty_text.len()]);

    let mut variables = vec![FieldVariable {
        name: first_name,
        initializer: first_eq.map(|eq| OpaqueText::new(&source[eq + 1..first_end])),
    }];
    for (piece_start, piece_end) in pieces {
        let eq = find_top_level_eq(bytes, piece_start, piece_end);
        let name = code[piece_start..eq.unwrap_or(piece_end)].trim();
        if name.is_empty() || !name.bytes().all(is_ident_char_byte) {
            return None;
        }
        variables.push(FieldVariable {
            name: name.to_string(),
            initializer: eq.map(|eq| OpaqueText::new(&source[eq + 1..piece_end])),
        });
    }

    Some(FieldMember {
        modifiers,
        ty,
        variables,
    })
}

/// Splits `Type name` at the last identifier. Returns the type text with its
/// original length preserved up to the end of the type (trailing whitespace
/// trimmed) and the name.
fn split_type_and_name(text: &str) -> Option<(String, String)> {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_ident_char_byte(bytes[start - 1]) {
        start -= 1;
    }
    if start == end {
        return None;
    }
    let name = text[start..end].to_string();
    let ty = text[..start].trim_end();
    let ty_offset = text.len() - text.trim_start().len();
    if ty.trim().is_empty() {
        return None;
    }
    // Keep leading whitespace so callers can reuse the length as an offset.
    Some((text[..ty_offset + ty.trim_start().len()].to_string(), name))
}

fn parse_callable(
    source: &str,
    code: &str,
    sig_start: usize,
    open_paren: usize,
    end: usize,
    class_name: &str,
) -> Option<(Member, CallableLayout, usize)> {
    let bytes = code.as_bytes();

    // Name (with optional generic parameter list) right before `(`.
    let mut name_end = open_paren;
    while name_end > sig_start && bytes[name_end - 1].is_ascii_whitespace() {
        name_end -= 1;
    }
    let mut type_params = None;
    let mut ident_end = name_end;
    if name_end > sig_start && bytes[name_end - 1] == b'>' {
        let mut depth = 0usize;
        let mut lt = name_end;
        while lt > sig_start {
            lt -= 1;
            match bytes[lt] {
                b'>' => depth += 1,
                b'<' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return None;
        }
        type_params = Some(source[lt..name_end].to_string());
        ident_end = lt;
        while ident_end > sig_start && bytes[ident_end - 1].is_ascii_whitespace() {
            ident_end -= 1;
        }
    }
    let mut name_start = ident_end;
    while name_start > sig_start
        && (is_ident_char_byte(bytes[name_start - 1]) || bytes[name_start - 1] == b'.')
    {
        name_start -= 1;
    }
    if name_start == ident_end {
        return None;
    }
    let name = code[name_start..ident_end].to_string();
    if name_start > sig_start && bytes[name_start - 1] == b'~' {
        // Finalizer.
        return None;
    }

    let (modifiers, after_modifiers) = split_modifiers(code, sig_start, name_start, MEMBER_MODIFIERS);
    let return_type_text = code[after_modifiers..name_start].trim();

    let close_paren = matching_close(&bytes[..end], open_paren, b'(', b')')?;
    let mut param_ranges = Vec::new();
    let mut parameters = Vec::new();
    if !code[open_paren + 1..close_paren].trim().is_empty() {
        for (piece_start, piece_end) in split_top_level_commas(bytes, open_paren + 1, close_paren) {
            let piece_start = skip_ws(bytes, piece_start, piece_end);
            let mut trimmed_end = piece_end;
            while trimmed_end > piece_start && bytes[trimmed_end - 1].is_ascii_whitespace() {
                trimmed_end -= 1;
            }
            parameters.push(parse_parameter(source, code, piece_start, trimmed_end)?);
            param_ranges.push(TextRange::new(piece_start, trimmed_end));
        }
    }

    // Constructor initializer / generic constraints, then the body.
    let mut idx = close_paren + 1;
    let tail_start = idx;
    while idx < end && !matches!(bytes[idx], b'{' | b';') {
        if bytes[idx] == b'=' && bytes.get(idx + 1) == Some(&b'>') {
            break;
        }
        if bytes[idx] == b'(' {
            idx = matching_close(&bytes[..end], idx, b'(', b')')?;
        }
        idx += 1;
    }
    let tail = source[tail_start..idx.min(end)].trim();

    let (body, body_layout) = if idx >= end {
        (Body::Absent, None)
    } else if bytes[idx] == b'{' {
        let close = matching_close(&bytes[..end], idx, b'{', b'}')?;
        let (statements, ranges) = parse_block(source, code, idx, close);
        (
            Body::Block(statements),
            Some(BlockLayout {
                open: idx,
                close,
                statements: ranges,
            }),
        )
    } else if bytes[idx] == b'=' {
        let expr_end = if bytes[end - 1] == b';' { end - 1 } else { end };
        (Body::Expression(OpaqueText::new(&source[idx + 2..expr_end])), None)
    } else {
        (Body::Absent, None)
    };

    let prefix = TextRange::new(skip_ws(bytes, sig_start, name_start), name_start);
    let callable = CallableLayout {
        prefix,
        params_open: open_paren,
        params_close: close_paren,
        params: param_ranges,
        body: body_layout,
    };

    let member = if return_type_text.is_empty() {
        if name != class_name {
            return None;
        }
        let initializer = tail
            .strip_prefix(':')
            .map(str::trim)
            .filter(|init| !init.is_empty())
            .map(OpaqueText::new);
        Member::Constructor(ConstructorMember {
            name,
            modifiers,
            parameters,
            initializer,
            body,
        })
    } else {
        Member::Method(MethodMember {
            name,
            type_params,
            modifiers,
            return_type: TypeRef::parse(&source[after_modifiers..name_start]),
            parameters,
            constraints: Some(tail).filter(|t| !t.is_empty()).map(OpaqueText::new),
            body,
        })
    };

    Some((member, callable, close_paren + 1))
}

fn parse_parameter(source: &str, code: &str, start: usize, end: usize) -> Option<Parameter> {
    let bytes = code.as_bytes();
    let start = skip_attributes(bytes, start, end);
    let (modifiers, rest_start) = split_modifiers(code, start, end, PARAMETER_MODIFIERS);
    let eq = find_top_level_eq(bytes, rest_start, end);
    let (ty_text, name) = split_type_and_name(&code[rest_start..eq.unwrap_or(end)])?;
    Some(Parameter {
        modifiers,
        ty: TypeRef::parse(&source[rest_start..rest_start + ty_text.len()]),
        name,
        default: eq.map(|eq| OpaqueText::new(&source[eq + 1..end])),
    })
}

/// Splits a `{ ... }` block into statements.
///
/// Comments are trivia and never become statements. `if`/`try`/`do` chains
/// stay one statement; object and collection initializers stay with the
/// statement that owns them.
fn parse_block(source: &str, code: &str, open: usize, close: usize) -> (Vec<Statement>, Vec<TextRange>) {
    let bytes = code.as_bytes();
    let mut statements = Vec::new();
    let mut ranges = Vec::new();
    let mut stmt_start: Option<usize> = None;
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut block_in_expression = false;

    let mut push = |start: usize, end: usize| {
        ranges.push(TextRange::new(start, end));
        statements.push(classify_statement(&source[start..end], &code[start..end]));
    };

    for idx in open + 1..close {
        let b = bytes[idx];
        if stmt_start.is_none() {
            if b.is_ascii_whitespace() {
                continue;
            }
            stmt_start = Some(idx);
        }
        let start = stmt_start.unwrap_or(idx);
        match b {
            b'(' | b'[' => paren_depth += 1,
            b')' | b']' => paren_depth = paren_depth.saturating_sub(1),
            b'{' => {
                if brace_depth == 0 && paren_depth == 0 && !block_in_expression {
                    block_in_expression = find_top_level_eq(bytes, start, idx).is_some();
                }
                brace_depth += 1;
            }
            b'}' => {
                brace_depth = brace_depth.saturating_sub(1);
                if brace_depth == 0 && paren_depth == 0 && !block_in_expression {
                    if continues_statement(code, start, idx + 1, close) {
                        continue;
                    }
                    push(start, idx + 1);
                    stmt_start = None;
                }
            }
            b';' if brace_depth == 0 && paren_depth == 0 => {
                push(start, idx + 1);
                stmt_start = None;
                block_in_expression = false;
            }
            _ => {}
        }
    }
    if let Some(start) = stmt_start {
        let mut end = close;
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        push(start, end);
    }

    (statements, ranges)
}

/// After a closing brace, `else`/`catch`/`finally` (and `while` after `do`)
/// continue the same statement.
fn continues_statement(code: &str, stmt_start: usize, after: usize, end: usize) -> bool {
    let bytes = code.as_bytes();
    let next = skip_ws(bytes, after, end);
    let word_end = (next..end)
        .find(|&idx| !is_ident_char_byte(bytes[idx]))
        .unwrap_or(end);
    match &code[next..word_end] {
        "else" | "catch" | "finally" => true,
        "while" => code[stmt_start..].starts_with("do") && is_boundary(bytes, stmt_start + 2),
        _ => false,
    }
}

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(@?[\p{L}_][\p{L}\p{N}_]*)\s*=\s*(@?[\p{L}_][\p{L}\p{N}_]*)\s*;$")
            .expect("valid assignment regex")
    })
}

fn classify_statement(text: &str, code: &str) -> Statement {
    // Match on the original text: a statement with an embedded comment is not
    // the exact `a = b;` shape.
    if code.trim() == text.trim() {
        if let Some(caps) = assignment_re().captures(text.trim()) {
            let target = &caps[1];
            let value = &caps[2];
            if !is_literal_keyword(target) && !is_literal_keyword(value) {
                return Statement::assignment(target, value);
            }
        }
    }
    Statement::other(text)
}

fn is_literal_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "null" | "true" | "false" | "this" | "base" | "default" | "new"
    )
}

//! The class-level tree model consumed and produced by the refactorings.
//!
//! Nodes carry no offsets and no trivia: two nodes are equal when they have
//! the same shape, identifiers and types, regardless of formatting. Source
//! positions live in [`crate::ClassLayout`] instead.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::scan::compact_ws;

pub const READONLY_MODIFIER: &str = "readonly";
pub const ASYNC_MODIFIER: &str = "async";
pub const STATIC_MODIFIER: &str = "static";

/// Verbatim source text that is carried through untouched.
///
/// Equality (and hashing) ignore whitespace differences.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct OpaqueText(String);

impl OpaqueText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalized(&self) -> String {
        compact_ws(&self.0)
    }
}

impl PartialEq for OpaqueText {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for OpaqueText {}

impl Hash for OpaqueText {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for OpaqueText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (possibly generic) type reference such as `Task<Task<string>>` or `int[]`.
///
/// Types the parser does not understand (tuples, pointers to generics, ...)
/// are kept whole in `name` with no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
    /// Array ranks, nullable markers and pointers following the argument list.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suffix: String,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            suffix: String::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            suffix: String::new(),
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.args.is_empty() && self.suffix.is_empty()
    }

    /// The last segment of a qualified name: `System.Threading.Tasks.Task` → `Task`.
    pub fn simple_name(&self) -> &str {
        let name = self.name.rsplit("::").next().unwrap_or(&self.name);
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Parses a type from source text. Never fails: anything unusual becomes an
    /// opaque named type with whitespace collapsed.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with('(') {
            // Tuple types keep their element names; only collapse whitespace.
            return Self::named(compact_ws(text));
        }

        let Some(lt) = text.find('<') else {
            return Self::named(strip_ws(text));
        };
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut close = None;
        for (idx, &b) in bytes.iter().enumerate().skip(lt) {
            match b {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return Self::named(strip_ws(text));
        };

        let name = strip_ws(&text[..lt]);
        let inner = &text[lt + 1..close];
        let args = crate::scan::split_top_level_commas(inner.as_bytes(), 0, inner.len())
            .into_iter()
            .map(|(start, end)| TypeRef::parse(&inner[start..end]))
            .collect();
        Self {
            name,
            args,
            suffix: strip_ws(&text[close + 1..]),
        }
    }
}

fn strip_ws(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (idx, arg) in self.args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        f.write_str(&self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    /// `ref`, `out`, `in`, `params`, `this`, `scoped`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<OpaqueText>,
}

impl Parameter {
    pub fn new(ty: TypeRef, name: impl Into<String>) -> Self {
        Self {
            modifiers: Vec::new(),
            ty,
            name: name.into(),
            default: None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier} ")?;
        }
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `<identifier> = <identifier>;`
    Assignment { target: String, value: String },
    Other { text: OpaqueText },
}

impl Statement {
    pub fn assignment(target: impl Into<String>, value: impl Into<String>) -> Self {
        Statement::Assignment {
            target: target.into(),
            value: value.into(),
        }
    }

    pub fn other(text: impl Into<String>) -> Self {
        Statement::Other {
            text: OpaqueText::new(text),
        }
    }

    /// Left-hand identifier of an assignment statement.
    pub fn assigned_name(&self) -> Option<&str> {
        match self {
            Statement::Assignment { target, .. } => Some(target),
            Statement::Other { .. } => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assignment { target, value } => write!(f, "{target} = {value};"),
            Statement::Other { text } => write!(f, "{text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Body {
    Block(Vec<Statement>),
    /// `=> expression;`
    Expression(OpaqueText),
    /// `;` only (abstract, extern, partial declarations).
    Absent,
}

impl Body {
    pub fn statements(&self) -> &[Statement] {
        match self {
            Body::Block(statements) => statements,
            Body::Expression(_) | Body::Absent => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldVariable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<OpaqueText>,
}

/// One field declaration statement; it may declare several variables sharing
/// the type and modifiers (`private readonly A _a1, _a2;`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldMember {
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    pub variables: Vec<FieldVariable>,
}

impl FieldMember {
    pub fn is_readonly(&self) -> bool {
        self.modifiers.iter().any(|m| m == READONLY_MODIFIER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConstructorMember {
    pub name: String,
    pub modifiers: Vec<String>,
    pub parameters: Vec<Parameter>,
    /// `: base(...)` / `: this(...)`, without the colon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<OpaqueText>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodMember {
    pub name: String,
    /// `<T, U>` including the angle brackets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_params: Option<String>,
    pub modifiers: Vec<String>,
    pub return_type: TypeRef,
    pub parameters: Vec<Parameter>,
    /// Generic constraint clauses (`where T : class`), verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<OpaqueText>,
    pub body: Body,
}

impl MethodMember {
    pub fn is_async(&self) -> bool {
        self.modifiers.iter().any(|m| m == ASYNC_MODIFIER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "member", rename_all = "snake_case")]
pub enum Member {
    Field(FieldMember),
    Constructor(ConstructorMember),
    Method(MethodMember),
    /// Properties, events, nested types, operators and anything else.
    Other(OpaqueText),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_params: Option<String>,
    pub modifiers: Vec<String>,
    /// Base list and constraint clauses (`: Base, IFoo where T : new()`), verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bases: Option<OpaqueText>,
    pub members: Vec<Member>,
}

impl ClassNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_params: None,
            modifiers: Vec::new(),
            bases: None,
            members: Vec::new(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldMember> + '_ {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    /// The first constructor declared in the class together with its member index.
    pub fn first_constructor(&self) -> Option<(usize, &ConstructorMember)> {
        self.members
            .iter()
            .enumerate()
            .find_map(|(idx, member)| match member {
                Member::Constructor(ctor) => Some((idx, ctor)),
                _ => None,
            })
    }

    pub fn methods(&self) -> impl Iterator<Item = (usize, &MethodMember)> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter_map(|(idx, member)| match member {
                Member::Method(method) => Some((idx, method)),
                _ => None,
            })
    }
}

use std::fmt;
use std::str::FromStr;

use depcon_syntax::{MethodMember, TypeRef, ASYNC_MODIFIER};
use serde::Serialize;
use thiserror::Error;

use crate::CancellationToken;

/// The deferred-result type wrapping an asynchronous method's result.
pub const DEFERRED_TYPE_NAME: &str = "Task";
const QUALIFIED_DEFERRED_TYPE_NAME: &str = "System.Threading.Tasks.Task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodMode {
    Sync,
    Async,
}

impl fmt::Display for MethodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodMode::Sync => f.write_str("sync"),
            MethodMode::Async => f.write_str("async"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown method mode `{0}` (expected `sync` or `async`)")]
pub struct ParseMethodModeError(String);

impl FromStr for MethodMode {
    type Err = ParseMethodModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(MethodMode::Sync),
            "async" | "asynchronous" => Ok(MethodMode::Async),
            _ => Err(ParseMethodModeError(s.to_string())),
        }
    }
}

fn is_deferred_type(ty: &TypeRef) -> bool {
    let name = ty.name.strip_prefix("global::").unwrap_or(&ty.name);
    ty.suffix.is_empty() && (name == DEFERRED_TYPE_NAME || name == QUALIFIED_DEFERRED_TYPE_NAME)
}

/// The mode a method is currently in, judged by its `async` modifier.
pub fn current_mode(method: &MethodMember) -> MethodMode {
    if method.is_async() {
        MethodMode::Async
    } else {
        MethodMode::Sync
    }
}

/// Strips `async` and unwraps one level of `Task`:
/// `Task` → `void`, `Task<T>` → `T`, `Task<Task<T>>` → `Task<T>`.
///
/// The body is not rewritten; `await` expressions stay as they are.
pub fn to_sync(method: &MethodMember) -> MethodMember {
    let mut out = method.clone();
    out.modifiers.retain(|m| m != ASYNC_MODIFIER);
    if is_deferred_type(&method.return_type) {
        match method.return_type.args.as_slice() {
            [] => out.return_type = TypeRef::void(),
            [inner] => out.return_type = inner.clone(),
            _ => {}
        }
    }
    out
}

/// Adds `async` and wraps the result: `void` → `Task`, `T` → `Task<T>`.
///
/// A method already marked `async` is returned unchanged.
pub fn to_async(method: &MethodMember) -> MethodMember {
    if method.is_async() {
        return method.clone();
    }
    let mut out = method.clone();
    out.modifiers.push(ASYNC_MODIFIER.to_string());
    out.return_type = if method.return_type.is_void() {
        TypeRef::named(DEFERRED_TYPE_NAME)
    } else {
        TypeRef::generic(DEFERRED_TYPE_NAME, vec![method.return_type.clone()])
    };
    out
}

/// Converts `method` to `target`. A cancelled token returns the input unchanged.
pub fn convert_method_mode(
    method: &MethodMember,
    target: MethodMode,
    cancel: &CancellationToken,
) -> MethodMember {
    if cancel.is_cancelled() {
        tracing::debug!(target = "depcon.refactor", method = %method.name, "cancelled before conversion");
        return method.clone();
    }
    tracing::debug!(
        target = "depcon.refactor",
        method = %method.name,
        to = %target,
        return_type = %method.return_type,
        "converting method"
    );
    match target {
        MethodMode::Sync => to_sync(method),
        MethodMode::Async => to_async(method),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_names() {
        assert_eq!("sync".parse::<MethodMode>(), Ok(MethodMode::Sync));
        assert_eq!("Async".parse::<MethodMode>(), Ok(MethodMode::Async));
        assert_eq!("asynchronous".parse::<MethodMode>(), Ok(MethodMode::Async));
        assert!("later".parse::<MethodMode>().is_err());
    }

    #[test]
    fn recognizes_qualified_task() {
        assert!(is_deferred_type(&TypeRef::named("System.Threading.Tasks.Task")));
        assert!(is_deferred_type(&TypeRef::named("global::System.Threading.Tasks.Task")));
        assert!(!is_deferred_type(&TypeRef::named("ValueTask")));
        assert!(!is_deferred_type(&TypeRef {
            name: "Task".into(),
            args: Vec::new(),
            suffix: "?".into(),
        }));
    }
}

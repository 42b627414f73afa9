use depcon_syntax::{parse_source, Member, ParsedClass, SourceFile};
use serde::Serialize;
use thiserror::Error;

use crate::dependency_constructor::{
    is_dependency_constructor_applicable, synthesize_dependency_constructor,
};
use crate::edit::{EditError, FileId, TextEdit, WorkspaceEdit};
use crate::method_mode::{convert_method_mode, current_mode, MethodMode};
use crate::splice::splice_class;
use crate::CancellationToken;

pub const RESOLVE_DEPENDENCIES_TITLE: &str = "Resolve unassigned dependencies";
pub const CONVERT_TO_SYNC_TITLE: &str = "Convert to synchronous method";
pub const CONVERT_TO_ASYNC_TITLE: &str = "Convert to asynchronous method";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefactorError {
    #[error("no class declaration or constructor found at the requested position")]
    NoClassAtPosition,
    #[error("no method declaration found at the requested position")]
    NoMethodAtPosition,
    #[error("the refactoring does not apply here")]
    NotApplicable,
    #[error("the refactoring was cancelled")]
    Cancelled,
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeActionKind {
    ResolveUnassignedDependencies,
    ConvertToSync,
    ConvertToAsync,
}

impl CodeActionKind {
    pub fn title(self) -> &'static str {
        match self {
            CodeActionKind::ResolveUnassignedDependencies => RESOLVE_DEPENDENCIES_TITLE,
            CodeActionKind::ConvertToSync => CONVERT_TO_SYNC_TITLE,
            CodeActionKind::ConvertToAsync => CONVERT_TO_ASYNC_TITLE,
        }
    }
}

/// A refactoring offered at a cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeAction {
    pub title: String,
    pub kind: CodeActionKind,
    /// The class or method the action rewrites.
    pub target: String,
}

impl CodeAction {
    fn new(kind: CodeActionKind, target: impl Into<String>) -> Self {
        Self {
            title: kind.title().to_string(),
            kind,
            target: target.into(),
        }
    }
}

/// The innermost class whose header, or one of whose constructor signatures,
/// contains `offset`.
pub fn class_at_offset(file: &SourceFile, offset: usize) -> Option<&ParsedClass> {
    file.classes
        .iter()
        .filter(|class| {
            class.layout.header.touches(offset)
                || class
                    .node
                    .members
                    .iter()
                    .zip(&class.layout.members)
                    .any(|(member, layout)| {
                        matches!(member, Member::Constructor(_)) && layout.signature.touches(offset)
                    })
        })
        .max_by_key(|class| class.nesting)
}

/// The method whose signature contains `offset`, with its member index.
pub fn method_at_offset(file: &SourceFile, offset: usize) -> Option<(&ParsedClass, usize)> {
    file.classes
        .iter()
        .filter_map(|class| {
            class
                .node
                .members
                .iter()
                .zip(&class.layout.members)
                .position(|(member, layout)| {
                    matches!(member, Member::Method(_)) && layout.signature.touches(offset)
                })
                .map(|idx| (class, idx))
        })
        .max_by_key(|(class, _)| class.nesting)
}

/// Lists the refactorings available at `offset`.
pub fn code_actions(source: &str, offset: usize, cancel: &CancellationToken) -> Vec<CodeAction> {
    if cancel.is_cancelled() {
        return Vec::new();
    }
    let file = parse_source(source);
    let mut actions = Vec::new();

    if let Some(class) = class_at_offset(&file, offset) {
        if is_dependency_constructor_applicable(&class.node, cancel) {
            actions.push(CodeAction::new(
                CodeActionKind::ResolveUnassignedDependencies,
                class.node.name.clone(),
            ));
        }
    }

    if let Some((class, idx)) = method_at_offset(&file, offset) {
        if let Member::Method(method) = &class.node.members[idx] {
            let kind = match current_mode(method) {
                MethodMode::Async => CodeActionKind::ConvertToSync,
                MethodMode::Sync => CodeActionKind::ConvertToAsync,
            };
            actions.push(CodeAction::new(kind, method.name.clone()));
        }
    }

    tracing::debug!(target = "depcon.refactor", offset, actions = actions.len(), "computed code actions");
    actions
}

fn workspace_edit(
    file: &str,
    source: &str,
    class: &ParsedClass,
    new: &depcon_syntax::ClassNode,
) -> Result<WorkspaceEdit, RefactorError> {
    let file_id = FileId::new(file);
    let edits = splice_class(source, class, new)
        .into_iter()
        .map(|(range, text)| TextEdit::replace(file_id.clone(), range, text))
        .collect();
    let mut edit = WorkspaceEdit::new(edits);
    edit.normalize()?;
    Ok(edit)
}

/// Generates or extends the dependency constructor of `class`.
pub fn resolve_class_dependencies(
    file: &str,
    source: &str,
    class: &ParsedClass,
    cancel: &CancellationToken,
) -> Result<WorkspaceEdit, RefactorError> {
    if cancel.is_cancelled() {
        return Err(RefactorError::Cancelled);
    }
    if !is_dependency_constructor_applicable(&class.node, cancel) {
        return Err(RefactorError::NotApplicable);
    }
    let new = synthesize_dependency_constructor(&class.node, cancel);
    workspace_edit(file, source, class, &new)
}

/// The "Resolve unassigned dependencies" action at `offset`.
pub fn resolve_unassigned_dependencies(
    file: &str,
    source: &str,
    offset: usize,
    cancel: &CancellationToken,
) -> Result<WorkspaceEdit, RefactorError> {
    let parsed = parse_source(source);
    let class = class_at_offset(&parsed, offset).ok_or(RefactorError::NoClassAtPosition)?;
    resolve_class_dependencies(file, source, class, cancel)
}

/// Converts the method at `member_index` of `class` to `target`.
pub fn convert_class_method(
    file: &str,
    source: &str,
    class: &ParsedClass,
    member_index: usize,
    target: MethodMode,
    cancel: &CancellationToken,
) -> Result<WorkspaceEdit, RefactorError> {
    if cancel.is_cancelled() {
        return Err(RefactorError::Cancelled);
    }
    let Some(Member::Method(method)) = class.node.members.get(member_index) else {
        return Err(RefactorError::NoMethodAtPosition);
    };
    if current_mode(method) == target {
        return Err(RefactorError::NotApplicable);
    }

    let mut new = class.node.clone();
    new.members[member_index] = Member::Method(convert_method_mode(method, target, cancel));
    workspace_edit(file, source, class, &new)
}

/// The sync/async conversion action at `offset`.
pub fn convert_method(
    file: &str,
    source: &str,
    offset: usize,
    target: MethodMode,
    cancel: &CancellationToken,
) -> Result<WorkspaceEdit, RefactorError> {
    let parsed = parse_source(source);
    let (class, idx) = method_at_offset(&parsed, offset).ok_or(RefactorError::NoMethodAtPosition)?;
    convert_class_method(file, source, class, idx, target, cancel)
}

//! Refactorings over the `depcon-syntax` class model.
//!
//! The core operations are pure functions over tree nodes:
//! - Dependency constructor synthesis (`synthesize_dependency_constructor`)
//!   and its availability check (`is_dependency_constructor_applicable`)
//! - Sync/async method conversion (`convert_method_mode`)
//!
//! Around them sits a thin host layer that locates nodes at a cursor, lists
//! code actions and splices results back into source text as edits.

mod actions;
mod dependency_constructor;
pub mod edit;
mod method_mode;
mod preview;
mod splice;

pub use tokio_util::sync::CancellationToken;

pub use actions::{
    class_at_offset, code_actions, convert_class_method, convert_method, method_at_offset,
    resolve_class_dependencies, resolve_unassigned_dependencies, CodeAction, CodeActionKind,
    RefactorError, CONVERT_TO_ASYNC_TITLE, CONVERT_TO_SYNC_TITLE, RESOLVE_DEPENDENCIES_TITLE,
};
pub use dependency_constructor::{
    analyze_dependencies, dependency_candidates, derive_parameter_name,
    is_dependency_constructor_applicable, parameter_name_collisions, plan_constructor,
    synthesize_dependency_constructor, ConstructorPlan, DependencyAnalysis, DependencyCandidate,
    NameCollision, GENERATED_CONSTRUCTOR_MODIFIER,
};
pub use edit::{
    apply_text_edits, apply_workspace_edit, EditError, FileId, TextEdit, WorkspaceEdit,
};
pub use method_mode::{
    convert_method_mode, current_mode, to_async, to_sync, MethodMode, ParseMethodModeError,
    DEFERRED_TYPE_NAME,
};
pub use preview::{generate_preview, FilePreview, RefactoringPreview, DEFAULT_CONTEXT_RADIUS};
pub use splice::{splice_class, Replacement};

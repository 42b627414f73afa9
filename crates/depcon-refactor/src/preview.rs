use std::collections::BTreeMap;

use serde::Serialize;
use similar::TextDiff;

use crate::edit::{apply_workspace_edit, EditError, FileId, WorkspaceEdit};

pub const DEFAULT_CONTEXT_RADIUS: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilePreview {
    pub file: FileId,
    pub original: String,
    pub modified: String,
    pub unified_diff: String,
    pub edit_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefactoringPreview {
    pub total_files: usize,
    pub total_edits: usize,
    pub files: Vec<FilePreview>,
}

/// Applies `edit` to `files` in memory and renders a unified diff per changed file.
pub fn generate_preview(
    files: &BTreeMap<FileId, String>,
    edit: &WorkspaceEdit,
    context_radius: usize,
) -> Result<RefactoringPreview, EditError> {
    let mut normalized = edit.clone();
    normalized.normalize()?;
    let modified_files = apply_workspace_edit(files, &normalized)?;

    let mut previews = Vec::new();
    for (file, original) in files {
        let modified = modified_files.get(file).map(String::as_str).unwrap_or("");
        if original == modified {
            continue;
        }
        let header = format!("a/{}", file.0);
        let unified_diff = TextDiff::from_lines(original.as_str(), modified)
            .unified_diff()
            .context_radius(context_radius)
            .header(&header, &format!("b/{}", file.0))
            .to_string();
        previews.push(FilePreview {
            file: file.clone(),
            original: original.clone(),
            modified: modified.to_string(),
            unified_diff,
            edit_count: normalized.edits.iter().filter(|e| &e.file == file).count(),
        });
    }

    Ok(RefactoringPreview {
        total_files: previews.len(),
        total_edits: normalized.edits.len(),
        files: previews,
    })
}

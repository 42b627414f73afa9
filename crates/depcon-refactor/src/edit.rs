use std::collections::BTreeMap;

use depcon_syntax::TextRange;
use serde::Serialize;
use thiserror::Error;

/// Identifier for a source file, usually its path as given by the host.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub file: FileId,
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(file: FileId, offset: usize, text: impl Into<String>) -> Self {
        Self::replace(file, TextRange::empty(offset), text)
    }

    pub fn replace(file: FileId, range: TextRange, text: impl Into<String>) -> Self {
        Self {
            file,
            range,
            replacement: text.into(),
        }
    }
}

/// Edits produced by one refactoring, possibly across several files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceEdit {
    pub edits: Vec<TextEdit>,
}

impl WorkspaceEdit {
    pub fn new(edits: Vec<TextEdit>) -> Self {
        Self { edits }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits grouped by file, each group sorted by position.
    pub fn edits_by_file(&self) -> BTreeMap<&FileId, Vec<&TextEdit>> {
        let mut map: BTreeMap<&FileId, Vec<&TextEdit>> = BTreeMap::new();
        for edit in &self.edits {
            map.entry(&edit.file).or_default().push(edit);
        }
        for edits in map.values_mut() {
            edits.sort_by_key(|edit| (edit.range.start, edit.range.end));
        }
        map
    }

    /// Sorts edits, drops exact duplicates and rejects overlaps.
    ///
    /// Unlike a plain sort, inserts at the same offset keep their relative
    /// order so generated text is never shuffled.
    pub fn normalize(&mut self) -> Result<(), EditError> {
        self.edits.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.range.start.cmp(&b.range.start))
                .then_with(|| a.range.end.cmp(&b.range.end))
        });
        self.edits.dedup();

        let mut merged: Vec<TextEdit> = Vec::with_capacity(self.edits.len());
        for edit in self.edits.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.file == edit.file && last.range == edit.range && edit.range.is_empty() {
                    last.replacement.push_str(&edit.replacement);
                    continue;
                }
                if last.file == edit.file && edit.range.start < last.range.end {
                    return Err(EditError::OverlappingEdits {
                        file: edit.file,
                        first: last.range,
                        second: edit.range,
                    });
                }
            }
            merged.push(edit);
        }
        self.edits = merged;
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid text range {range:?} in {file:?}")]
    InvalidRange { file: FileId, range: TextRange },
    #[error("overlapping edits in {file:?}: {first:?} overlaps {second:?}")]
    OverlappingEdits {
        file: FileId,
        first: TextRange,
        second: TextRange,
    },
    #[error("text edit range {range:?} is outside the file bounds (len={len}) in {file:?}")]
    OutOfBounds {
        file: FileId,
        range: TextRange,
        len: usize,
    },
    #[error("edit targets unknown file {0:?}")]
    UnknownFile(FileId),
}

/// Applies non-overlapping `edits` to `original`.
pub fn apply_text_edits(original: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    // Back to front so earlier offsets stay valid; stable so same-offset
    // inserts are applied in reverse and end up in their given order.
    sorted.sort_by_key(|edit| (edit.range.start, edit.range.end));

    let mut out = original.to_string();
    for edit in sorted.into_iter().rev() {
        let len = out.len();
        if edit.range.end > len
            || !out.is_char_boundary(edit.range.start)
            || !out.is_char_boundary(edit.range.end)
        {
            return Err(EditError::OutOfBounds {
                file: edit.file.clone(),
                range: edit.range,
                len,
            });
        }
        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }
    Ok(out)
}

/// Applies a workspace edit to an in-memory snapshot of file contents and
/// returns the updated snapshot.
pub fn apply_workspace_edit(
    files: &BTreeMap<FileId, String>,
    edit: &WorkspaceEdit,
) -> Result<BTreeMap<FileId, String>, EditError> {
    let mut normalized = edit.clone();
    normalized.normalize()?;

    let mut out = files.clone();
    for (file, edits) in normalized.edits_by_file() {
        let original = files
            .get(file)
            .ok_or_else(|| EditError::UnknownFile(file.clone()))?;
        let owned: Vec<TextEdit> = edits.into_iter().cloned().collect();
        out.insert(file.clone(), apply_text_edits(original, &owned)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileId {
        FileId::new("C.cs")
    }

    #[test]
    fn applies_edits_back_to_front() {
        let edits = vec![
            TextEdit::insert(file(), 0, "a"),
            TextEdit::replace(file(), TextRange::new(2, 3), "Z"),
            TextEdit::insert(file(), 5, "!"),
        ];
        assert_eq!(apply_text_edits("01234", &edits).unwrap(), "a01Z34!");
    }

    #[test]
    fn same_offset_inserts_keep_their_order() {
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::insert(file(), 1, "b"),
            TextEdit::insert(file(), 1, "a"),
        ]);
        edit.normalize().unwrap();
        assert_eq!(edit.edits.len(), 1);
        assert_eq!(edit.edits[0].replacement, "ba");
    }

    #[test]
    fn rejects_overlapping_replacements() {
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::replace(file(), TextRange::new(0, 3), "x"),
            TextEdit::replace(file(), TextRange::new(2, 4), "y"),
        ]);
        assert!(matches!(
            edit.normalize(),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn rejects_out_of_bounds_edits() {
        let edits = vec![TextEdit::replace(file(), TextRange::new(2, 9), "x")];
        assert!(matches!(
            apply_text_edits("abc", &edits),
            Err(EditError::OutOfBounds { len: 3, .. })
        ));
    }
}

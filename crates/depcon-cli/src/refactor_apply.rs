use anyhow::{Context, Result};
use depcon_refactor::{apply_text_edits, generate_preview, FileId, WorkspaceEdit};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// How a computed edit leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Print the rewritten file to stdout.
    Print,
    /// Print a unified diff.
    Diff,
    /// Print the refactoring preview as JSON.
    Json,
    /// Rewrite the file on disk.
    InPlace,
}

/// One source file read from disk.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub id: FileId,
    pub text: String,
}

impl FileSnapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            id: FileId::new(display_path(path)),
            text,
        })
    }

    /// Resolves `--offset` or `--line`/`--column` to a byte offset.
    pub fn cursor(
        &self,
        offset: Option<usize>,
        line: Option<usize>,
        column: Option<usize>,
    ) -> Result<Option<usize>> {
        if let Some(offset) = offset {
            if offset > self.text.len() || !self.text.is_char_boundary(offset) {
                anyhow::bail!(
                    "offset {offset} is not a valid position in {} ({} bytes)",
                    self.path.display(),
                    self.text.len()
                );
            }
            return Ok(Some(offset));
        }
        match (line, column) {
            (Some(line), Some(column)) => offset_at_line_column(&self.text, line, column)
                .map(Some)
                .with_context(|| {
                    format!("{}:{line}:{column} is outside the file", self.path.display())
                }),
            _ => Ok(None),
        }
    }
}

pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Byte offset of a 1-based line and 1-based character column.
///
/// The column may point one past the last character of the line.
pub fn offset_at_line_column(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }
    let mut line_start = 0;
    for _ in 1..line {
        line_start += text[line_start..].find('\n')? + 1;
    }
    let line_text = text[line_start..]
        .split('\n')
        .next()
        .unwrap_or("")
        .trim_end_matches('\r');

    if column == line_text.chars().count() + 1 {
        return Some(line_start + line_text.len());
    }
    line_text
        .char_indices()
        .nth(column - 1)
        .map(|(idx, _)| line_start + idx)
}

/// Writes the result of `edit` according to `mode`.
pub fn emit(
    snapshot: &FileSnapshot,
    edit: &WorkspaceEdit,
    mode: OutputMode,
    context_radius: usize,
) -> Result<()> {
    match mode {
        OutputMode::Print => {
            let text = apply_text_edits(&snapshot.text, &edit.edits)?;
            print!("{text}");
        }
        OutputMode::Diff => {
            let files = BTreeMap::from([(snapshot.id.clone(), snapshot.text.clone())]);
            let preview = generate_preview(&files, edit, context_radius)?;
            for file in &preview.files {
                print!("{}", file.unified_diff);
            }
        }
        OutputMode::Json => {
            let files = BTreeMap::from([(snapshot.id.clone(), snapshot.text.clone())]);
            let preview = generate_preview(&files, edit, context_radius)?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        OutputMode::InPlace => {
            let text = apply_text_edits(&snapshot.text, &edit.edits)?;
            atomic_write(&snapshot.path, text.as_bytes())
                .with_context(|| format!("failed to write {}", snapshot.path.display()))?;
            tracing::info!(
                target = "depcon.cli",
                path = %snapshot.path.display(),
                edits = edit.edits.len(),
                "rewrote file"
            );
            println!(
                "updated {} ({} edit{})",
                snapshot.path.display(),
                edit.edits.len(),
                if edit.edits.len() == 1 { "" } else { "s" }
            );
        }
    }
    Ok(())
}

/// Writes `bytes` to a temporary file next to `path` and renames it into place.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_column_map_to_byte_offsets() {
        let text = "class C\r\n{\n    int é;\n}";
        assert_eq!(offset_at_line_column(text, 1, 1), Some(0));
        assert_eq!(offset_at_line_column(text, 1, 7), Some(6));
        // One past the end of the line, before the CR.
        assert_eq!(offset_at_line_column(text, 1, 8), Some(7));
        assert_eq!(offset_at_line_column(text, 2, 1), Some(9));
        assert_eq!(offset_at_line_column(text, 3, 10), Some(text.find(';').unwrap()));
        assert_eq!(offset_at_line_column(text, 4, 1), Some(text.len() - 1));
    }

    #[test]
    fn positions_outside_the_file_are_rejected() {
        let text = "a\nbc";
        assert_eq!(offset_at_line_column(text, 0, 1), None);
        assert_eq!(offset_at_line_column(text, 1, 0), None);
        assert_eq!(offset_at_line_column(text, 1, 3), None);
        assert_eq!(offset_at_line_column(text, 3, 1), None);
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("C.cs");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn cursor_rejects_offsets_past_the_end() {
        let snapshot = FileSnapshot {
            path: PathBuf::from("C.cs"),
            id: FileId::new("C.cs"),
            text: "class C {}".to_string(),
        };
        assert_eq!(snapshot.cursor(Some(3), None, None).unwrap(), Some(3));
        assert!(snapshot.cursor(Some(99), None, None).is_err());
        assert_eq!(snapshot.cursor(None, Some(1), Some(7)).unwrap(), Some(6));
        assert_eq!(snapshot.cursor(None, None, None).unwrap(), None);
    }
}

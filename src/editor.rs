use std::collections::HashSet;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::cli::EditArgs;
use crate::formats::{Classification, ClassificationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("classification index {index} is out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A single user action against the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorCommand {
    Reorder { index: usize, direction: Direction },
    Rename { index: usize, name: String },
    EditContent { index: usize, content: String },
    ToggleImageFlag { index: usize, page_number: u32 },
    Add,
    Delete { index: usize },
    ToggleExpansion { id: ClassificationId },
    Select { id: ClassificationId },
    ResetSelection,
    OpenPreview { id: ClassificationId },
    ClosePreview,
}

/// Owns the classification list for one editing session.
///
/// The list is never mutated in place: every effective change builds a new
/// list, assigns it, and bumps `revision`. No-ops leave `revision` alone.
#[derive(Debug, Clone, Default)]
pub struct ClassificationEditor {
    classifications: Vec<Classification>,
    revision: u64,
    expanded: HashSet<ClassificationId>,
    selected: Option<ClassificationId>,
    preview: Option<ClassificationId>,
}

impl ClassificationEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifications(classifications: Vec<Classification>) -> Self {
        let mut editor = Self::new();
        editor.replace_all(classifications);
        editor
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn position(&self, id: &ClassificationId) -> Option<usize> {
        self.classifications.iter().position(|c| &c.id == id)
    }

    /// Overwrites the whole list. UI state tied to the previous records is
    /// dropped with them.
    pub fn replace_all(&mut self, classifications: Vec<Classification>) {
        self.expanded.clear();
        self.selected = None;
        self.preview = None;
        self.commit(classifications);
    }

    pub fn reorder(&mut self, index: usize, direction: Direction) -> Result<(), EditorError> {
        self.check_index(index)?;
        let neighbor = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&n| n < self.classifications.len()),
        };
        let Some(neighbor) = neighbor else {
            return Ok(());
        };

        let mut next = self.classifications.clone();
        next.swap(index, neighbor);
        self.commit(next);
        Ok(())
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<(), EditorError> {
        let name = name.into();
        self.replace_at(index, |c| Classification {
            category: name,
            ..c.clone()
        })
    }

    pub fn edit_content(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<(), EditorError> {
        let content = content.into();
        self.replace_at(index, |c| Classification {
            content,
            ..c.clone()
        })
    }

    /// Flips `saveAsImage` on the first page entry matching `page_number`.
    /// Returns `false` when the classification has no such page.
    pub fn toggle_image_flag(
        &mut self,
        index: usize,
        page_number: u32,
    ) -> Result<bool, EditorError> {
        self.check_index(index)?;
        let Some(page_index) = self.classifications[index]
            .pages
            .iter()
            .position(|p| p.page_number == page_number)
        else {
            return Ok(false);
        };

        self.replace_at(index, |c| {
            let mut updated = c.clone();
            let page = &mut updated.pages[page_index];
            page.save_as_image = !page.save_as_image;
            updated
        })?;
        Ok(true)
    }

    /// Appends a blank classification and expands it.
    pub fn add(&mut self) -> ClassificationId {
        let name = format!("new classification {}", self.classifications.len() + 1);
        let classification = Classification::new(name);
        let id = classification.id.clone();

        let mut next = self.classifications.clone();
        next.push(classification);
        self.commit(next);
        self.expanded.insert(id.clone());
        id
    }

    pub fn delete(&mut self, index: usize) -> Result<Classification, EditorError> {
        self.check_index(index)?;
        let mut next = self.classifications.clone();
        let removed = next.remove(index);
        self.commit(next);

        self.expanded.remove(&removed.id);
        if self.selected.as_ref() == Some(&removed.id) {
            self.selected = None;
        }
        if self.preview.as_ref() == Some(&removed.id) {
            self.preview = None;
        }
        Ok(removed)
    }

    /// Returns whether `id` is expanded afterwards. Collapsing the record
    /// shown in the content preview also closes the preview.
    pub fn toggle_expansion(&mut self, id: &ClassificationId) -> bool {
        if self.expanded.remove(id) {
            if self.preview.as_ref() == Some(id) {
                self.preview = None;
            }
            return false;
        }
        self.expanded.insert(id.clone());
        true
    }

    pub fn is_expanded(&self, id: &ClassificationId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded(&self) -> impl Iterator<Item = &ClassificationId> {
        self.expanded.iter()
    }

    /// Points the page viewer at `id`. Unknown ids are accepted; they simply
    /// match no pages.
    pub fn select(&mut self, id: ClassificationId) {
        self.selected = Some(id);
    }

    pub fn reset_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&ClassificationId> {
        self.selected.as_ref()
    }

    pub fn open_preview(&mut self, id: &ClassificationId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.preview = Some(id.clone());
        true
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    pub fn preview(&self) -> Option<&Classification> {
        let id = self.preview.as_ref()?;
        self.classifications.iter().find(|c| &c.id == id)
    }

    pub fn apply(&mut self, command: EditorCommand) -> Result<(), EditorError> {
        match command {
            EditorCommand::Reorder { index, direction } => self.reorder(index, direction)?,
            EditorCommand::Rename { index, name } => self.rename(index, name)?,
            EditorCommand::EditContent { index, content } => self.edit_content(index, content)?,
            EditorCommand::ToggleImageFlag { index, page_number } => {
                self.toggle_image_flag(index, page_number)?;
            }
            EditorCommand::Add => {
                self.add();
            }
            EditorCommand::Delete { index } => {
                self.delete(index)?;
            }
            EditorCommand::ToggleExpansion { id } => {
                self.toggle_expansion(&id);
            }
            EditorCommand::Select { id } => self.select(id),
            EditorCommand::ResetSelection => self.reset_selection(),
            EditorCommand::OpenPreview { id } => {
                self.open_preview(&id);
            }
            EditorCommand::ClosePreview => self.close_preview(),
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), EditorError> {
        if index >= self.classifications.len() {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: self.classifications.len(),
            });
        }
        Ok(())
    }

    fn replace_at(
        &mut self,
        index: usize,
        f: impl FnOnce(&Classification) -> Classification,
    ) -> Result<(), EditorError> {
        self.check_index(index)?;
        let mut next = self.classifications.clone();
        next[index] = f(&self.classifications[index]);
        self.commit(next);
        Ok(())
    }

    fn commit(&mut self, next: Vec<Classification>) {
        self.classifications = next;
        self.revision += 1;
    }
}

pub fn run(args: EditArgs) -> anyhow::Result<()> {
    let classifications: Vec<Classification> =
        crate::output::read_json(&args.input).context("load classifications")?;
    let script = std::fs::read_to_string(&args.commands)
        .with_context(|| format!("read commands: {}", args.commands))?;

    let mut editor = ClassificationEditor::with_classifications(classifications);
    let mut applied = 0usize;
    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command: EditorCommand = serde_json::from_str(line)
            .with_context(|| format!("parse command at line {}", line_no + 1))?;
        tracing::debug!(?command, "apply");
        editor
            .apply(command)
            .with_context(|| format!("apply command at line {}", line_no + 1))?;
        applied += 1;
    }

    tracing::info!(
        commands = applied,
        classifications = editor.classifications().len(),
        "edit"
    );

    let json = serde_json::to_string_pretty(editor.classifications())
        .context("serialize classifications")?;
    crate::output::write_output(&args.out, &format!("{json}\n"), args.force)
}

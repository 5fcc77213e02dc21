//! Modal dialogs: the shared alert, the remove confirmation, the input
//! prompts, and the search form. One dialog at a time; whichever layer is
//! open owns the keyboard.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Text,
    Extension,
}

/// The search-in-files form. The confirm control is disabled whenever the
/// trimmed query is empty; it is re-evaluated on every keystroke and reset
/// to disabled each time the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDialog {
    pub dir: PathBuf,
    pub text: String,
    pub extension: String,
    pub active_field: SearchField,
    pub confirm_enabled: bool,
    /// A request is out; the dialog stays open until the result decides its
    /// fate.
    pub in_flight: bool,
}

impl SearchDialog {
    pub fn open(dir: PathBuf) -> Self {
        Self {
            dir,
            text: String::new(),
            extension: String::new(),
            active_field: SearchField::Text,
            confirm_enabled: false,
            in_flight: false,
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.active_field {
            SearchField::Text => self.text.push(c),
            SearchField::Extension => self.extension.push(c),
        }
        self.revalidate();
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            SearchField::Text => self.text.pop(),
            SearchField::Extension => self.extension.pop(),
        };
        self.revalidate();
    }

    pub fn toggle_field(&mut self) {
        self.active_field = match self.active_field {
            SearchField::Text => SearchField::Extension,
            SearchField::Extension => SearchField::Text,
        };
    }

    fn revalidate(&mut self) {
        self.confirm_enabled = !self.text.trim().is_empty();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewFile { parent: PathBuf },
    NewDir { parent: PathBuf },
    Rename { target: PathBuf },
    Import { dir: PathBuf },
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::NewFile { .. } => "New File",
            PromptKind::NewDir { .. } => "New Directory",
            PromptKind::Rename { .. } => "Rename",
            PromptKind::Import { .. } => "Import: local file paths",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDialog {
    pub kind: PromptKind,
    pub input: String,
}

impl PromptDialog {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    /// The rename prompt starts out holding the current name.
    pub fn rename(target: &Path) -> Self {
        let input = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            kind: PromptKind::Rename {
                target: target.to_path_buf(),
            },
            input,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    None,
    /// The shared alert every failed remote call reports through.
    Alert {
        message: String,
    },
    ConfirmRemove {
        target: PathBuf,
    },
    Prompt(PromptDialog),
    Search(SearchDialog),
}

impl Dialog {
    pub fn alert(message: impl Into<String>) -> Self {
        Dialog::Alert {
            message: message.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Dialog::None)
    }

    pub fn close(&mut self) {
        *self = Dialog::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_confirm_starts_disabled() {
        let dialog = SearchDialog::open(PathBuf::from("/proj"));
        assert!(!dialog.confirm_enabled);
        assert_eq!(dialog.active_field, SearchField::Text);
    }

    #[test]
    fn search_confirm_follows_the_query_on_every_keystroke() {
        let mut dialog = SearchDialog::open(PathBuf::from("/proj"));

        dialog.push_char('f');
        assert!(dialog.confirm_enabled);
        dialog.push_char('o');
        assert!(dialog.confirm_enabled);

        dialog.backspace();
        dialog.backspace();
        assert!(!dialog.confirm_enabled);
    }

    #[test]
    fn whitespace_only_query_never_enables_confirm() {
        let mut dialog = SearchDialog::open(PathBuf::from("/proj"));
        dialog.push_char(' ');
        dialog.push_char('\t');
        assert!(!dialog.confirm_enabled);
    }

    #[test]
    fn extension_field_does_not_enable_confirm() {
        let mut dialog = SearchDialog::open(PathBuf::from("/proj"));
        dialog.toggle_field();
        assert_eq!(dialog.active_field, SearchField::Extension);
        dialog.push_char('g');
        dialog.push_char('o');
        assert!(!dialog.confirm_enabled);

        dialog.toggle_field();
        dialog.push_char('x');
        assert!(dialog.confirm_enabled);
    }

    #[test]
    fn reopening_resets_the_form() {
        let mut dialog = SearchDialog::open(PathBuf::from("/proj"));
        dialog.push_char('x');
        assert!(dialog.confirm_enabled);

        let dialog = SearchDialog::open(PathBuf::from("/proj"));
        assert!(!dialog.confirm_enabled);
        assert!(dialog.text.is_empty());
        assert!(dialog.extension.is_empty());
    }

    #[test]
    fn rename_prompt_is_prefilled_with_the_current_name() {
        let prompt = PromptDialog::rename(Path::new("/proj/src/main.go"));
        assert_eq!(prompt.input, "main.go");
        assert_eq!(prompt.kind.title(), "Rename");
    }
}

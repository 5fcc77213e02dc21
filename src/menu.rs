//! Context-menu state machine.
//!
//! At most one context menu is ever visible: the state is either `Hidden`
//! or exactly one open menu, and opening a menu replaces whichever one was
//! showing. Item enablement is decided once, at open time, from the target
//! node's capability flags.

use std::path::PathBuf;

use crate::tree::TreeNode;

/// The menu anchor sits slightly above the pointer row, like the original
/// context menus.
pub const MENU_VERTICAL_BIAS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    NewFile,
    NewDir,
    Rename,
    Remove,
    Export,
    Import,
    Refresh,
    Search,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Open => "Open",
            MenuAction::NewFile => "New File",
            MenuAction::NewDir => "New Directory",
            MenuAction::Rename => "Rename",
            MenuAction::Remove => "Remove",
            MenuAction::Export => "Export as Zip",
            MenuAction::Import => "Import Files",
            MenuAction::Refresh => "Refresh",
            MenuAction::Search => "Search in Files",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub action: MenuAction,
    pub enabled: bool,
}

impl MenuItem {
    fn new(action: MenuAction, enabled: bool) -> Self {
        Self { action, enabled }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub kind: MenuKind,
    pub target: PathBuf,
    pub items: Vec<MenuItem>,
    pub selected: usize,
    /// (column, row) anchor in screen cells.
    pub anchor: (u16, u16),
}

impl ContextMenu {
    /// Build the menu for a node, gating items on its capability flags:
    /// directories gate create items on `creatable` and rename/remove on
    /// `removable`; files gate only remove.
    pub fn for_node(node: &TreeNode, anchor: (u16, u16)) -> Self {
        let anchor = (anchor.0, anchor.1.saturating_sub(MENU_VERTICAL_BIAS));
        let (kind, items) = if node.is_dir() {
            (
                MenuKind::Directory,
                vec![
                    MenuItem::new(MenuAction::NewFile, node.creatable),
                    MenuItem::new(MenuAction::NewDir, node.creatable),
                    MenuItem::new(MenuAction::Rename, node.removable),
                    MenuItem::new(MenuAction::Remove, node.removable),
                    MenuItem::new(MenuAction::Export, true),
                    MenuItem::new(MenuAction::Import, true),
                    MenuItem::new(MenuAction::Refresh, true),
                    MenuItem::new(MenuAction::Search, true),
                ],
            )
        } else {
            (
                MenuKind::File,
                vec![
                    MenuItem::new(MenuAction::Open, true),
                    MenuItem::new(MenuAction::Export, true),
                    MenuItem::new(MenuAction::Rename, true),
                    MenuItem::new(MenuAction::Remove, node.removable),
                ],
            )
        };

        Self {
            kind,
            target: node.path.clone(),
            items,
            selected: 0,
            anchor,
        }
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + self.items.len() - 1) % self.items.len();
        }
    }

    /// The selected action, or None when the item is disabled: a disabled
    /// item activates nothing (silent precondition short-circuit).
    pub fn activate(&self) -> Option<MenuAction> {
        self.items
            .get(self.selected)
            .filter(|item| item.enabled)
            .map(|item| item.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Hidden,
    Open(ContextMenu),
}

impl MenuState {
    /// Show the menu for `node`, replacing any menu already on screen.
    pub fn open_for(&mut self, node: &TreeNode, anchor: (u16, u16)) {
        *self = MenuState::Open(ContextMenu::for_node(node, anchor));
    }

    pub fn hide(&mut self) {
        *self = MenuState::Hidden;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MenuState::Open(_))
    }

    pub fn as_open(&self) -> Option<&ContextMenu> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Hidden => None,
        }
    }

    pub fn as_open_mut(&mut self) -> Option<&mut ContextMenu> {
        match self {
            MenuState::Open(menu) => Some(menu),
            MenuState::Hidden => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NodeKind;

    fn node(kind: NodeKind, removable: bool, creatable: bool) -> TreeNode {
        TreeNode {
            id: 0,
            name: "x".to_string(),
            path: PathBuf::from("/x"),
            parent_path: None,
            kind,
            is_expanded: false,
            removable,
            creatable,
            children: Vec::new(),
        }
    }

    fn item(menu: &ContextMenu, action: MenuAction) -> &MenuItem {
        menu.items
            .iter()
            .find(|item| item.action == action)
            .expect("menu item present")
    }

    #[test]
    fn file_menu_gates_remove_on_removable() {
        let menu = ContextMenu::for_node(&node(NodeKind::File, false, true), (0, 5));
        assert_eq!(menu.kind, MenuKind::File);
        assert!(!item(&menu, MenuAction::Remove).enabled);
        assert!(item(&menu, MenuAction::Open).enabled);
        assert!(item(&menu, MenuAction::Rename).enabled);

        let menu = ContextMenu::for_node(&node(NodeKind::File, true, true), (0, 5));
        assert!(item(&menu, MenuAction::Remove).enabled);
    }

    #[test]
    fn directory_menu_gates_create_on_creatable() {
        let menu = ContextMenu::for_node(&node(NodeKind::Directory, true, false), (0, 5));
        assert_eq!(menu.kind, MenuKind::Directory);
        assert!(!item(&menu, MenuAction::NewFile).enabled);
        assert!(!item(&menu, MenuAction::NewDir).enabled);
        assert!(item(&menu, MenuAction::Rename).enabled);
        assert!(item(&menu, MenuAction::Remove).enabled);
        assert!(item(&menu, MenuAction::Refresh).enabled);
    }

    #[test]
    fn directory_menu_gates_rename_and_remove_on_removable() {
        let menu = ContextMenu::for_node(&node(NodeKind::Directory, false, true), (0, 5));
        assert!(!item(&menu, MenuAction::Rename).enabled);
        assert!(!item(&menu, MenuAction::Remove).enabled);
        assert!(item(&menu, MenuAction::NewFile).enabled);
    }

    #[test]
    fn anchor_is_biased_upward() {
        let menu = ContextMenu::for_node(&node(NodeKind::File, true, true), (12, 5));
        assert_eq!(menu.anchor, (12, 5 - MENU_VERTICAL_BIAS));

        // Never underflows at the top edge.
        let menu = ContextMenu::for_node(&node(NodeKind::File, true, true), (12, 0));
        assert_eq!(menu.anchor, (12, 0));
    }

    #[test]
    fn at_most_one_menu_is_open() {
        let mut state = MenuState::default();
        assert!(!state.is_open());

        state.open_for(&node(NodeKind::File, true, true), (0, 3));
        assert_eq!(state.as_open().unwrap().kind, MenuKind::File);

        // Opening the directory menu replaces the file menu.
        state.open_for(&node(NodeKind::Directory, true, true), (0, 3));
        assert_eq!(state.as_open().unwrap().kind, MenuKind::Directory);

        state.hide();
        assert!(!state.is_open());
    }

    #[test]
    fn disabled_item_activates_nothing() {
        let mut menu = ContextMenu::for_node(&node(NodeKind::File, false, true), (0, 3));
        // Move onto the disabled Remove item.
        while menu.items[menu.selected].action != MenuAction::Remove {
            menu.select_next();
        }
        assert_eq!(menu.activate(), None);

        menu.select_next();
        assert_eq!(menu.selected, 0);
        assert_eq!(menu.activate(), Some(MenuAction::Open));
    }
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, PanelFocus};
use crate::dialog::{Dialog, PromptDialog, SearchDialog, SearchField};
use crate::menu::ContextMenu;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(app.config.layout.tree_panel_width),
            Constraint::Min(0),
        ])
        .split(rows[0]);

    draw_tree(frame, app, columns[0]);

    if app.search_results.is_empty() {
        draw_editor(frame, app, columns[1]);
    } else {
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Percentage(app.config.layout.results_panel_height),
            ])
            .split(columns[1]);
        draw_editor(frame, app, right[0]);
        draw_results(frame, app, right[1]);
    }

    draw_status_bar(frame, app, rows[1]);

    // Floating layers: exactly one context menu, then whichever dialog is
    // open.
    if let Some(menu) = app.menu.as_open() {
        draw_menu(frame, app, menu.clone());
    }
    match app.dialog.clone() {
        Dialog::None => {}
        Dialog::Alert { message } => draw_alert(frame, app, &message),
        Dialog::ConfirmRemove { target } => {
            draw_confirm(frame, app, &format!("Remove {}?", target.display()))
        }
        Dialog::Prompt(prompt) => draw_prompt(frame, app, &prompt),
        Dialog::Search(search) => draw_search(frame, app, &search),
    }
}

fn border_style(app: &App, panel: PanelFocus) -> Style {
    if app.focus == panel {
        Style::default().fg(app.config.colors.active_border)
    } else {
        Style::default().fg(app.config.colors.inactive_border)
    }
}

fn draw_tree(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title(" Workspace ")
        .borders(Borders::ALL)
        .border_style(border_style(app, PanelFocus::Tree));

    let inner = block.inner(area);
    app.tree_area = Some(inner);
    app.tree_viewport_height = inner.height as usize;

    if app.tree.roots.is_empty() {
        let hint = if app.is_loading {
            "Loading workspace..."
        } else {
            "No workspace loaded"
        };
        let paragraph = Paragraph::new(hint)
            .block(block)
            .style(Style::default().fg(app.config.colors.disabled_item));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = app.tree.visible_nodes_with_depth();

    // Keep the viewport inside the list after collapses shrank it.
    let max_offset = visible.len().saturating_sub(1);
    app.tree_scroll_offset = app.tree_scroll_offset.min(max_offset);

    let items: Vec<ListItem> = visible
        .iter()
        .skip(app.tree_scroll_offset)
        .take(inner.height as usize)
        .map(|(node, depth)| {
            let indent = "  ".repeat(*depth);
            let text = if node.is_dir() {
                let marker = if node.is_expanded { "▼" } else { "▶" };
                format!("{}{} {}", indent, marker, node.name)
            } else {
                format!("{}  {}", indent, node.name)
            };

            let selected = Some(&node.path) == app.tree.current_selection.as_ref();
            let style = if selected {
                Style::default()
                    .fg(app.config.colors.selected_fg)
                    .bg(app.config.colors.selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else if node.is_dir() {
                Style::default()
                    .fg(app.config.colors.directory)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn draw_editor(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.editor.current_tab() {
        Some(tab) => format!(" {} ", tab.title()),
        None => " Editor ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app, PanelFocus::Editor));

    let inner = block.inner(area);
    // Tab strip eats the first row when more than one file is open.
    let show_tabs = app.editor.tabs.len() > 1;
    let content_height = if show_tabs {
        inner.height.saturating_sub(1)
    } else {
        inner.height
    };
    app.editor.viewport_height = content_height as usize;

    let Some(tab) = app.editor.current_tab() else {
        let paragraph = Paragraph::new("Open a file from the workspace tree")
            .block(block)
            .style(Style::default().fg(app.config.colors.disabled_item));
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    if show_tabs {
        let mut spans: Vec<Span> = Vec::new();
        for (index, open) in app.editor.tabs.iter().enumerate() {
            let style = if Some(index) == app.editor.current {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(app.config.colors.disabled_item)
            };
            spans.push(Span::styled(format!(" {} ", open.title()), style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    for (number, text) in tab
        .lines
        .iter()
        .enumerate()
        .skip(tab.scroll_top)
        .take(content_height as usize)
    {
        let mut spans = Vec::new();
        if app.config.layout.show_line_numbers {
            spans.push(Span::styled(
                format!("{:4} ", number + 1),
                Style::default().fg(app.config.colors.directory),
            ));
        }
        if number == tab.cursor.line {
            spans.push(Span::styled(
                text.clone(),
                Style::default().add_modifier(Modifier::REVERSED),
            ));
        } else {
            spans.push(Span::raw(text.clone()));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Search Results ")
        .borders(Borders::ALL)
        .border_style(border_style(app, PanelFocus::Results));

    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_item = None;
    let mut flat_index = 0usize;

    for batch in &app.search_results {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("\"{}\" ({} matches)", batch.query, batch.matches.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ))));
        for hit in &batch.matches {
            if flat_index == app.results_cursor {
                selected_item = Some(items.len());
            }
            items.push(ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}:{}", hit.path, hit.line),
                    Style::default().fg(app.config.colors.match_path),
                ),
                Span::raw(" "),
                Span::raw(hit.snippet.clone()),
            ])));
            flat_index += 1;
        }
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(app.config.colors.selected_fg)
            .bg(app.config.colors.selected_bg),
    );

    let mut state = ListState::default();
    if app.focus == PanelFocus::Results {
        state.select(selected_item);
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = if app.is_loading {
        format!("Loading... | {}", app.status_message)
    } else {
        app.status_message.clone()
    };

    let help_text = match app.focus {
        PanelFocus::Tree => "Enter: Open | m: Menu | /: Search | r: Refresh | Del: Remove | q: Quit",
        PanelFocus::Editor => "Tab: Switch panel | Ctrl+N/P: Cycle tabs | Ctrl+W: Close tab",
        PanelFocus::Results => "Tab: Switch panel | Enter: Jump to match",
    };

    // The footer cursor readout, 1-based line:column.
    let cursor_text = app
        .editor
        .cursor_readout()
        .map(|readout| format!("|   {}   |", readout))
        .unwrap_or_default();

    let status_line = Line::from(vec![
        Span::styled(
            status_text,
            Style::default().fg(app.config.colors.status_bar_fg),
        ),
        Span::raw(" "),
        Span::raw(cursor_text),
        Span::raw(" "),
        Span::styled(
            help_text,
            Style::default().fg(app.config.colors.disabled_item),
        ),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(app.config.colors.status_bar_bg));
    frame.render_widget(paragraph, area);
}

fn draw_menu(frame: &mut Frame, app: &App, menu: ContextMenu) {
    let width = menu
        .items
        .iter()
        .map(|item| item.action.label().len())
        .max()
        .unwrap_or(10) as u16
        + 4;
    let height = menu.items.len() as u16 + 2;
    let area = anchored_rect(frame.area(), menu.anchor, width, height);

    let items: Vec<ListItem> = menu
        .items
        .iter()
        .map(|item| {
            let style = if item.enabled {
                Style::default()
            } else {
                Style::default().fg(app.config.colors.disabled_item)
            };
            ListItem::new(Span::styled(item.action.label(), style))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(app.config.colors.selected_fg)
                .bg(app.config.colors.selected_bg),
        );

    let mut state = ListState::default();
    state.select(Some(menu.selected));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_alert(frame: &mut Frame, app: &App, message: &str) {
    let area = centered_rect(frame.area(), 50, 5);
    let paragraph = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(app.config.colors.disabled_item),
        )),
    ])
    .block(Block::default().title(" Alert ").borders(Borders::ALL));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_confirm(frame: &mut Frame, app: &App, question: &str) {
    let area = centered_rect(frame.area(), 50, 5);
    let paragraph = Paragraph::new(vec![
        Line::from(question.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter to confirm, n/Esc to cancel",
            Style::default().fg(app.config.colors.disabled_item),
        )),
    ])
    .block(Block::default().title(" Confirm ").borders(Borders::ALL));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_prompt(frame: &mut Frame, app: &App, prompt: &PromptDialog) {
    let area = centered_rect(frame.area(), 50, 4);
    let paragraph = Paragraph::new(vec![Line::from(vec![
        Span::raw("> "),
        Span::raw(prompt.input.clone()),
        Span::styled("█", Style::default().fg(app.config.colors.active_border)),
    ])])
    .block(
        Block::default()
            .title(format!(" {} ", prompt.kind.title()))
            .borders(Borders::ALL),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn draw_search(frame: &mut Frame, app: &App, search: &SearchDialog) {
    let area = centered_rect(frame.area(), 56, 7);

    let field_line = |label: &str, value: &str, active: bool| {
        let marker = if active { "> " } else { "  " };
        let mut spans = vec![
            Span::raw(marker.to_string()),
            Span::styled(format!("{:<11}", label), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(value.to_string()),
        ];
        if active {
            spans.push(Span::styled(
                "█",
                Style::default().fg(app.config.colors.active_border),
            ));
        }
        Line::from(spans)
    };

    let confirm_label = if search.in_flight {
        "[ Searching... ]"
    } else {
        "[ Search ]"
    };
    let confirm_style = if search.confirm_enabled && !search.in_flight {
        Style::default()
            .fg(app.config.colors.active_border)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.config.colors.disabled_item)
    };

    let paragraph = Paragraph::new(vec![
        field_line(
            "Text:",
            &search.text,
            search.active_field == SearchField::Text,
        ),
        field_line(
            "Extension:",
            &search.extension,
            search.active_field == SearchField::Extension,
        ),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(confirm_label, confirm_style),
            Span::styled(
                "   Tab: switch field, Enter: search, Esc: cancel",
                Style::default().fg(app.config.colors.disabled_item),
            ),
        ]),
    ])
    .block(
        Block::default()
            .title(format!(" Search in {} ", search.dir.display()))
            .borders(Borders::ALL),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(frame: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(frame.width);
    let height = height.min(frame.height);
    Rect {
        x: frame.x + (frame.width - width) / 2,
        y: frame.y + (frame.height - height) / 2,
        width,
        height,
    }
}

/// Place a popup at an anchor point, nudged back inside the frame when it
/// would spill over an edge.
fn anchored_rect(frame: Rect, anchor: (u16, u16), width: u16, height: u16) -> Rect {
    let width = width.min(frame.width);
    let height = height.min(frame.height);
    let x = anchor.0.min(frame.width.saturating_sub(width));
    let y = anchor.1.min(frame.height.saturating_sub(height));
    Rect {
        x: frame.x + x,
        y: frame.y + y,
        width,
        height,
    }
}

// tui.rs

use chrono::{Local, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{io, time::Duration};

use crate::app::{App, InputMode};
use crate::item::Item;
use crate::list::NoticeLevel;

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()>
where
    std::io::Error: From<<B as Backend>::Error>,
{
    app.refresh();

    loop {
        app.drain_outcomes();
        terminal.draw(|f| ui(f, app))?;

        if !crossterm::event::poll(Duration::from_millis(100))? {
            continue;
        }
        let CEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('a') => app.begin_add(),
                KeyCode::Char('e') | KeyCode::Enter => app.begin_edit_selected(),
                KeyCode::Char('d') | KeyCode::Char(' ') => app.toggle_selected(),
                // Delete needs Shift+R
                KeyCode::Char('R') => app.delete_selected(),
                KeyCode::Char('r') => app.refresh(),
                KeyCode::Char('/') | KeyCode::Char('?') => app.input_mode = InputMode::Searching,
                KeyCode::Char('s') => app.toggle_sort_by_due_date(),
                KeyCode::Char('c') => app.toggle_show_completed(),
                KeyCode::Char('g') => app.generate_sample(),
                KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
                KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => app.next_page(),
                KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => app.previous_page(),
                KeyCode::Esc => app.status = None,
                _ => {}
            },
            InputMode::Searching => match key.code {
                KeyCode::Enter => app.input_mode = InputMode::Normal,
                KeyCode::Esc => {
                    app.set_search_term("");
                    app.input_mode = InputMode::Normal;
                }
                KeyCode::Char(c) => app.push_search_char(c),
                KeyCode::Backspace => app.pop_search_char(),
                _ => {}
            },
            InputMode::EditingTitle | InputMode::EditingDescription | InputMode::EditingDueDate => {
                match key.code {
                    KeyCode::Enter => app.advance_form(),
                    KeyCode::Esc => app.cancel_form(),
                    KeyCode::Tab => {
                        app.input_mode = match app.input_mode {
                            InputMode::EditingTitle => InputMode::EditingDescription,
                            InputMode::EditingDescription => InputMode::EditingDueDate,
                            _ => InputMode::EditingTitle,
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(field) = app.form_field_mut() {
                            field.push(c);
                        }
                    }
                    KeyCode::Backspace => {
                        if let Some(field) = app.form_field_mut() {
                            field.pop();
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn is_overdue(item: &Item) -> bool {
    !item.is_done && item.date.map(|d| d < Utc::now()).unwrap_or(false)
}

fn due_label(item: &Item) -> String {
    match item.date {
        Some(d) => format!("Due date: {}", d.with_timezone(&Local).format("%Y-%m-%d")),
        None => String::new(),
    }
}

fn item_lines(item: &Item) -> Vec<Line<'static>> {
    let mark = if item.is_done { "(x)" } else { "( )" };
    let dim = Style::default().fg(Color::DarkGray);
    let title_style = if item.is_done {
        dim.add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let due_style = if is_overdue(item) {
        Style::default().fg(Color::Red)
    } else {
        dim
    };

    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", mark)),
            Span::styled(item.title.clone(), title_style),
        ]),
        Line::from(Span::styled(
            format!("    {}", item.description),
            if item.is_done { dim } else { Style::default() },
        )),
    ];
    let due = due_label(item);
    if !due.is_empty() {
        lines.push(Line::from(Span::styled(format!("    {}", due), due_style)));
    }
    lines
}

fn empty_message(app: &App) -> &'static str {
    if app.is_loading() {
        "Loading…"
    } else if app.manager().list().is_empty() {
        "No items yet. Press [a] to add one or [g] for a sample."
    } else {
        "No items found."
    }
}

fn ui(f: &mut ratatui::Frame<'_>, app: &App) {
    let size = f.area();
    let editing = matches!(
        app.input_mode,
        InputMode::EditingTitle | InputMode::EditingDescription | InputMode::EditingDueDate
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title + flags
            Constraint::Length(3), // search
            Constraint::Min(4),    // items
            Constraint::Length(1), // pagination
            Constraint::Length(1), // status
            Constraint::Length(1), // help
        ])
        .split(size);

    render_header(f, app, rows[0]);
    render_search(f, app, rows[1]);

    let view = app.view();
    if view.page.is_empty() {
        let empty = Paragraph::new(empty_message(app))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title(" Items "));
        f.render_widget(empty, rows[2]);
    } else {
        let list_items: Vec<ListItem> = view
            .page
            .iter()
            .map(|item| ListItem::new(item_lines(item)))
            .collect();
        let mut state = ListState::default();
        if !editing {
            state.select(Some(app.selected));
        }
        let list = List::new(list_items)
            .block(Block::default().borders(Borders::ALL).title(" Items "))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, rows[2], &mut state);
    }

    let prev_style = if view.current_page == 1 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let next_style = if view.current_page >= view.total_pages {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let pager = Paragraph::new(Line::from(vec![
        Span::styled("< Previous", prev_style),
        Span::raw(format!("   Page {} of {}   ", view.current_page, view.total_pages)),
        Span::styled("Next >", next_style),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(pager, rows[3]);

    if let Some(notice) = app.status.as_ref() {
        let color = match notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Failure => Color::Red,
        };
        let status = Paragraph::new(Span::styled(notice.message.clone(), Style::default().fg(color)));
        f.render_widget(status, rows[4]);
    }

    let help = match app.input_mode {
        InputMode::Normal => {
            "[a] Add  [e] Edit  [d] Done  [R] Delete  [/] Search  [s] Sort  [c] Completed  [g] Generate  [r] Refresh  [←/→] Page  [q] Quit"
        }
        InputMode::Searching => "Type to search  [Enter] Keep  [Esc] Clear",
        _ => "[Enter] Next/Save  [Tab] Field  [Esc] Cancel",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::Gray)).alignment(Alignment::Center),
        rows[5],
    );

    if editing {
        render_form(f, app, centered_rect(60, 50, size));
    }
}

fn render_header(f: &mut ratatui::Frame<'_>, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "ToDo App",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    let completed = app.manager().completed_count();
    if completed > 0 {
        spans.push(Span::raw(format!("   {} Completed · ", completed)));
        spans.push(Span::styled(
            if app.query.show_completed { "Hide [c]" } else { "Show [c]" },
            Style::default().fg(Color::Yellow),
        ));
    }
    if app.query.sort_by_due_date {
        spans.push(Span::styled("   Sorted by due date", Style::default().fg(Color::Magenta)));
    }
    if app.is_loading() {
        spans.push(Span::styled("   syncing…", Style::default().fg(Color::DarkGray)));
    }
    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_search(f: &mut ratatui::Frame<'_>, app: &App, area: Rect) {
    let active = app.input_mode == InputMode::Searching;
    let text = if app.query.search_term.is_empty() && !active {
        Span::styled("Search items...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.query.search_term.clone())
    };
    let border = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Search "),
    );
    f.render_widget(search, area);
    if active {
        let x = area.x + 1 + app.query.search_term.chars().count() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_form(f: &mut ratatui::Frame<'_>, app: &App, area: Rect) {
    f.render_widget(ratatui::widgets::Clear, area);
    let title = if app.form.editing.is_some() { " Edit Item " } else { " Create a new item " };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(inner);

    let field = |label: &'static str, value: &str, mode: InputMode, placeholder: &'static str| {
        let active = app.input_mode == mode;
        let content = if value.is_empty() {
            Span::styled(placeholder, Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.to_string())
        };
        Paragraph::new(Line::from(content)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if active { Style::default().fg(Color::Yellow) } else { Style::default() })
                .title(label),
        )
    };

    f.render_widget(field("Title", &app.form.title, InputMode::EditingTitle, "Add a title"), fields[0]);
    f.render_widget(
        field("Description", &app.form.description, InputMode::EditingDescription, "Add a description"),
        fields[1],
    );
    f.render_widget(
        field("Due date", &app.form.due_date, InputMode::EditingDueDate, "e.g. 2030-06-01, tomorrow, fri 15:30"),
        fields[2],
    );

    if let Some(err) = app.form.error.as_ref() {
        let error = Paragraph::new(Span::styled(err.clone(), Style::default().fg(Color::Red)))
            .wrap(Wrap { trim: true });
        f.render_widget(error, fields[3]);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(date: Option<chrono::DateTime<Utc>>, is_done: bool) -> Item {
        Item {
            id: 1,
            title: "t".into(),
            description: "d".into(),
            date,
            is_done,
        }
    }

    #[test]
    fn overdue_only_when_open_and_past() {
        let past = Some(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        let future = Some(Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap());
        assert!(is_overdue(&item(past, false)));
        assert!(!is_overdue(&item(past, true)));
        assert!(!is_overdue(&item(future, false)));
        assert!(!is_overdue(&item(None, false)));
    }

    #[test]
    fn empty_message_tells_no_items_from_no_matches() {
        let store = std::sync::Arc::new(crate::store::MemoryStore::with_items(vec![item(None, false)]));
        let mut app = App::new(store, 4);
        assert_eq!(empty_message(&app), "No items yet. Press [a] to add one or [g] for a sample.");
        app.refresh();
        app.settle();
        app.set_search_term("nothing like this");
        assert_eq!(empty_message(&app), "No items found.");
    }

    #[test]
    fn item_without_date_has_two_lines() {
        assert_eq!(item_lines(&item(None, false)).len(), 2);
        assert!(due_label(&item(None, false)).is_empty());
    }
}

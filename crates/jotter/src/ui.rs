use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use std::ops::Range;

use crate::app::App;
use crate::file_picker::{FilePicker, PickerMode};
use crate::keymap::Action;
use crate::status_manager::MessageType;
use crate::text_width::TextWidth;
use crate::ui_state::{Mode, Notice};

pub fn draw(f: &mut Frame, app: &mut App) {
    let screen = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Text area
            Constraint::Length(1), // Status line
        ])
        .split(screen);

    draw_title_bar(f, app, chunks[0]);
    draw_text_area(f, app, chunks[1]);
    draw_status_line(f, app, chunks[2]);

    match app.mode() {
        Mode::Picker => {
            if let Some(picker) = app.picker.as_ref() {
                draw_picker(f, picker, screen);
            }
        }
        Mode::Notice => {
            if let Some(notice) = app.ui_state.notice.as_ref() {
                draw_notice(f, notice, "[ OK ]", screen);
            }
        }
        Mode::Confirm => {
            if let Some(picker) = app.picker.as_ref() {
                draw_picker(f, picker, screen);
            }
            if let Some(notice) = app.ui_state.notice.as_ref() {
                draw_notice(f, notice, "[ Y ] Yes   [ N ] No", screen);
            }
        }
        Mode::Editing => {}
    }
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let modified = if app.is_modified() { " *" } else { "" };
    let title = match app.file_path() {
        Some(path) => format!("  Jotter - {}{}", path.display(), modified),
        None => format!("  Jotter - Untitled{}", modified),
    };

    let hints = [Action::Open, Action::Save, Action::Quit]
        .into_iter()
        .filter_map(|action| app.keymap.hint(action))
        .collect::<Vec<_>>()
        .join("  ");
    let hints = format!("{}  ", hints);

    let style = Style::default().bg(Color::Blue).fg(Color::White);
    let hint_width = hints.chars().count() as u16;
    // Hints give way to the file name on narrow screens.
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(hint_width)])
        .split(area);
    let (title_area, hint_area) = if area.width >= hint_width.saturating_mul(2) {
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    f.render_widget(
        Paragraph::new(title).style(style).alignment(Alignment::Left),
        title_area,
    );
    if let Some(hint_area) = hint_area {
        f.render_widget(
            Paragraph::new(hints).style(style).alignment(Alignment::Right),
            hint_area,
        );
    }
}

fn draw_text_area(f: &mut Frame, app: &mut App, area: Rect) {
    if area.width < 2 || area.height == 0 {
        return;
    }

    let line_count = app.session.buffer.line_count();
    let gutter = if app.config.editor.line_numbers {
        line_count.to_string().len() as u16 + 2
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(gutter),
            Constraint::Min(0),
            Constraint::Length(1), // Scrollbar
        ])
        .split(area);
    let text_rect = chunks[1];

    let tw = app.text_width();
    let buffer = &app.session.buffer;
    let (cursor_line, cursor_char) = buffer.cursor_line_col();
    let cursor_line_text = buffer.line_text(cursor_line).unwrap_or_default();
    let cursor_col = tw.col_of(&cursor_line_text, cursor_char);

    let viewport = &mut app.ui_state.viewport;
    viewport.height = text_rect.height as usize;
    viewport.width = text_rect.width as usize;
    viewport.follow(cursor_line, cursor_col);
    let viewport = *viewport;

    let selection = buffer.selection();
    let last = line_count.min(viewport.top_line + viewport.height);
    let lines: Vec<Line> = (viewport.top_line..last)
        .map(|idx| {
            let text = buffer.line_text(idx).unwrap_or_default();
            let start = buffer.line_to_char(idx);
            let selection = selection.clone();
            render_line(&tw, &text, start, selection, viewport.left_col, viewport.width)
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).style(Style::default().fg(Color::White)),
        text_rect,
    );

    if gutter > 0 {
        let numbers: Vec<Line> = (viewport.top_line..last)
            .map(|idx| {
                let width = gutter as usize - 2;
                Line::from(format!("{:>width$} ", idx + 1, width = width))
            })
            .collect();
        f.render_widget(
            Paragraph::new(numbers).style(Style::default().fg(Color::DarkGray)),
            chunks[0],
        );
    }

    let mut scrollbar_state = ScrollbarState::new(line_count.saturating_sub(1))
        .position(viewport.top_line)
        .viewport_content_length(viewport.height);
    f.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        chunks[2],
        &mut scrollbar_state,
    );

    // A zero-sized text area keeps its old scroll offsets, which can put
    // the cursor left of or above the viewport.
    if app.mode() == Mode::Editing {
        let col = cursor_col.checked_sub(viewport.left_col);
        let row = cursor_line.checked_sub(viewport.top_line);
        if let (Some(col), Some(row)) = (col, row) {
            if col < text_rect.width as usize && row < text_rect.height as usize {
                f.set_cursor(text_rect.x + col as u16, text_rect.y + row as u16);
            }
        }
    }
}

/// One visible row, with the selected chars highlighted.
fn render_line(
    tw: &TextWidth,
    text: &str,
    line_start: usize,
    selection: Option<Range<usize>>,
    skip: usize,
    width: usize,
) -> Line<'static> {
    let selected = Style::default().add_modifier(Modifier::REVERSED);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_selected = false;

    for (idx, cells) in tw.visible_cells(text, skip, width) {
        let in_selection = selection
            .as_ref()
            .is_some_and(|r| r.contains(&(line_start + idx)));
        if in_selection != run_selected && !run.is_empty() {
            let style = if run_selected { selected } else { Style::default() };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_selected = in_selection;
        run.push_str(&cells);
    }

    // A selected line break shows as one highlighted cell.
    let newline_at = line_start + text.trim_end_matches(['\n', '\r']).chars().count();
    let break_selected = text.ends_with('\n')
        && selection.as_ref().is_some_and(|r| r.contains(&newline_at))
        && tw.str_width(text) >= skip
        && tw.str_width(text) < skip + width;

    if !run.is_empty() {
        let style = if run_selected { selected } else { Style::default() };
        spans.push(Span::styled(run, style));
    }
    if break_selected {
        spans.push(Span::styled(" ", selected));
    }
    Line::from(spans)
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let (line, col) = app.session.buffer.cursor_line_col();
    let position = format!(
        " Ln {}, Col {} | {}pt | UTF-8 ",
        line + 1,
        col + 1,
        app.session.zoom().size()
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(position.chars().count() as u16),
        ])
        .split(area);

    let mode = Span::styled(
        format!(" {} ", app.ui_state.mode_label()),
        Style::default()
            .bg(Color::Gray)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );
    let message = match app.ui_state.status.current() {
        Some(message) => {
            let color = match message.message_type {
                MessageType::Info => Color::White,
                MessageType::Success => Color::Green,
                MessageType::Warning => Color::Yellow,
                MessageType::Error => Color::Red,
            };
            Span::styled(format!(" {}", message.content), Style::default().fg(color))
        }
        None => Span::styled(
            format!(" {}", app.session.display_name()),
            Style::default().fg(Color::Gray),
        ),
    };

    let left = Paragraph::new(Line::from(vec![mode, message]))
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(left, chunks[0]);
    f.render_widget(
        Paragraph::new(position)
            .style(Style::default().bg(Color::DarkGray).fg(Color::White))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_picker(f: &mut Frame, picker: &FilePicker, screen: Rect) {
    let area = centered_rect(70, 70, screen);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", picker.title()))
        .title(
            Title::from(format!(" {} ", picker.filter().label()))
                .position(Position::Bottom)
                .alignment(Alignment::Right),
        )
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let input_height = if picker.mode() == PickerMode::Save { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Directory
            Constraint::Min(0),               // Entries
            Constraint::Length(input_height), // File name
            Constraint::Length(1),            // Hints
        ])
        .split(inner);

    let header = match picker.error() {
        Some(error) => Line::from(Span::styled(
            format!("{}: {}", picker.current_dir().display(), error),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            picker.current_dir().display().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    };
    f.render_widget(Paragraph::new(header), chunks[0]);

    let items: Vec<ListItem> = picker
        .entries()
        .iter()
        .map(|entry| {
            if entry.is_directory {
                ListItem::new(format!("{}/", entry.name)).style(Style::default().fg(Color::Cyan))
            } else {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:<40} ", entry.name)),
                    Span::styled(entry.modified_label(), Style::default().fg(Color::DarkGray)),
                ]))
            }
        })
        .collect();
    let mut state = ListState::default();
    if !picker.entries().is_empty() {
        state.select(Some(picker.selected_index()));
    }
    f.render_stateful_widget(
        List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
        chunks[1],
        &mut state,
    );

    if picker.mode() == PickerMode::Save {
        let input = Paragraph::new(format!("File name: {}", picker.filename()))
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(input, chunks[2]);
        let typed = TextWidth::default().str_width(picker.filename());
        let x = chunks[2].x as usize + "File name: ".len() + typed;
        if x < chunks[2].right() as usize {
            f.set_cursor(x as u16, chunks[2].y);
        }
    }

    let confirm = match picker.mode() {
        PickerMode::Open => "open",
        PickerMode::Save => "save",
    };
    let hints = Line::from(vec![
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}  ", confirm)),
        Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" filter  "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" cancel"),
    ]);
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn draw_notice(f: &mut Frame, notice: &Notice, buttons: &str, screen: Rect) {
    let area = centered_rect(50, 30, screen);
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(""),
        Line::from(notice.body.clone()),
        Line::from(""),
        Line::from(Span::styled(
            buttons.to_string(),
            Style::default().add_modifier(Modifier::REVERSED),
        )),
    ];
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", notice.title))
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let rows = Layout::default()
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
        .split(rows[1])[1]
}

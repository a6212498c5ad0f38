use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::cluster::Item;

use super::app::{App, Mode};
use super::form::FORM_HINT;

pub fn render(frame: &mut Frame, app: &App) {
    if app.mode == Mode::Form {
        render_form(frame, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(frame.area());
    render_status_panel(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);

    if app.show_help {
        render_help_overlay(frame, app);
    }
}

fn render_status_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    if app.mode == Mode::Deletion {
        lines.push(Line::from(Span::styled(
            "Queued for deletion:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        for name in app.queue.names() {
            lines.push(Line::from(format!("  {}", name)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from("'c' confirms, 'esc' cancels"));
        lines.push(Line::from(""));
    }
    for line in app.status.lines() {
        lines.push(Line::from(line.to_string()));
    }
    if let Some(saved) = &app.saved_at {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Saved at {}", saved.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let panel = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(panel, area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let title = {
        let current = app.current.borrow();
        format!("{} | {}", current.path(), current.stats_line())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let items = app.items();
    if items.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "Nothing here yet. 'n' creates the first entry.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<ListItem> = items.iter().map(list_entry).collect();
    let mut state = ListState::default();
    state.select(Some(app.selected_index(rows.len())));
    let list = List::new(rows)
        .highlight_symbol("> ")
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(block);
    frame.render_stateful_widget(list, area, &mut state);
}

fn list_entry(item: &Item) -> ListItem<'static> {
    let mut lines = match item {
        Item::Cluster(cluster) => {
            let cluster = cluster.borrow();
            vec![
                Line::from(Span::styled(
                    item.title(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("  {}", item.description())),
                Line::from(format!("  {}", cluster.stats_line())),
                Line::from(format!(
                    "  {} of job",
                    progress_bar(cluster.job_progress, 20)
                )),
            ]
        }
        Item::Phone(phone) => {
            let phone = phone.borrow();
            phone
                .status_string()
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect()
        }
    };
    lines.push(Line::from(""));
    ListItem::new(Text::from(lines))
}

/// Fixed-width text bar, progress clamped into [0, 1].
fn progress_bar(progress: f64, width: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    format!(
        "[{}{}] {:3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        clamped * 100.0
    )
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 70, frame.area());
    let mut lines = vec![
        Line::from(Span::styled(
            "Browsing",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  enter    open the selected cluster"),
        Line::from("  b        back to the parent cluster"),
        Line::from("  up/down  move the selection"),
        Line::from("  n        new cluster or phone"),
        Line::from("  e        edit the selected entry"),
        Line::from("  d        queue the selected entry for deletion"),
        Line::from("  s / x    start / stop the cluster job"),
        Line::from("  r        restart the cluster job"),
        Line::from("  p        preview the selected cluster's subtree"),
        Line::from("  z        show host resource usage"),
        Line::from("  h or ?   toggle this help"),
        Line::from("  q        quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Deletion mode",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("  d        toggle the mark on the selected entry"),
        Line::from("  c        confirm, removing every marked entry"),
        Line::from("  esc      cancel and restore the names"),
    ];
    if app.mode == Mode::Deletion {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Deletion mode is active",
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Help")),
        area,
    );
}

fn render_form(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let form = &app.form;
    let mut lines: Vec<Line> = vec![Line::from("")];
    for &field in form.fields() {
        let focused = field == form.focus;
        let marker = if focused { "> " } else { "  " };
        let cursor = if focused { "_" } else { "" };
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}: {}{}", marker, field.label(), form.value(field), cursor),
            style,
        )));
    }
    lines.push(Line::from(""));
    if !form.message.is_empty() {
        lines.push(Line::from(Span::styled(
            form.message.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        FORM_HINT,
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(form.title()));
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Mode, Picker};
use crate::diagram::{self, parse_color};
use crate::playback::{AppState, Selection};
use crate::view;

const TITLE: &str = " 5G Flow Visualization ";
const KEY_COLOR: Color = Color::Cyan;
const LABEL_COLOR: Color = Color::Gray;
const LOG_PANE_HEIGHT: u16 = 10;
/// Log lines visible at once inside the pane borders.
pub const LOG_ROWS: usize = LOG_PANE_HEIGHT as usize - 2;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(LOG_PANE_HEIGHT),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.size());
    let screen = f.size();

    let state = app.store.get_state();
    draw_header(f, chunks[0], state);
    draw_diagram(f, chunks[1], state);
    draw_log(f, chunks[2], state, app.log_back);
    draw_progress(f, chunks[3], state);
    draw_controls(f, chunks[4], app);

    if let Mode::Picker(picker) = &app.mode {
        draw_picker(f, screen, app, picker);
    }
}

fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let name = if state.flow_name.is_empty() {
        "(no flow selected)"
    } else {
        state.flow_name.as_str()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Flow: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(
            name.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().title(TITLE).borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_diagram(f: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title(" Call Flow ").borders(Borders::ALL);
    let inner = block.inner(area);

    let paragraph = match &state.selection {
        Selection::Loaded(flow) => {
            f.render_widget(block, area);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(diagram::HEADER_ROWS as u16),
                    Constraint::Min(0),
                ])
                .split(inner);
            let ladder = diagram::render_ladder(flow, &state.playback, inner.width);
            let scroll = (ladder.focus_row + 1).saturating_sub(chunks[1].height as usize);
            f.render_widget(Paragraph::new(ladder.header), chunks[0]);
            f.render_widget(
                Paragraph::new(ladder.body).scroll((clamp_u16(scroll), 0)),
                chunks[1],
            );
            return;
        }
        Selection::Failed(message) => Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Failed to load flow '{}'", state.flow_name),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from("Press f to pick another flow."),
        ])
        .wrap(Wrap { trim: true }),
        Selection::Unselected => Paragraph::new("Press f to pick a flow."),
    };
    f.render_widget(paragraph.block(block), area);
}

/// `back` counts lines scrolled up from the newest one.
fn draw_log(f: &mut Frame, area: Rect, state: &AppState, back: usize) {
    let lines: Vec<Line> = state
        .flow()
        .map(|flow| {
            view::log_lines(flow, &state.playback)
                .into_iter()
                .map(|line| {
                    Line::from(Span::styled(
                        line.text,
                        Style::default().fg(parse_color(line.color)),
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let title = if back > 0 {
        format!(" Log (scrolled back {back}) ")
    } else {
        " Log ".to_string()
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let height = block.inner(area).height as usize;
    let scroll = lines.len().saturating_sub(height).saturating_sub(back);
    let log = Paragraph::new(lines)
        .block(block)
        .scroll((clamp_u16(scroll), 0));
    f.render_widget(log, area);
}

fn draw_progress(f: &mut Frame, area: Rect, state: &AppState) {
    let (title, line) = match state.flow() {
        Some(flow) if !flow.steps.is_empty() => {
            let current = flow.clamp_step(state.playback.current_step);
            let marks = view::progress_marks(flow);
            let ticks: Vec<Span> = flow
                .steps
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    let style = Style::default().fg(parse_color(&step.color));
                    if i < current {
                        Span::styled("● ", style)
                    } else if i == current {
                        Span::styled("◆ ", style.add_modifier(Modifier::BOLD))
                    } else {
                        Span::styled("○ ", Style::default().fg(Color::DarkGray))
                    }
                })
                .collect();
            (
                format!(" Step Progress: {} of {} ", marks[current], marks.len()),
                Line::from(ticks),
            )
        }
        _ => (" Step Progress ".to_string(), Line::from("no steps")),
    };
    let progress =
        Paragraph::new(line).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(progress, area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let playback = &app.store.get_state().playback;
    let key = Style::default().fg(KEY_COLOR).add_modifier(Modifier::BOLD);
    let label = Style::default().fg(LABEL_COLOR);

    let mut spans = vec![
        Span::styled("[space] ", key),
        Span::styled(
            view::control_label(playback),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Delay (ms): ", label),
    ];
    match &app.mode {
        Mode::DelayEdit(buffer) => {
            spans.push(Span::styled(
                format!("{buffer}_"),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ));
            spans.push(Span::styled("  [enter] set  [esc] cancel", label));
        }
        _ => {
            spans.push(Span::styled(playback.interval_ms.to_string(), key));
            spans.push(Span::styled(
                "  [←/→] step  [↑/↓] log  [+/-] delay  [d] edit delay  [f] flows  [q] quit",
                label,
            ));
        }
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Red),
        ));
    }

    let controls =
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(controls, area);
}

fn draw_picker(f: &mut Frame, screen: Rect, app: &App, picker: &Picker) {
    let area = centered_rect(60, 60, screen);
    let hits = app.catalog.filter(&picker.query);
    let entries = app.catalog.entries();

    let items: Vec<ListItem> = hits
        .iter()
        .map(|&i| {
            ListItem::new(entries[i].name.as_str()).style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let mut list_state = ListState::default();
    if !hits.is_empty() {
        list_state.select(Some(picker.selected.min(hits.len() - 1)));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Flows: {}_ ", picker.query))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )
        .highlight_symbol(">> ");

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut list_state);
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

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

//! Ladder (sequence) diagram for a flow: one lifeline per node, one arrow
//! per revealed step.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::Flow;
use crate::playback::PlaybackState;
use crate::view;

pub const MIN_COLUMN_WIDTH: usize = 14;
const HIGHLIGHT_COLOR: Color = Color::Red;
const LIFELINE_COLOR: Color = Color::DarkGray;
pub const HEADER_ROWS: usize = 4;

/// Flow files use ratatui color names (`"lightblue"`) or `#RRGGBB`.
pub fn parse_color(name: &str) -> Color {
    Color::from_str(name.trim()).unwrap_or(Color::Gray)
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

pub struct Ladder {
    /// Node boxes plus the first lifeline row; always `HEADER_ROWS` tall.
    pub header: Vec<Line<'static>>,
    /// Label and arrow rows of the revealed steps.
    pub body: Vec<Line<'static>>,
    /// Body row of the current step's arrow, for scrolling it into view.
    pub focus_row: usize,
}

struct Row {
    cells: Vec<(char, Style)>,
}

impl Row {
    fn new(width: usize) -> Self {
        Self {
            cells: vec![(' ', Style::default()); width],
        }
    }

    fn with_lifelines(width: usize, centers: &[usize]) -> Self {
        let mut row = Self::new(width);
        for &x in centers {
            row.put(x, '│', Style::default().fg(LIFELINE_COLOR));
        }
        row
    }

    fn put(&mut self, x: usize, ch: char, style: Style) {
        if let Some(cell) = self.cells.get_mut(x) {
            *cell = (ch, style);
        }
    }

    fn put_str(&mut self, x: usize, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i, ch, style);
        }
    }

    fn into_line(self) -> Line<'static> {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut text = String::new();
        let mut current: Option<Style> = None;
        for (ch, style) in self.cells {
            if current != Some(style) {
                if let Some(prev) = current {
                    spans.push(Span::styled(std::mem::take(&mut text), prev));
                }
                current = Some(style);
            }
            text.push(ch);
        }
        if let Some(prev) = current {
            spans.push(Span::styled(text, prev));
        }
        Line::from(spans)
    }
}

struct BoxChars {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const LIGHT: BoxChars = BoxChars {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

const HEAVY: BoxChars = BoxChars {
    top_left: '┏',
    top_right: '┓',
    bottom_left: '┗',
    bottom_right: '┛',
    horizontal: '━',
    vertical: '┃',
};

pub fn render_ladder(flow: &Flow, playback: &PlaybackState, width: u16) -> Ladder {
    let columns = flow.nodes.len().max(1);
    let col_w = (width as usize / columns).max(MIN_COLUMN_WIDTH);
    let total = col_w * columns;
    let centers: Vec<usize> = (0..flow.nodes.len())
        .map(|j| j * col_w + col_w / 2)
        .collect();

    let highlighted = view::highlighted_node(flow, playback);
    let header = header_rows(flow, highlighted, &centers, col_w, total);
    let mut rows = Vec::new();

    let edges = view::revealed_edges(flow, playback);
    let last = edges.len().saturating_sub(1);
    let mut focus_row = 0;

    for edge in &edges {
        let (Some(from), Some(to)) = (flow.node_index(edge.source), flow.node_index(edge.target))
        else {
            continue;
        };
        let (from, to) = (centers[from], centers[to]);
        let mut style = Style::default().fg(parse_color(edge.color));
        if edge.index == last {
            style = style.add_modifier(Modifier::BOLD);
        }

        let mut label_row = Row::with_lifelines(total, &centers);
        let mut arrow_row = Row::with_lifelines(total, &centers);

        if from == to {
            let label = truncate(&edge.label, total.saturating_sub(from + 5));
            label_row.put_str(from + 4, &label, style);
            arrow_row.put_str(from, "├─↺", style);
        } else {
            let (lo, hi) = (from.min(to), from.max(to));
            let label = truncate(&edge.label, total);
            let len = label.chars().count();
            let start = ((lo + hi) / 2)
                .saturating_sub(len / 2)
                .min(total.saturating_sub(len));
            label_row.put_str(start, &label, style);

            for x in lo + 1..hi {
                let ch = if centers.contains(&x) { '┼' } else { '─' };
                arrow_row.put(x, ch, style);
            }
            arrow_row.put(from, '●', style);
            if to > from {
                arrow_row.put(to - 1, '▶', style);
            } else {
                arrow_row.put(to + 1, '◀', style);
            }
        }

        rows.push(label_row);
        rows.push(arrow_row);
        focus_row = rows.len() - 1;
    }

    Ladder {
        header: header.into_iter().map(Row::into_line).collect(),
        body: rows.into_iter().map(Row::into_line).collect(),
        focus_row,
    }
}

fn header_rows(
    flow: &Flow,
    highlighted: Option<&str>,
    centers: &[usize],
    col_w: usize,
    total: usize,
) -> Vec<Row> {
    let mut rows: Vec<Row> = (0..HEADER_ROWS - 1).map(|_| Row::new(total)).collect();

    for (node, &center) in flow.nodes.iter().zip(centers) {
        let color = parse_color(&node.color);
        let is_active = highlighted == Some(node.id.as_str());
        let (chars, border) = if is_active {
            (
                &HEAVY,
                Style::default()
                    .fg(HIGHLIGHT_COLOR)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (&LIGHT, Style::default().fg(color))
        };
        let fill = Style::default()
            .fg(Color::White)
            .bg(color)
            .add_modifier(Modifier::BOLD);

        let label = truncate(&node.label, col_w.saturating_sub(4));
        let inner = label.chars().count() + 2;
        let left = center.saturating_sub((inner + 2) / 2);
        let right = left + inner + 1;

        rows[0].put(left, chars.top_left, border);
        rows[2].put(left, chars.bottom_left, border);
        for x in left + 1..right {
            rows[0].put(x, chars.horizontal, border);
            rows[1].put(x, ' ', fill);
            rows[2].put(x, chars.horizontal, border);
        }
        rows[0].put(right, chars.top_right, border);
        rows[2].put(right, chars.bottom_right, border);
        rows[1].put(left, chars.vertical, border);
        rows[1].put(right, chars.vertical, border);
        rows[1].put_str(left + 2, &label, fill);
    }

    rows.push(Row::with_lifelines(total, centers));
    rows
}

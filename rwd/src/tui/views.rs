//! TUI views and rendering
//!
//! Draws the UI from AppState; never modifies it.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::trace;

use super::state::{AppState, LogStyle, ParticipantRow};
use crate::banner;
use crate::lock::LockState;
use crate::participant::{Kind, ParticipantState};

mod colors {
    use ratatui::style::Color;

    pub const READING: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const WRITING: Color = Color::Rgb(255, 69, 0); // Orange red
    pub const WAITING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const EXITING: Color = Color::Rgb(100, 149, 237); // Cornflower blue
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const DIM: Color = Color::DarkGray;
}

fn holding_color(kind: Kind) -> Color {
    match kind {
        Kind::Reader => colors::READING,
        Kind::Writer => colors::WRITING,
    }
}

fn state_color(row: &ParticipantRow) -> Color {
    match row.state {
        ParticipantState::NotStarted | ParticipantState::Done => colors::DIM,
        ParticipantState::Started => colors::WAITING,
        ParticipantState::HoldingLock => holding_color(row.kind),
        ParticipantState::ReleasedPendingExit => colors::EXITING,
    }
}

fn state_icon(state: ParticipantState) -> &'static str {
    match state {
        ParticipantState::NotStarted => " ",
        ParticipantState::Started => "○",
        ParticipantState::HoldingLock => "●",
        ParticipantState::ReleasedPendingExit => "↻",
        ParticipantState::Done => "✓",
    }
}

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    trace!("render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    let lists = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[0]);
    render_participants(" Readers (S) ", &state.readers, frame, lists[0]);
    render_participants(" Writers (X) ", &state.writers, frame, lists[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(0)])
        .split(body[1]);
    render_assertions(frame, right[0]);
    render_log(state, frame, right[1]);

    render_footer(state, frame, chunks[2]);
}

fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    let lock_color = match state.lock_state {
        LockState::Free => colors::DIM,
        LockState::Shared(_) => colors::READING,
        LockState::Exclusive => colors::WRITING,
    };

    let mut spans = vec![
        Span::styled(
            " rwdemo",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ lock: "),
        Span::styled(state.lock_state.to_string(), Style::default().fg(lock_color)),
        Span::raw(format!(
            " │ readers: {} │ writers: {}",
            state.readers.len(),
            state.writers.len()
        )),
    ];
    if state.exiting > 0 {
        spans.push(Span::styled(
            format!(" │ exiting: {}", state.exiting),
            Style::default().fg(colors::EXITING),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_participants(title: &str, rows: &[ParticipantRow], frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = if rows.is_empty() {
        vec![Line::from(Span::styled("  (none)", Style::default().fg(colors::DIM)))]
    } else {
        rows.iter()
            .map(|row| {
                let color = state_color(row);
                Line::from(vec![
                    Span::styled(format!(" {} ", state_icon(row.state)), Style::default().fg(color)),
                    Span::raw(format!("{} {:<4}", row.kind.label(), row.id)),
                    Span::styled(row.state.to_string(), Style::default().fg(color)),
                ])
            })
            .collect()
    };

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(widget, area);
}

fn render_assertions(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = banner::ASSERTIONS.iter().map(|a| Line::from(*a)).collect();
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Verify "));
    frame.render_widget(widget, area);
}

fn render_log(state: &AppState, frame: &mut Frame, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.log.len().saturating_sub(visible);

    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(skip)
        .map(|line| {
            let color = match line.style {
                LogStyle::Waiting => colors::WAITING,
                LogStyle::Holding(kind) => holding_color(kind),
                LogStyle::Exiting => colors::EXITING,
                LogStyle::Notice => colors::DIM,
                LogStyle::Error => colors::ERROR,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", line.at.format("%H:%M:%S%.3f")),
                    Style::default().fg(colors::DIM),
                ),
                Span::styled(line.text.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Events "));
    frame.render_widget(widget, area);
}

fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    let line = match &state.status {
        Some(status) => Line::from(Span::styled(format!(" {}", status), Style::default().fg(colors::WAITING))),
        None => Line::from(Span::styled(
            format!(" {}", state.key_help.join(" │ ")),
            Style::default().fg(colors::DIM),
        )),
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

use crate::shared::{DisplayState, RowDisplay, STEPS_PER_BAR, STEPS_PER_BEAT};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

const LABEL_WIDTH: u16 = 11;
const GAUGE_CELLS: usize = 4;

// one row per track: a label column then the 16 step cells
pub fn draw_step_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    if state.rows.is_empty() {
        return;
    }
    let row_constraints = vec![Constraint::Ratio(1, state.rows.len() as u32); state.rows.len()];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (track, (row, row_area)) in state.rows.iter().zip(rows.iter()).enumerate() {
        let [label_area, cells_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LABEL_WIDTH), Constraint::Min(STEPS_PER_BAR as u16)])
            .areas(*row_area);

        frame.render_widget(track_label(row, track == state.selected_track), label_area);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, STEPS_PER_BAR as u32); STEPS_PER_BAR])
            .split(cells_area);

        for (step, cell_area) in cols.iter().enumerate() {
            let cursor = track == state.selected_track && step == state.selected_step;
            let playhead = state.playing_step == Some(step as u8);
            let style = cell_style(row.steps[step], row.muted, playhead, cursor, step);
            frame.render_widget(Block::default().style(style), *cell_area);
        }
    }
}

fn track_label(row: &RowDisplay, selected: bool) -> Paragraph<'static> {
    let mark = if selected { ">" } else { " " };
    let flag = if row.muted { "M" } else { " " };
    let text = format!("{mark}{} {flag} {}", row.label, velocity_gauge(row.velocity));
    let mut style = Style::default().fg(Color::White);
    if row.muted {
        style = style.fg(Color::DarkGray);
    }
    if selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    Paragraph::new(Span::styled(text, style))
}

// velocity as a short bar, rounded to the nearest cell
fn velocity_gauge(velocity: f32) -> String {
    let filled = ((velocity.clamp(0.0, 1.0) * GAUGE_CELLS as f32).round() as usize).min(GAUGE_CELLS);
    format!("{}{}", "█".repeat(filled), "·".repeat(GAUGE_CELLS - filled))
}

pub(crate) fn cell_style(on: bool, muted: bool, playhead: bool, cursor: bool, step: usize) -> Style {
    let mut style = match (on, muted) {
        (true, false) => Style::default().bg(Color::Magenta),
        (true, true) => Style::default().bg(Color::DarkGray),
        // every beat gets a slightly lighter empty cell so the bar is readable
        (false, _) if step % STEPS_PER_BEAT == 0 => Style::default().bg(Color::Indexed(237)),
        (false, _) => Style::default().bg(Color::Indexed(235)),
    };
    if playhead {
        style = style.bg(if on && !muted { Color::LightMagenta } else { Color::Gray });
    }
    if cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

use crate::shared::{DisplayState, STEPS_PER_BAR};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid;

const HELP: &str = "space play  arrows/hjkl move  enter step  m mute  [ ] { } tempo  - = vel  c clear  esc quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // lcd screen
            Constraint::Min(8),    // step grid
            Constraint::Length(1), // key help
        ])
        .split(area);

    draw_screen(frame, sections[0], state, blink_on);
    grid::draw_step_grid(frame, sections[1], state);
    frame.render_widget(
        Paragraph::new(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
        sections[2],
    );
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let lcd = Style::default().fg(Color::Black).bg(Color::Rgb(160, 180, 150));
    let block = Block::default().borders(Borders::ALL).style(lcd);

    let mut spans = vec![Span::styled(format!(" {:>3.0} BPM ", state.bpm), lcd.add_modifier(Modifier::BOLD))];
    if !state.audio_ready {
        spans.push(Span::styled(" NO AUDIO ", lcd.add_modifier(Modifier::BOLD | Modifier::REVERSED)));
    }
    spans.push(Span::styled(transport_text(state, blink_on), lcd));
    spans.push(Span::styled(format!(" {} ", step_counter(state)), lcd));
    if !state.display_text.is_empty() {
        spans.push(Span::styled(format!(" {}", state.display_text), lcd.add_modifier(Modifier::BOLD)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn transport_text(state: &DisplayState, blink_on: bool) -> &'static str {
    match (state.playing, blink_on) {
        (true, true) => " > PLAY ",
        (true, false) => "   PLAY ",
        (false, _) => " # STOP ",
    }
}

// 1-based for the screen, dashes while nothing is sounding
fn step_counter(state: &DisplayState) -> String {
    match state.playing_step {
        Some(step) => format!("{:02}/{STEPS_PER_BAR}", step + 1),
        None => format!("--/{STEPS_PER_BAR}"),
    }
}

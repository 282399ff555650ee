//! Stateless rendering of the game view.

use super::app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use strictly_wordgrid::{Coord, SessionState, SpecialZone, TurnPhase};
use strum::IntoEnumIterator;

const CELL_WIDTH: usize = 3;
const ROW_LABEL_WIDTH: usize = 4;
const KEY_HELP: &str =
    "arrows move | 1-7 select | Enter place | c commit | x cancel | e end turn | s start | l language | q quit";

/// Renders the whole view.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Board and side panel
            Constraint::Length(3), // Status
            Constraint::Length(1), // Keys
        ])
        .split(area);

    let title = Paragraph::new("Strictly Letters")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    match app.state() {
        Some(state) => {
            let board_width = ROW_LABEL_WIDTH + state.board().size() * CELL_WIDTH + 2;
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(u16::try_from(board_width).unwrap_or(u16::MAX)),
                    Constraint::Min(24),
                ])
                .split(chunks[1]);

            let board = Paragraph::new(board_lines(state, app.cursor()))
                .block(Block::default().title("Board").borders(Borders::ALL));
            frame.render_widget(board, body[0]);

            let side = Paragraph::new(side_lines(state))
                .block(Block::default().title("Game").borders(Borders::ALL));
            frame.render_widget(side, body[1]);
        }
        None => {
            let waiting = Paragraph::new("Connecting...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(waiting, chunks[1]);
        }
    }

    let status = Paragraph::new(app.status_message())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    let keys = Paragraph::new(KEY_HELP).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(keys, chunks[3]);
}

/// Column header followed by one line per board row.
///
/// Empty cells show their zone code or `.`; staged glyphs are yellow and
/// the cursor cell is inverted.
pub fn board_lines(state: &SessionState, cursor: Coord) -> Vec<Line<'static>> {
    let size = state.board().size();
    let mut lines = Vec::with_capacity(size + 1);

    let header: String = std::iter::once(" ".repeat(ROW_LABEL_WIDTH))
        .chain((0..size).map(|col| format!("{col:>3}")))
        .collect();
    lines.push(Line::from(Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )));

    for row in 0..size {
        let mut spans = Vec::with_capacity(size + 1);
        spans.push(Span::styled(
            format!("{row:>3} "),
            Style::default().fg(Color::DarkGray),
        ));
        for col in 0..size {
            spans.push(cell_span(state, Coord::new(row, col), cursor));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn cell_span(state: &SessionState, coord: Coord, cursor: Coord) -> Span<'static> {
    let board = state.board();
    let (text, base_style) = match board.get(coord) {
        Some(glyph) if state.staging().is_staged_at(coord) => (
            glyph.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Some(glyph) => (
            glyph.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        None => match board.zone_at(coord) {
            Some(zone) => (zone.to_string(), zone_style(zone)),
            None => (".".to_string(), Style::default().fg(Color::DarkGray)),
        },
    };

    let style = if coord == cursor {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };
    Span::styled(format!("{text:>3}"), style)
}

fn zone_style(zone: SpecialZone) -> Style {
    let color = match zone {
        SpecialZone::TripleWord => Color::Red,
        SpecialZone::DoubleWord => Color::Magenta,
        SpecialZone::TripleLetter => Color::Blue,
        SpecialZone::DoubleLetter => Color::Cyan,
    };
    Style::default().fg(color)
}

/// Whose turn it is, from the local player's point of view.
pub fn turn_text(state: &SessionState) -> String {
    match state.turn().phase() {
        TurnPhase::WaitingForGameStart => "Waiting for the game to start".to_string(),
        TurnPhase::Turn(_) if state.is_local_players_turn() => "Your turn".to_string(),
        TurnPhase::Turn(player) => {
            let name = state
                .scores()
                .get(player)
                .map_or_else(|| player.to_string(), |p| p.display_name().clone());
            format!("{name}'s turn")
        }
    }
}

/// Turn, scores, rack and zone legend.
pub fn side_lines(state: &SessionState) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(turn_text(state), heading.fg(Color::Green))),
        Line::default(),
    ];

    if !state.scores().is_empty() {
        lines.push(Line::from(Span::styled("Scores", heading)));
        for player in state.scores().players() {
            let marker = if player.id() == state.local_player() { " (you)" } else { "" };
            lines.push(Line::from(format!(
                "  {}{}: {}",
                player.display_name(),
                marker,
                player.score()
            )));
        }
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled("Rack", heading)));
    let mut rack = vec![Span::raw(" ")];
    for (i, tile) in state.rack().tiles().iter().enumerate() {
        let style = if state.rack().selected() == Some(*tile.id()) {
            Style::default().bg(Color::White).fg(Color::Black)
        } else {
            Style::default()
        };
        rack.push(Span::styled(format!("{}:{}", i + 1, tile.glyph()), style));
        rack.push(Span::raw(" "));
    }
    lines.push(Line::from(rack));
    if !state.staging().is_empty() {
        lines.push(Line::from(format!("  {} staged", state.staging().len())));
    }

    if state.is_administrator() {
        lines.push(Line::default());
        lines.push(Line::from(format!("Language: {}", state.language())));
    }

    lines.push(Line::default());
    for zone in SpecialZone::iter() {
        lines.push(Line::from(vec![
            Span::styled(format!("{zone:>3}"), zone_style(zone)),
            Span::raw(format!(" {}", zone.label())),
        ]));
    }
    lines
}

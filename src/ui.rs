use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{EventKind, EventOutcome, RenderContext};
use tui_dispatch_components::centered_rect;

use crate::action::Action;
use crate::state::{AppState, BattlePhase, CardDisplay};

const BG_BASE: Color = Color::Rgb(20, 24, 34);
const BG_PANEL: Color = Color::Rgb(30, 36, 50);
const BG_PANEL_ALT: Color = Color::Rgb(26, 31, 44);
const TEXT_MAIN: Color = Color::Rgb(222, 228, 238);
const TEXT_DIM: Color = Color::Rgb(150, 160, 178);
const ACCENT_RED: Color = Color::Rgb(222, 82, 82);
const ACCENT_GREEN: Color = Color::Rgb(104, 204, 120);
const ACCENT_GOLD: Color = Color::Rgb(226, 196, 120);
const HIGHLIGHT_BG: Color = Color::Rgb(90, 120, 200);
const HIGHLIGHT_TEXT: Color = Color::Rgb(12, 16, 24);
const BORDER_ACCENT: Color = Color::Rgb(70, 84, 112);

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, _ctx: RenderContext) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title bar
            Constraint::Min(8),    // body
            Constraint::Length(1), // key hints
        ])
        .split(area);

    render_title(frame, layout[0], state);
    match state.phase {
        BattlePhase::Browsing | BattlePhase::AwaitingStart => {
            render_browse(frame, layout[1], state);
        }
        BattlePhase::Battling | BattlePhase::AwaitingMove | BattlePhase::Ended(_) => {
            render_battle(frame, layout[1], state);
        }
    }
    render_hints(frame, layout[2], state);

    if let Some(error) = state.error.as_deref() {
        render_error_popup(frame, area, error);
    }
}

fn render_title(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACCENT))
        .style(Style::default().bg(BG_PANEL_ALT));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(
        state.title(),
        Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
    )];
    if state.phase.request_pending() {
        spans.push(Span::styled(
            "  [contacting server...]",
            Style::default().fg(ACCENT_GOLD),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

// ===== Pokedex browsing =====

fn render_browse(frame: &mut Frame, area: Rect, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(30)])
        .split(area);
    render_catalog(frame, layout[0], state);
    render_card(frame, layout[1], &state.my_card, CardFace::Mine, state);
}

fn render_catalog(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" POKEDEX ", BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.catalog_loading {
        let paragraph = Paragraph::new("[loading catalog]")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, inner);
        return;
    }

    // Keep the selection in view.
    let visible = inner.height as usize;
    let first = state
        .catalog_index
        .saturating_sub(visible.saturating_sub(1))
        .min(state.catalog.len().saturating_sub(visible.max(1)));

    let mut lines = Vec::with_capacity(visible);
    for (idx, entry) in state.catalog.iter().enumerate().skip(first).take(visible) {
        let discovered = state.is_discovered(&entry.name);
        let label = if discovered {
            entry.name.clone()
        } else {
            "??????".to_string()
        };
        let style = if idx == state.catalog_index {
            Style::default()
                .fg(HIGHLIGHT_TEXT)
                .bg(HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD)
        } else if discovered {
            Style::default().fg(TEXT_MAIN)
        } else {
            Style::default().fg(TEXT_DIM)
        };
        lines.push(Line::from(Span::styled(format!(" {label} "), style)));
    }
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ===== Battle mode =====

fn render_battle(frame: &mut Frame, area: Rect, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // the two cards
            Constraint::Length(4), // turn results
            Constraint::Length(6), // move menu
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[0]);
    render_card(frame, cards[0], &state.my_card, CardFace::Mine, state);
    render_card(frame, cards[1], &state.their_card, CardFace::Theirs, state);

    render_results(frame, layout[1], state);
    render_command(frame, layout[2], state);
}

#[derive(Clone, Copy, PartialEq)]
enum CardFace {
    Mine,
    Theirs,
}

fn render_card(frame: &mut Frame, area: Rect, card: &CardDisplay, face: CardFace, state: &AppState) {
    let title = match (face, card.name()) {
        (CardFace::Mine, Some(name)) => format!(" {} ", name.to_ascii_uppercase()),
        (CardFace::Mine, None) => " YOUR POKEMON ".to_string(),
        (CardFace::Theirs, Some(name)) => format!(" WILD {} ", name.to_ascii_uppercase()),
        (CardFace::Theirs, None) => " OPPONENT ".to_string(),
    };
    let block = panel_block(&title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(detail) = card.detail.as_ref() else {
        let hint = if face == CardFace::Mine && state.detail_loading {
            "[loading]"
        } else if face == CardFace::Mine {
            "Select a Pokemon from the Pokedex"
        } else {
            "[no opponent]"
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, inner);
        return;
    };

    let mut lines = vec![
        hp_line(card),
        Line::from(Span::styled(
            format!("type {}  weak to {}", icon_label(&detail.type_icon), icon_label(&detail.weakness_icon)),
            Style::default().fg(TEXT_DIM),
        )),
        marker_line(card),
        Line::from(" "),
    ];
    if !detail.description.is_empty() {
        lines.push(Line::from(Span::styled(
            detail.description.clone(),
            Style::default().fg(TEXT_DIM),
        )));
    }
    if face == CardFace::Mine && !detail.moves.is_empty() {
        lines.push(Line::from(" "));
        for (idx, mv) in detail.moves.iter().enumerate() {
            let dp = mv
                .dp
                .map(|dp| format!("{dp} DP"))
                .unwrap_or_default();
            let selected = state.phase == BattlePhase::Battling && idx == state.move_index;
            let style = if selected {
                Style::default()
                    .fg(HIGHLIGHT_TEXT)
                    .bg(HIGHLIGHT_BG)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(TEXT_MAIN)
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<14}", mv.name), style),
                Span::styled(format!(" {:<8}", mv.element), Style::default().fg(TEXT_DIM)),
                Span::styled(dp, Style::default().fg(ACCENT_GOLD)),
            ]));
        }
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(TEXT_MAIN))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" TURN RESULTS ", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(line) = state.p1_result_line.as_deref() {
        lines.push(Line::from(line.to_string()));
    }
    if let Some(line) = state.p2_result_line.as_deref() {
        lines.push(Line::from(line.to_string()));
    }
    if state.phase == BattlePhase::AwaitingMove {
        lines.push(Line::from(Span::styled(
            "[waiting for the server...]",
            Style::default().fg(ACCENT_GOLD),
        )));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines)).style(Style::default().fg(TEXT_MAIN)),
        inner,
    );
}

fn render_command(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" COMMAND ", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = match state.phase {
        BattlePhase::Battling => vec![
            Line::from("Pick a move with Up/Down."),
            Line::from(Span::styled(
                "Enter: Use move  |  F: Flee the battle",
                Style::default().fg(TEXT_DIM),
            )),
        ],
        BattlePhase::AwaitingMove => vec![Line::from(Span::styled(
            "Waiting for the turn to resolve...",
            Style::default().fg(TEXT_DIM),
        ))],
        BattlePhase::Ended(_) => vec![
            Line::from(state.title()),
            Line::from(Span::styled(
                "Enter: Back to the Pokedex",
                Style::default().fg(TEXT_DIM),
            )),
        ],
        _ => Vec::new(),
    };
    frame.render_widget(
        Paragraph::new(Text::from(lines)).style(Style::default().fg(TEXT_MAIN)),
        inner,
    );
}

fn render_hints(frame: &mut Frame, area: Rect, state: &AppState) {
    let hint = match state.phase {
        BattlePhase::Browsing => "Up/Down: Browse  |  Enter: View  |  S: Choose this Pokemon!  |  Q: Quit",
        BattlePhase::AwaitingStart => "Starting a battle...",
        BattlePhase::Battling => "Up/Down: Move  |  Enter: Use  |  F: Flee  |  Q: Quit",
        BattlePhase::AwaitingMove => "Waiting...",
        BattlePhase::Ended(_) => "Enter: End game  |  Q: Quit",
    };
    let paragraph = Paragraph::new(hint).style(Style::default().fg(TEXT_DIM));
    frame.render_widget(paragraph, area);
}

fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup = centered_rect(60, 10, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" PROBLEM ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_RED))
        .style(Style::default().bg(BG_PANEL_ALT));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = error.lines().map(|part| Line::from(part.to_string())).collect();
    lines.push(Line::from(" "));
    lines.push(Line::from(Span::styled(
        "Enter/Esc: Dismiss",
        Style::default().fg(TEXT_DIM),
    )));
    let paragraph = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(TEXT_MAIN))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn hp_line(card: &CardDisplay) -> Line<'static> {
    let width: usize = 16;
    let filled = ((card.hp_percent as usize * width + 50) / 100).min(width);
    let empty = width - filled;
    let color = if card.low_health {
        ACCENT_RED
    } else if card.hp_percent > 50 {
        ACCENT_GREEN
    } else {
        ACCENT_GOLD
    };
    let hp_text = card
        .shown_hp()
        .map(|hp| format!(" {hp}HP"))
        .unwrap_or_default();
    Line::from(vec![
        Span::raw("HP "),
        Span::styled(
            "█".repeat(filled),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled("░".repeat(empty), Style::default().fg(TEXT_DIM)),
        Span::raw(format!(" {}%", card.hp_percent)),
        Span::raw(hp_text),
    ])
}

fn marker_line(card: &CardDisplay) -> Line<'static> {
    let mut spans = Vec::new();
    for buff in &card.buffs {
        spans.push(Span::styled(
            format!("▲{buff} "),
            Style::default().fg(ACCENT_GREEN),
        ));
    }
    for debuff in &card.debuffs {
        spans.push(Span::styled(
            format!("▼{debuff} "),
            Style::default().fg(ACCENT_RED),
        ));
    }
    if spans.is_empty() {
        spans.push(Span::styled("no effects", Style::default().fg(TEXT_DIM)));
    }
    Line::from(spans)
}

/// Icon URLs come as paths like "icons/fire.jpg"; show the bare name.
fn icon_label(path: &str) -> String {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .trim_end_matches(".jpg")
        .trim_end_matches(".png")
        .to_string()
}

fn panel_block<'a>(title: &str, bg: Color) -> Block<'a> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACCENT))
        .style(Style::default().bg(bg))
}

// ===== Event handling =====

pub fn handle_event(event: &EventKind, state: &AppState) -> EventOutcome<Action> {
    match event {
        EventKind::Resize(width, height) => {
            EventOutcome::action(Action::UiTerminalResize(*width, *height)).with_render()
        }
        EventKind::Key(key) => handle_key(*key, state),
        _ => EventOutcome::ignored(),
    }
}

fn handle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    if state.error.is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                EventOutcome::action(Action::DismissError)
            }
            _ => EventOutcome::ignored(),
        };
    }

    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
        return EventOutcome::action(Action::Quit);
    }

    match state.phase {
        BattlePhase::Browsing => handle_browse_key(key, state),
        BattlePhase::Battling => handle_battle_key(key, state),
        BattlePhase::Ended(_) => match key.code {
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                EventOutcome::action(Action::EndGame)
            }
            _ => EventOutcome::ignored(),
        },
        // A request is pending; everything but quit is inert.
        BattlePhase::AwaitingStart | BattlePhase::AwaitingMove => EventOutcome::ignored(),
    }
}

fn handle_browse_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let count = state.catalog.len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') if count > 0 => {
            let new_idx = if state.catalog_index == 0 {
                count - 1
            } else {
                state.catalog_index - 1
            };
            EventOutcome::action(Action::CatalogSelect(new_idx))
        }
        KeyCode::Down | KeyCode::Char('j') if count > 0 => {
            let new_idx = if state.catalog_index + 1 >= count {
                0
            } else {
                state.catalog_index + 1
            };
            EventOutcome::action(Action::CatalogSelect(new_idx))
        }
        KeyCode::Enter | KeyCode::Char('z') | KeyCode::Char('Z') => {
            EventOutcome::action(Action::CatalogConfirm)
        }
        KeyCode::Char('s') | KeyCode::Char('S') => EventOutcome::action(Action::ChoosePokemon),
        _ => EventOutcome::ignored(),
    }
}

fn handle_battle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let move_count = state
        .my_card
        .detail
        .as_ref()
        .map_or(0, |detail| detail.moves.len());
    match key.code {
        KeyCode::Up | KeyCode::Char('k') if move_count > 0 => {
            let new_idx = if state.move_index == 0 {
                move_count - 1
            } else {
                state.move_index - 1
            };
            EventOutcome::action(Action::MoveSelect(new_idx))
        }
        KeyCode::Down | KeyCode::Char('j') if move_count > 0 => {
            let new_idx = if state.move_index + 1 >= move_count {
                0
            } else {
                state.move_index + 1
            };
            EventOutcome::action(Action::MoveSelect(new_idx))
        }
        KeyCode::Enter | KeyCode::Char('z') | KeyCode::Char('Z') => {
            EventOutcome::action(Action::MoveConfirm)
        }
        KeyCode::Char('f') | KeyCode::Char('F') => EventOutcome::action(Action::Flee),
        _ => EventOutcome::ignored(),
    }
}

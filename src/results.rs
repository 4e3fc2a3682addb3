//! Pure mapping from a turn response to display deltas. No state, no I/O.

use crate::state::{PlayerTurn, TurnReport};

/// Display update for one side of the battle, computed from its slice of a
/// turn response.
#[derive(Clone, Debug, PartialEq)]
pub struct SideView {
    pub current_hp: u32,
    pub hp_percent: u8,
    pub low_health: bool,
    pub buffs: Vec<String>,
    pub debuffs: Vec<String>,
}

/// Health as a rounded percentage, half rounding away from zero the way the
/// game service's own consumers compute it (17/39 is 44, not 43).
pub fn hp_percent(current_hp: u32, max_hp: u32) -> u8 {
    if max_hp == 0 {
        return 0;
    }
    (current_hp as f64 / max_hp as f64 * 100.0).round() as u8
}

/// One human-readable turn line. A miss reads "...and missed!", anything
/// else gets a plain exclamation: "...and hit!", "...and lost!".
pub fn turn_line(mover: &str, move_name: &str, outcome: &str) -> String {
    let suffix = if outcome == "miss" { "ed!" } else { "!" };
    format!("{} played {} and {}{}", mover, move_name, outcome, suffix)
}

/// The opponent's line is suppressed once it never got to move: an empty
/// move name, or its health already at zero.
pub fn opponent_line(report: &TurnReport) -> Option<String> {
    if report.p2_move.is_empty() || hp_percent(report.p2.current_hp, report.p2.hp) == 0 {
        return None;
    }
    Some(turn_line("Player 2", &report.p2_move, &report.p2_result))
}

/// Status-effect tags to render, one marker per entry. The service reports
/// "no effects" as a single empty string, which renders as no markers.
pub fn marker_tags(tags: &[String]) -> Vec<String> {
    if tags.first().is_some_and(|tag| tag.is_empty()) {
        return Vec::new();
    }
    tags.to_vec()
}

pub fn side_view(turn: &PlayerTurn, low_hp_percent: u8) -> SideView {
    let percent = hp_percent(turn.current_hp, turn.hp);
    SideView {
        current_hp: turn.current_hp,
        hp_percent: percent,
        low_health: percent <= low_hp_percent,
        buffs: marker_tags(&turn.buffs),
        debuffs: marker_tags(&turn.debuffs),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn turn(current_hp: u32, max_hp: u32) -> PlayerTurn {
        PlayerTurn {
            name: "Gengar".into(),
            hp: max_hp,
            current_hp,
            buffs: Vec::new(),
            debuffs: Vec::new(),
        }
    }

    #[test]
    fn hp_percent_rounds_half_up() {
        assert_eq!(hp_percent(17, 39), 44);
        assert_eq!(hp_percent(1, 8), 13); // 12.5 rounds away from zero
        assert_eq!(hp_percent(39, 39), 100);
        assert_eq!(hp_percent(0, 39), 0);
    }

    #[test]
    fn hp_percent_with_zero_max_is_zero() {
        assert_eq!(hp_percent(10, 0), 0);
    }

    #[test]
    fn miss_reads_past_tense() {
        assert_eq!(
            turn_line("Player 1", "Tackle", "miss"),
            "Player 1 played Tackle and missed!"
        );
        assert_eq!(
            turn_line("Player 1", "Tackle", "hit"),
            "Player 1 played Tackle and hit!"
        );
        assert_eq!(
            turn_line("Player 2", "Flee", "lost"),
            "Player 2 played Flee and lost!"
        );
    }

    #[test]
    fn empty_string_sentinel_renders_no_markers() {
        assert_eq!(marker_tags(&["".to_string()]), Vec::<String>::new());
        assert_eq!(marker_tags(&["burn".to_string()]), vec!["burn".to_string()]);
        assert_eq!(marker_tags(&[]), Vec::<String>::new());
    }

    #[test]
    fn low_health_flag_uses_threshold() {
        assert!(side_view(&turn(8, 40), 20).low_health); // exactly 20%
        assert!(!side_view(&turn(9, 40), 20).low_health);
        assert!(side_view(&turn(9, 40), 30).low_health);
    }

    #[test]
    fn opponent_line_suppressed_after_defeat() {
        let mut report = TurnReport {
            p1: turn(20, 40),
            p2: turn(0, 40),
            p1_move: "Tackle".into(),
            p1_result: "hit".into(),
            p2_move: String::new(),
            p2_result: String::new(),
        };
        assert_eq!(opponent_line(&report), None);

        report.p2 = turn(12, 40);
        report.p2_move = "Growl".into();
        report.p2_result = "miss".into();
        assert_eq!(
            opponent_line(&report),
            Some("Player 2 played Growl and missed!".to_string())
        );
    }

    #[test]
    fn side_view_carries_markers_and_percent() {
        let mut side = turn(17, 39);
        side.buffs = vec!["attack".into(), "defense".into()];
        side.debuffs = vec!["".into()];

        let view = side_view(&side, 20);
        assert_eq!(view.hp_percent, 44);
        assert_eq!(view.current_hp, 17);
        assert!(!view.low_health);
        assert_eq!(view.buffs, vec!["attack".to_string(), "defense".to_string()]);
        assert_eq!(view.debuffs, Vec::<String>::new());
    }
}

use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::results::{self, SideView};
use crate::state::{
    AppState, BattleOutcome, BattlePhase, CardDisplay, GameSession, TurnReport,
};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.catalog_loading = true;
            DispatchResult::changed_with(Effect::FetchCatalog)
        }
        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Catalog browsing =====
        Action::CatalogDidLoad(entries) => {
            state.catalog = entries;
            state.catalog_loading = false;
            if state.catalog_index >= state.catalog.len() {
                state.catalog_index = 0;
            }
            DispatchResult::changed()
        }
        Action::CatalogDidError(error) => {
            state.catalog_loading = false;
            state.error = Some(error);
            DispatchResult::changed()
        }
        Action::CatalogSelect(index) => {
            if state.phase == BattlePhase::Browsing
                && index < state.catalog.len()
                && index != state.catalog_index
            {
                state.catalog_index = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
        Action::CatalogConfirm => {
            if state.phase != BattlePhase::Browsing || state.detail_loading {
                return DispatchResult::unchanged();
            }
            let Some(entry) = state.selected_entry() else {
                return DispatchResult::unchanged();
            };
            // Undiscovered Pokemon are visible but not selectable.
            if !state.is_discovered(&entry.name) {
                return DispatchResult::unchanged();
            }
            let id = entry.name.clone();
            state.detail_loading = true;
            DispatchResult::changed_with(Effect::FetchDetail { id })
        }
        Action::DetailDidLoad(detail) => {
            state.detail_loading = false;
            // A detail that arrives after a game started is stale.
            if state.phase != BattlePhase::Browsing {
                return DispatchResult::unchanged();
            }
            state.my_card = CardDisplay::with_detail(detail);
            state.move_index = 0;
            DispatchResult::changed()
        }
        Action::DetailDidError(error) => {
            state.detail_loading = false;
            state.error = Some(error);
            DispatchResult::changed()
        }

        // ===== Battle lifecycle =====
        Action::ChoosePokemon => {
            if !state.can_choose() {
                return DispatchResult::unchanged();
            }
            let Some(name) = state.my_card.name().map(str::to_string) else {
                return DispatchResult::unchanged();
            };
            state.phase = BattlePhase::AwaitingStart;
            DispatchResult::changed_with(Effect::StartBattle { name })
        }
        Action::BattleDidStart(start) => {
            if state.phase != BattlePhase::AwaitingStart {
                return DispatchResult::unchanged();
            }
            let baseline = state.my_card.detail.as_ref().map_or(0, |detail| detail.hp);
            state.session = Some(GameSession {
                guid: start.guid,
                pid: start.pid,
                my_baseline_hp: baseline,
            });
            state.their_card = CardDisplay::with_detail(start.p2);
            state.phase = BattlePhase::Battling;
            state.move_index = 0;
            state.p1_result_line = None;
            state.p2_result_line = None;
            DispatchResult::changed()
        }
        Action::BattleDidError(error) => {
            if state.phase == BattlePhase::AwaitingStart {
                state.phase = BattlePhase::Browsing;
            }
            state.error = Some(error);
            DispatchResult::changed()
        }
        Action::MoveSelect(index) => {
            let move_count = state
                .my_card
                .detail
                .as_ref()
                .map_or(0, |detail| detail.moves.len());
            if state.phase == BattlePhase::Battling
                && index < move_count
                && index != state.move_index
            {
                state.move_index = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
        Action::MoveConfirm => {
            // The single-flight guard: only Battling may submit, and the
            // phase flips in the same reduction that emits the request.
            if state.phase != BattlePhase::Battling {
                return DispatchResult::unchanged();
            }
            let Some(session) = state.session.as_ref() else {
                return DispatchResult::unchanged();
            };
            let Some(chosen) = state
                .my_card
                .detail
                .as_ref()
                .and_then(|detail| detail.moves.get(state.move_index))
            else {
                return DispatchResult::unchanged();
            };
            let effect = Effect::PlayMove {
                guid: session.guid.clone(),
                pid: session.pid.clone(),
                move_name: chosen.name.clone(),
            };
            state.phase = BattlePhase::AwaitingMove;
            DispatchResult::changed_with(effect)
        }
        Action::Flee => {
            if state.phase != BattlePhase::Battling {
                return DispatchResult::unchanged();
            }
            let Some(session) = state.session.as_ref() else {
                return DispatchResult::unchanged();
            };
            let effect = Effect::Flee {
                guid: session.guid.clone(),
                pid: session.pid.clone(),
            };
            state.phase = BattlePhase::AwaitingMove;
            DispatchResult::changed_with(effect)
        }
        Action::TurnDidResolve(report) => {
            if state.phase != BattlePhase::AwaitingMove {
                return DispatchResult::unchanged();
            }
            apply_turn(state, report);
            DispatchResult::changed()
        }
        Action::TurnDidError(error) => {
            // Re-enable move submission only while a battle is still live.
            if state.phase == BattlePhase::AwaitingMove {
                state.phase = BattlePhase::Battling;
            }
            state.error = Some(error);
            DispatchResult::changed()
        }
        Action::EndGame => {
            if !matches!(state.phase, BattlePhase::Ended(_)) {
                return DispatchResult::unchanged();
            }
            state.phase = BattlePhase::Browsing;
            state.session = None;
            state.my_card.reset_battle_display();
            state.their_card = CardDisplay::default();
            state.p1_result_line = None;
            state.p2_result_line = None;
            state.move_index = 0;
            DispatchResult::changed()
        }

        Action::DismissError => {
            if state.error.take().is_some() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
        Action::Quit => DispatchResult::unchanged(),
    }
}

fn apply_turn(state: &mut AppState, report: TurnReport) {
    let mine = results::side_view(&report.p1, state.low_hp_percent);
    let theirs = results::side_view(&report.p2, state.low_hp_percent);

    state.p1_result_line = Some(results::turn_line(
        "Player 1",
        &report.p1_move,
        &report.p1_result,
    ));
    state.p2_result_line = results::opponent_line(&report);

    let my_percent = mine.hp_percent;
    let their_percent = theirs.hp_percent;
    apply_side(&mut state.my_card, mine);
    apply_side(&mut state.their_card, theirs);

    if my_percent == 0 {
        state.phase = BattlePhase::Ended(BattleOutcome::Lost);
    } else if their_percent == 0 {
        state.phase = BattlePhase::Ended(BattleOutcome::Won);
        // Victory unlocks the opponent in the catalog, once.
        state.discovered.insert(report.p2.name);
    } else {
        state.phase = BattlePhase::Battling;
    }
}

fn apply_side(card: &mut CardDisplay, view: SideView) {
    card.current_hp = Some(view.current_hp);
    card.hp_percent = view.hp_percent;
    card.low_health = view.low_health;
    card.buffs = view.buffs;
    card.debuffs = view.debuffs;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::{BattleStart, CatalogEntry, MoveInfo, PlayerTurn, PokemonDetail};

    fn detail(name: &str, hp: u32) -> PokemonDetail {
        PokemonDetail {
            name: name.to_string(),
            hp,
            description: String::new(),
            photo: String::new(),
            type_icon: String::new(),
            weakness_icon: String::new(),
            moves: vec![
                MoveInfo {
                    name: "Tackle".into(),
                    element: "normal".into(),
                    dp: Some(35),
                },
                MoveInfo {
                    name: "Growl".into(),
                    element: "normal".into(),
                    dp: None,
                },
            ],
        }
    }

    fn side(name: &str, current_hp: u32, max_hp: u32) -> PlayerTurn {
        PlayerTurn {
            name: name.to_string(),
            hp: max_hp,
            current_hp,
            buffs: vec!["".into()],
            debuffs: vec!["".into()],
        }
    }

    fn report(my_hp: u32, their_hp: u32) -> TurnReport {
        TurnReport {
            p1: side("Bulbasaur", my_hp, 45),
            p2: side("Gengar", their_hp, 60),
            p1_move: "Tackle".into(),
            p1_result: "hit".into(),
            p2_move: "Lick".into(),
            p2_result: "hit".into(),
        }
    }

    /// State with a loaded player card, ready to choose.
    fn browsing_state() -> AppState {
        let mut state = AppState::default();
        state.catalog = vec![
            CatalogEntry {
                name: "Bulbasaur".into(),
                sprite_key: "bulbasaur".into(),
            },
            CatalogEntry {
                name: "Mewtwo".into(),
                sprite_key: "mewtwo".into(),
            },
        ];
        state.my_card = CardDisplay::with_detail(detail("Bulbasaur", 45));
        state
    }

    /// State mid-battle, one move away from submitting.
    fn battling_state() -> AppState {
        let mut state = browsing_state();
        let _ = reducer(&mut state, Action::ChoosePokemon);
        let _ = reducer(
            &mut state,
            Action::BattleDidStart(BattleStart {
                guid: "g-1".into(),
                pid: "p-1".into(),
                p2: detail("Gengar", 60),
            }),
        );
        state
    }

    #[test]
    fn init_requests_the_catalog() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::Init);
        assert!(state.catalog_loading);
        assert!(matches!(result.effects[0], Effect::FetchCatalog));
    }

    #[test]
    fn confirm_on_undiscovered_entry_does_nothing() {
        let mut state = browsing_state();
        state.catalog_index = 1; // Mewtwo, not discovered
        let result = reducer(&mut state, Action::CatalogConfirm);
        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn confirm_on_discovered_entry_fetches_detail() {
        let mut state = browsing_state();
        let result = reducer(&mut state, Action::CatalogConfirm);
        assert!(state.detail_loading);
        assert!(matches!(&result.effects[0], Effect::FetchDetail { id } if id == "Bulbasaur"));
    }

    #[test]
    fn choosing_starts_exactly_one_game() {
        let mut state = browsing_state();

        let result = reducer(&mut state, Action::ChoosePokemon);
        assert_eq!(state.phase, BattlePhase::AwaitingStart);
        assert!(matches!(&result.effects[0], Effect::StartBattle { name } if name == "Bulbasaur"));

        // A second request while one is pending has no observable effect.
        let again = reducer(&mut state, Action::ChoosePokemon);
        assert!(!again.changed);
        assert!(again.effects.is_empty());
    }

    #[test]
    fn choosing_requires_a_loaded_card() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::ChoosePokemon);
        assert!(!result.changed);
        assert_eq!(state.phase, BattlePhase::Browsing);
    }

    #[test]
    fn start_response_captures_baseline_and_opponent() {
        let state = battling_state();
        assert_eq!(state.phase, BattlePhase::Battling);
        let session = state.session.as_ref().expect("session");
        assert_eq!(session.guid, "g-1");
        assert_eq!(session.pid, "p-1");
        assert_eq!(session.my_baseline_hp, 45);
        assert_eq!(state.their_card.name(), Some("Gengar"));
    }

    #[test]
    fn stale_start_response_is_ignored() {
        let mut state = browsing_state();
        let result = reducer(
            &mut state,
            Action::BattleDidStart(BattleStart {
                guid: "g-stale".into(),
                pid: "p-stale".into(),
                p2: detail("Gengar", 60),
            }),
        );
        assert!(!result.changed);
        assert_eq!(state.phase, BattlePhase::Browsing);
        assert!(state.session.is_none());
    }

    #[test]
    fn failed_start_returns_to_browsing_with_an_error() {
        let mut state = browsing_state();
        let _ = reducer(&mut state, Action::ChoosePokemon);
        let _ = reducer(&mut state, Action::BattleDidError("Status: 500".into()));
        assert_eq!(state.phase, BattlePhase::Browsing);
        assert_eq!(state.error.as_deref(), Some("Status: 500"));
        assert!(state.session.is_none());
    }

    #[test]
    fn at_most_one_move_request_in_flight() {
        let mut state = battling_state();

        let first = reducer(&mut state, Action::MoveConfirm);
        assert_eq!(state.phase, BattlePhase::AwaitingMove);
        assert!(
            matches!(&first.effects[0], Effect::PlayMove { guid, pid, move_name }
                if guid == "g-1" && pid == "p-1" && move_name == "Tackle")
        );

        let second = reducer(&mut state, Action::MoveConfirm);
        assert!(!second.changed);
        assert!(second.effects.is_empty());

        let fled = reducer(&mut state, Action::Flee);
        assert!(fled.effects.is_empty());
    }

    #[test]
    fn move_selection_is_locked_while_awaiting() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let result = reducer(&mut state, Action::MoveSelect(1));
        assert!(!result.changed);
        assert_eq!(state.move_index, 0);
    }

    #[test]
    fn turn_with_both_alive_returns_to_battling() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let _ = reducer(&mut state, Action::TurnDidResolve(report(17, 30)));

        assert_eq!(state.phase, BattlePhase::Battling);
        assert_eq!(state.my_card.hp_percent, 38); // 17/45
        assert_eq!(state.my_card.current_hp, Some(17));
        assert_eq!(state.their_card.hp_percent, 50); // 30/60
        assert_eq!(
            state.p1_result_line.as_deref(),
            Some("Player 1 played Tackle and hit!")
        );
        assert_eq!(
            state.p2_result_line.as_deref(),
            Some("Player 2 played Lick and hit!")
        );
    }

    #[test]
    fn own_hp_at_zero_is_a_loss() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let _ = reducer(&mut state, Action::TurnDidResolve(report(0, 30)));
        assert_eq!(state.phase, BattlePhase::Ended(BattleOutcome::Lost));
        assert_eq!(state.title(), "You lost!");

        // Moves stay locked until the end-game acknowledgment.
        let result = reducer(&mut state, Action::MoveConfirm);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn win_discovers_the_opponent_once() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let mut victory = report(17, 0);
        victory.p2_move = String::new();
        let _ = reducer(&mut state, Action::TurnDidResolve(victory));

        assert_eq!(state.phase, BattlePhase::Ended(BattleOutcome::Won));
        assert!(state.is_discovered("Gengar"));
        assert_eq!(state.p2_result_line, None);

        // Winning against the same opponent again keeps membership intact.
        let before = state.discovered.len();
        let _ = reducer(&mut state, Action::EndGame);
        let mut state = battling_state_with_discovered(state.discovered.clone());
        let _ = reducer(&mut state, Action::MoveConfirm);
        let mut victory = report(17, 0);
        victory.p2_move = String::new();
        let _ = reducer(&mut state, Action::TurnDidResolve(victory));
        assert_eq!(state.discovered.len(), before);
    }

    fn battling_state_with_discovered(
        discovered: std::collections::HashSet<String>,
    ) -> AppState {
        let mut state = battling_state();
        state.discovered = discovered;
        state
    }

    #[test]
    fn turn_error_reenables_moves_without_corrupting_the_session() {
        let mut state = battling_state();
        let session = state.session.clone();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let _ = reducer(&mut state, Action::TurnDidError("Status: 503".into()));

        assert_eq!(state.phase, BattlePhase::Battling);
        assert_eq!(state.session, session);
        assert_eq!(state.error.as_deref(), Some("Status: 503"));

        // Submitting again works.
        let retry = reducer(&mut state, Action::MoveConfirm);
        assert_eq!(retry.effects.len(), 1);
    }

    #[test]
    fn turn_error_after_the_game_ended_keeps_moves_locked() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let _ = reducer(&mut state, Action::TurnDidResolve(report(0, 30)));
        let _ = reducer(&mut state, Action::TurnDidError("late".into()));
        assert_eq!(state.phase, BattlePhase::Ended(BattleOutcome::Lost));
    }

    #[test]
    fn end_game_resets_battle_display_and_session() {
        let mut state = battling_state();
        let _ = reducer(&mut state, Action::MoveConfirm);
        let mut turn = report(17, 30);
        turn.p1.debuffs = vec!["burn".into()];
        let _ = reducer(&mut state, Action::TurnDidResolve(turn));
        let _ = reducer(&mut state, Action::MoveConfirm);
        let _ = reducer(&mut state, Action::TurnDidResolve(report(0, 30)));

        let result = reducer(&mut state, Action::EndGame);
        assert!(result.changed);
        assert_eq!(state.phase, BattlePhase::Browsing);
        assert_eq!(state.title(), "Pokedex");
        assert!(state.session.is_none());
        assert_eq!(state.my_card.hp_percent, 100);
        assert!(state.my_card.buffs.is_empty() && state.my_card.debuffs.is_empty());
        assert_eq!(state.my_card.current_hp, None);
        assert_eq!(state.their_card, CardDisplay::default());
        assert_eq!(state.p1_result_line, None);

        // The card itself survives so the same Pokemon can be re-chosen.
        assert_eq!(state.my_card.name(), Some("Bulbasaur"));
    }

    #[test]
    fn end_game_outside_ended_does_nothing() {
        let mut state = battling_state();
        let result = reducer(&mut state, Action::EndGame);
        assert!(!result.changed);
        assert_eq!(state.phase, BattlePhase::Battling);
    }

    #[test]
    fn detail_arriving_mid_battle_is_dropped() {
        let mut state = battling_state();
        let result = reducer(&mut state, Action::DetailDidLoad(detail("Pidgey", 40)));
        assert!(!result.changed);
        assert_eq!(state.my_card.name(), Some("Bulbasaur"));
    }

    #[test]
    fn dismissing_an_absent_error_is_a_noop() {
        let mut state = AppState::default();
        assert!(!reducer(&mut state, Action::DismissError).changed);
        state.error = Some("boom".into());
        assert!(reducer(&mut state, Action::DismissError).changed);
        assert_eq!(state.error, None);
    }
}

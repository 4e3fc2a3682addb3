use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

pub const DEFAULT_POKEDEX_URL: &str =
    "https://courses.cs.washington.edu/courses/cse154/webservices/pokedex/pokedex.php";
pub const DEFAULT_GAME_URL: &str =
    "https://courses.cs.washington.edu/courses/cse154/webservices/pokedex/game.php";

/// HP percentage at or below which a health bar counts as low.
pub const DEFAULT_LOW_HP_PERCENT: u8 = 20;

/// Pokemon the player owns before winning anything.
pub const STARTERS: [&str; 3] = ["Bulbasaur", "Charmander", "Squirtle"];

/// One entry of the Pokedex catalog listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogEntry {
    pub name: String,
    pub sprite_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MoveInfo {
    pub name: String,
    pub element: String,
    /// Damage points. Absent for status moves.
    pub dp: Option<u32>,
}

/// Full record for one Pokemon, as served by the Pokedex endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetail {
    pub name: String,
    pub hp: u32,
    pub description: String,
    pub photo: String,
    pub type_icon: String,
    pub weakness_icon: String,
    pub moves: Vec<MoveInfo>,
}

/// One side's slice of a turn response from the game service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerTurn {
    pub name: String,
    pub hp: u32,
    pub current_hp: u32,
    pub buffs: Vec<String>,
    pub debuffs: Vec<String>,
}

/// Adjudicated result of one simultaneous turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TurnReport {
    pub p1: PlayerTurn,
    pub p2: PlayerTurn,
    pub p1_move: String,
    pub p1_result: String,
    pub p2_move: String,
    pub p2_result: String,
}

/// Payload of a successful game-start response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BattleStart {
    pub guid: String,
    pub pid: String,
    pub p2: PokemonDetail,
}

/// The one active game. Created on a start response, dropped when the
/// player acknowledges the end of the battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GameSession {
    pub guid: String,
    pub pid: String,
    /// Full HP of the player's Pokemon, captured when the game started.
    pub my_baseline_hp: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BattleOutcome {
    Won,
    Lost,
}

/// Where the client is in the battle lifecycle. Exactly one request may be
/// outstanding, and only in the two Awaiting phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BattlePhase {
    Browsing,
    AwaitingStart,
    Battling,
    AwaitingMove,
    Ended(BattleOutcome),
}

impl BattlePhase {
    pub fn in_battle(self) -> bool {
        matches!(self, BattlePhase::Battling | BattlePhase::AwaitingMove)
    }

    pub fn request_pending(self) -> bool {
        matches!(self, BattlePhase::AwaitingStart | BattlePhase::AwaitingMove)
    }
}

/// Display state for one Pokemon card (the player's or the opponent's).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CardDisplay {
    pub detail: Option<PokemonDetail>,
    /// Last HP reported by the game service. None before the first turn.
    pub current_hp: Option<u32>,
    pub hp_percent: u8,
    pub low_health: bool,
    pub buffs: Vec<String>,
    pub debuffs: Vec<String>,
}

impl Default for CardDisplay {
    fn default() -> Self {
        Self {
            detail: None,
            current_hp: None,
            hp_percent: 100,
            low_health: false,
            buffs: Vec::new(),
            debuffs: Vec::new(),
        }
    }
}

impl CardDisplay {
    pub fn with_detail(detail: PokemonDetail) -> Self {
        Self {
            detail: Some(detail),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .map(|detail| detail.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// HP to show: the last reported value, or the full HP before any turn.
    pub fn shown_hp(&self) -> Option<u32> {
        self.current_hp
            .or_else(|| self.detail.as_ref().map(|detail| detail.hp))
    }

    /// Back to the pre-battle look: full bar, no markers, no turn damage.
    pub fn reset_battle_display(&mut self) {
        self.current_hp = None;
        self.hp_percent = 100;
        self.low_health = false;
        self.buffs.clear();
        self.debuffs.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub phase: BattlePhase,

    pub catalog: Vec<CatalogEntry>,
    pub catalog_loading: bool,
    pub catalog_index: usize,
    /// Pokemon the player has proven ownership of; only these are
    /// selectable in the catalog.
    pub discovered: HashSet<String>,

    pub my_card: CardDisplay,
    pub their_card: CardDisplay,
    pub detail_loading: bool,

    pub session: Option<GameSession>,
    pub move_index: usize,
    pub p1_result_line: Option<String>,
    pub p2_result_line: Option<String>,

    pub low_hp_percent: u8,
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_HP_PERCENT)
    }
}

impl AppState {
    pub fn new(low_hp_percent: u8) -> Self {
        Self {
            terminal_size: (80, 24),
            phase: BattlePhase::Browsing,
            catalog: Vec::new(),
            catalog_loading: false,
            catalog_index: 0,
            discovered: STARTERS.iter().map(|name| name.to_string()).collect(),
            my_card: CardDisplay::default(),
            their_card: CardDisplay::default(),
            detail_loading: false,
            session: None,
            move_index: 0,
            p1_result_line: None,
            p2_result_line: None,
            low_hp_percent,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.phase {
            BattlePhase::Browsing | BattlePhase::AwaitingStart => "Pokedex",
            BattlePhase::Battling | BattlePhase::AwaitingMove => "Pokemon Battle Mode!",
            BattlePhase::Ended(BattleOutcome::Won) => "You won!",
            BattlePhase::Ended(BattleOutcome::Lost) => "You lost!",
        }
    }

    pub fn is_discovered(&self, name: &str) -> bool {
        self.discovered.contains(name)
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.catalog.get(self.catalog_index)
    }

    /// A game can start once the player card holds a named Pokemon.
    pub fn can_choose(&self) -> bool {
        self.phase == BattlePhase::Browsing && self.my_card.name().is_some()
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut sections = vec![
            DebugSection::new("Phase")
                .entry("phase", ron_string(&self.phase))
                .entry("error", ron_string(&self.error)),
            DebugSection::new("Catalog")
                .entry("entries", ron_string(&self.catalog.len()))
                .entry("index", ron_string(&self.catalog_index))
                .entry("discovered", ron_string(&self.discovered.len())),
        ];

        if let Some(session) = &self.session {
            sections.push(
                DebugSection::new("Session")
                    .entry("guid", ron_string(&session.guid))
                    .entry("pid", ron_string(&session.pid))
                    .entry("baseline_hp", ron_string(&session.my_baseline_hp)),
            );
        }

        sections
    }
}

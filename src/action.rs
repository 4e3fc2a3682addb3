use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{BattleStart, CatalogEntry, PokemonDetail, TurnReport};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,
    UiTerminalResize(u16, u16),

    // Catalog browsing
    CatalogDidLoad(Vec<CatalogEntry>),
    CatalogDidError(String),
    CatalogSelect(usize),
    /// View the selected entry: fetch its detail into the player card.
    CatalogConfirm,
    DetailDidLoad(PokemonDetail),
    DetailDidError(String),

    // Battle lifecycle
    /// "Choose this Pokemon!" - ask the game service for a new game.
    ChoosePokemon,
    BattleDidStart(BattleStart),
    BattleDidError(String),
    MoveSelect(usize),
    /// Submit the selected move for this turn.
    MoveConfirm,
    Flee,
    TurnDidResolve(TurnReport),
    TurnDidError(String),
    /// Acknowledge a finished game and return to the Pokedex.
    EndGame,

    DismissError,
    Quit,
}

//! Side effects declared by the reducer, executed by the effect handler.

#[derive(Clone, Debug)]
pub enum Effect {
    FetchCatalog,
    FetchDetail { id: String },
    StartBattle { name: String },
    PlayMove { guid: String, pid: String, move_name: String },
    Flee { guid: String, pid: String },
}

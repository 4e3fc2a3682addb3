//! HTTP client for the Pokedex and game endpoints.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::state::{BattleStart, CatalogEntry, MoveInfo, PlayerTurn, PokemonDetail, TurnReport};

/// Everything that can go wrong with a request. All three variants surface
/// to the player as one diagnostic message; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("There was a problem.\nNo response from the server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("There was a problem.\nStatus: {status}\nResponse: {body}")]
    Status { status: u16, body: String },
    #[error("There was a problem.\nMalformed response: {detail}\nResponse: {body}")]
    Malformed { detail: String, body: String },
}

#[derive(Clone, Debug)]
pub struct PokedexClient {
    http: reqwest::Client,
    pokedex_url: String,
    game_url: String,
}

impl PokedexClient {
    pub fn new(pokedex_url: impl Into<String>, game_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            pokedex_url: pokedex_url.into(),
            game_url: game_url.into(),
        }
    }

    /// Fetch the full catalog listing: a flat text body of
    /// `Name:spritekey` pairs, one per line.
    pub async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        let url = format!("{}?pokedex=all", self.pokedex_url);
        let body = self.get_text(&url).await?;
        Ok(parse_catalog(&body))
    }

    pub async fn fetch_pokemon(&self, id: &str) -> Result<PokemonDetail, ApiError> {
        let url = format!("{}?pokemon={}", self.pokedex_url, urlencoding::encode(id));
        let body = self.get_text(&url).await?;
        decode_detail(&body)
    }

    pub async fn start_game(&self, name: &str) -> Result<BattleStart, ApiError> {
        let form = [
            ("startgame", "true".to_string()),
            ("mypokemon", name.to_lowercase()),
        ];
        let body = self.post_form(&form).await?;
        decode_start(&body)
    }

    pub async fn play_move(
        &self,
        guid: &str,
        pid: &str,
        move_name: &str,
    ) -> Result<TurnReport, ApiError> {
        let form = [
            ("guid", guid.to_string()),
            ("pid", pid.to_string()),
            ("movename", move_token(move_name)),
        ];
        let body = self.post_form(&form).await?;
        decode_turn(&body)
    }

    /// Flee forfeits the game; the service answers with an ordinary turn
    /// response in which the fleeing side has lost.
    pub async fn flee(&self, guid: &str, pid: &str) -> Result<TurnReport, ApiError> {
        let form = [
            ("move", "flee".to_string()),
            ("guid", guid.to_string()),
            ("pid", pid.to_string()),
        ];
        let body = self.post_form(&form).await?;
        decode_turn(&body)
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let response = self.http.get(url).send().await?;
        read_body(response).await
    }

    async fn post_form(&self, form: &[(&str, String)]) -> Result<String, ApiError> {
        let response = self.http.post(&self.game_url).form(form).send().await?;
        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Move names go over the wire lowercased with spaces stripped.
pub fn move_token(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Parse the catalog body. Fields alternate name and sprite key, separated
/// by colons and newlines; a dangling half-pair is dropped.
pub fn parse_catalog(body: &str) -> Vec<CatalogEntry> {
    let fields: Vec<&str> = body
        .split(['\n', ':'])
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();
    fields
        .chunks_exact(2)
        .map(|pair| CatalogEntry {
            name: pair[0].to_string(),
            sprite_key: pair[1].to_string(),
        })
        .collect()
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct DetailResponse {
    name: String,
    hp: u32,
    info: InfoSection,
    images: ImageSection,
    moves: Vec<MoveEntry>,
}

#[derive(Debug, Deserialize)]
struct InfoSection {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ImageSection {
    photo: String,
    #[serde(rename = "typeIcon")]
    type_icon: String,
    #[serde(rename = "weaknessIcon")]
    weakness_icon: String,
}

#[derive(Debug, Deserialize)]
struct MoveEntry {
    name: String,
    #[serde(rename = "type")]
    element: String,
    dp: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    guid: String,
    pid: String,
    p2: DetailResponse,
}

#[derive(Debug, Deserialize)]
struct TurnResponse {
    p1: SideSection,
    p2: SideSection,
    results: ResultsSection,
}

#[derive(Debug, Deserialize)]
struct SideSection {
    name: String,
    hp: u32,
    #[serde(rename = "current-hp")]
    current_hp: u32,
    #[serde(default)]
    buffs: Vec<String>,
    #[serde(default)]
    debuffs: Vec<String>,
}

/// The per-side move fields can be absent or null once a side is defeated.
#[derive(Debug, Deserialize)]
struct ResultsSection {
    #[serde(rename = "p1-move")]
    p1_move: Option<String>,
    #[serde(rename = "p1-result")]
    p1_result: Option<String>,
    #[serde(rename = "p2-move", default)]
    p2_move: Option<String>,
    #[serde(rename = "p2-result", default)]
    p2_result: Option<String>,
}

impl From<DetailResponse> for PokemonDetail {
    fn from(detail: DetailResponse) -> Self {
        Self {
            name: detail.name,
            hp: detail.hp,
            description: detail.info.description,
            photo: detail.images.photo,
            type_icon: detail.images.type_icon,
            weakness_icon: detail.images.weakness_icon,
            moves: detail
                .moves
                .into_iter()
                .map(|entry| MoveInfo {
                    name: entry.name,
                    element: entry.element,
                    dp: entry.dp,
                })
                .collect(),
        }
    }
}

impl From<SideSection> for PlayerTurn {
    fn from(side: SideSection) -> Self {
        Self {
            name: side.name,
            hp: side.hp,
            current_hp: side.current_hp,
            buffs: side.buffs,
            debuffs: side.debuffs,
        }
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Malformed {
        detail: err.to_string(),
        body: body.to_string(),
    })
}

pub fn decode_detail(body: &str) -> Result<PokemonDetail, ApiError> {
    decode_json::<DetailResponse>(body).map(PokemonDetail::from)
}

pub fn decode_start(body: &str) -> Result<BattleStart, ApiError> {
    let start: StartResponse = decode_json(body)?;
    Ok(BattleStart {
        guid: start.guid,
        pid: start.pid,
        p2: start.p2.into(),
    })
}

pub fn decode_turn(body: &str) -> Result<TurnReport, ApiError> {
    let turn: TurnResponse = decode_json(body)?;
    Ok(TurnReport {
        p1: turn.p1.into(),
        p2: turn.p2.into(),
        p1_move: turn.results.p1_move.unwrap_or_default(),
        p1_result: turn.results.p1_result.unwrap_or_default(),
        p2_move: turn.results.p2_move.unwrap_or_default(),
        p2_result: turn.results.p2_result.unwrap_or_default(),
    })
}

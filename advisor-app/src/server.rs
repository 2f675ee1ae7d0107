use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_API_URL: &str = "https://chess.unabotter.xyz";

const TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a game on the match server into the FEN of its current position
pub trait GameSource {
    fn fetch_fen(&self, game_id: u64) -> Result<String>;
}

/// The parts of the match server an agent needs to play its games
pub trait Lobby: GameSource {
    fn active_games(&self) -> Result<Vec<ActiveGame>>;
    fn submit_move(&self, game_id: u64, san: &str) -> Result<MoveOutcome>;
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActiveGame {
    pub game_id: u64,
    #[serde(default)]
    pub your_turn: bool,
}

#[derive(Deserialize, Debug, Clone)]
struct ActiveGames {
    #[serde(default)]
    games: Vec<ActiveGame>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GameState {
    pub fen: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub api_key: String,
    #[serde(default)]
    pub claim_url: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
struct RegisterResponse {
    #[serde(default)]
    success: bool,
    agent: Option<Registration>,
}

#[derive(Deserialize, Debug, Clone)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

/// HTTP client for the match server. Every request sends the API key, if
/// there is one, in the `X-API-Key` header.
pub struct MatchServer {
    agent: ureq::Agent,
    api_url: String,
    api_key: Option<String>,
}

impl MatchServer {
    pub fn new(api_url: &str, api_key: Option<String>) -> MatchServer {
        MatchServer {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn api_url(&self) -> &str { &self.api_url }

    fn url(&self, path: &str) -> String { format!("{}{}", self.api_url, path) }

    fn get(&self, path: &str) -> ureq::Request {
        self.with_key(self.agent.get(&self.url(path)))
    }

    fn post(&self, path: &str) -> ureq::Request {
        self.with_key(self.agent.post(&self.url(path)))
    }

    fn with_key(&self, request: ureq::Request) -> ureq::Request {
        match &self.api_key {
            Some(key) => request.set("X-API-Key", key),
            None => request,
        }
    }

    pub fn game(&self, game_id: u64) -> Result<GameState> {
        let response = check(self.get(&format!("/api/games/{}", game_id)).call())
            .with_context(|| format!("failed to fetch game {}", game_id))?;
        Ok(response.into_json()?)
    }

    pub fn register(&self, name: &str) -> Result<Registration> {
        let response = check(self.post("/api/register").send_json(json!({ "name": name })))
            .with_context(|| format!("failed to register \"{}\"", name))?;
        let body: RegisterResponse = response.into_json()?;
        match body.agent {
            Some(agent) if body.success => Ok(agent),
            _ => bail!("registration of \"{}\" was refused", name),
        }
    }
}

impl GameSource for MatchServer {
    fn fetch_fen(&self, game_id: u64) -> Result<String> {
        Ok(self.game(game_id)?.fen)
    }
}

impl Lobby for MatchServer {
    fn active_games(&self) -> Result<Vec<ActiveGame>> {
        let response =
            check(self.get("/api/games/active").call()).context("failed to list active games")?;
        let body: ActiveGames = response.into_json()?;
        Ok(body.games)
    }

    fn submit_move(&self, game_id: u64, san: &str) -> Result<MoveOutcome> {
        let path = format!("/api/games/{}/move", game_id);
        let response = check(self.post(&path).send_json(json!({ "move": san })))
            .with_context(|| format!("failed to play {} in game {}", san, game_id))?;
        Ok(response.into_json()?)
    }
}

/// Turns error statuses into errors carrying the server's `detail` message
fn check(result: std::result::Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, response)) => {
            let detail = response
                .into_json::<ErrorBody>()
                .ok()
                .map(|body| match body.detail {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            if detail.is_empty() {
                bail!("server responded with status {}", code)
            } else {
                bail!("server responded with status {}: {}", code, detail)
            }
        }
        Err(e) => Err(e.into()),
    }
}

mod engine;
mod error;
mod logger;
mod notation;
mod position;

/// Evaluations are in centipawns
pub type Score = i32;

/// The evaluation reported for a move that delivers checkmate. Heuristic
/// scores in any reachable game stay well below this.
pub const MATE_SCORE: Score = 10_000;

/// Added to a move's evaluation when it leaves the opponent in check
pub const CHECK_BONUS: Score = 50;

pub use engine::{
    material_eval::{MaterialEval, Weights},
    ranker::MoveRanker,
    ranking::{Ranking, ScoredMove},
    StaticEvaluator,
};
pub use error::Error;
pub use logger::Logger;
pub use notation::san;
pub use position::{DrawReason, Position, Status};

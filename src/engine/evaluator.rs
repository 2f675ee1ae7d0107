use crate::{Position, Score};

pub trait StaticEvaluator: Send + Sync {

    /// Evaluates a given game state represented by `position`, without
    /// looking at any moves.
    ///
    /// Returns a score in centipawns from the point of view of the side to
    /// move: positive means the side to move is better off.
    ///
    /// Must be deterministic, since the ranker calls it once per legal move
    /// and expects equal positions to score equally.
    fn evaluate(&self, position: &Position) -> Score;

}

use serde::Serialize;

use crate::Score;

/// A candidate move with its one-ply evaluation from the mover's point of view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    /// Standard algebraic notation, e.g. `Nf3` or `Ra8#`
    #[serde(rename = "move")]
    pub san: String,
    /// Coordinate notation, e.g. `g1f3`
    pub uci: String,
    pub eval: Score,
    pub is_checkmate: bool,
    pub is_check: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ranking {
    /// A move that mates at once. Moves after it weren't looked at, and the
    /// requested count doesn't apply.
    ForcedMate(ScoredMove),
    /// Moves sorted best first. Empty if the game is over or no moves were
    /// asked for.
    Ranked(Vec<ScoredMove>),
}

impl Ranking {
    pub fn moves(&self) -> &[ScoredMove] {
        match self {
            Ranking::ForcedMate(mv) => std::slice::from_ref(mv),
            Ranking::Ranked(moves) => moves,
        }
    }

    pub fn into_moves(self) -> Vec<ScoredMove> {
        match self {
            Ranking::ForcedMate(mv) => vec![mv],
            Ranking::Ranked(moves) => moves,
        }
    }

    pub fn best(&self) -> Option<&ScoredMove> { self.moves().first() }

    pub fn is_forced_mate(&self) -> bool { matches!(self, Ranking::ForcedMate(_)) }

    pub fn len(&self) -> usize { self.moves().len() }

    pub fn is_empty(&self) -> bool { self.moves().is_empty() }
}

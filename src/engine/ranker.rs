
use super::{
    material_eval::MaterialEval,
    ranking::{Ranking, ScoredMove},
    StaticEvaluator,
};
use crate::{logger::Logger, Position, CHECK_BONUS, MATE_SCORE};

/// Scores every legal move by looking exactly one ply ahead
pub struct MoveRanker {
    static_evaluator: Box<dyn StaticEvaluator>,
    logger: Logger,
}

impl MoveRanker {
    pub fn new(static_evaluator: impl StaticEvaluator + 'static, logger: Logger) -> Self {
        MoveRanker {
            static_evaluator: Box::new(static_evaluator),
            logger,
        }
    }

    /// Ranks the legal moves in `position`, best first, keeping at most
    /// `top_n` of them.
    ///
    /// - If the game is already over, the ranking is empty.
    /// - If some move mates, that move is returned on its own as soon as it
    ///   is found, whatever `top_n` is.
    /// - Moves with equal evaluations keep the move generator's order.
    pub fn rank(&self, position: &Position, top_n: usize) -> Ranking {
        let status = position.status();
        if !status.is_in_progress() {
            self.logger.log_lazy(3, || format!("Game is over ({}), nothing to rank", status.result()));
            return Ranking::Ranked(Vec::new());
        }

        let mut scored = Vec::new();

        for mv in position.legal_moves() {
            let next = position.apply(mv);

            if next.is_checkmate() {
                let mate = ScoredMove {
                    san: position.san(mv),
                    uci: mv.to_string(),
                    eval: MATE_SCORE,
                    is_checkmate: true,
                    is_check: true,
                };
                self.logger.log_lazy(3, || format!("Found mate with {}", mate.san));
                return Ranking::ForcedMate(mate);
            }

            let is_check = next.is_check();
            // The evaluation is from the opponent's side, so it is flipped
            let mut eval = -self.static_evaluator.evaluate(&next);
            if is_check {
                eval += CHECK_BONUS;
            }

            let scored_move = ScoredMove {
                san: position.san(mv),
                uci: mv.to_string(),
                eval,
                is_checkmate: false,
                is_check,
            };
            self.logger.log_lazy(6, || format!("{} ({}): {}", scored_move.san, scored_move.uci, eval));
            scored.push(scored_move);
        }

        let legal_moves = scored.len();

        // Stable, so ties stay in generator order
        scored.sort_by(|a, b| b.eval.cmp(&a.eval));
        scored.truncate(top_n);

        self.logger.log_lazy(3, || match scored.first() {
            Some(best) => format!(
                "Ranked {} legal moves, best {} with eval {}",
                legal_moves, best.san, best.eval
            ),
            None => format!("Ranked {} legal moves, none requested", legal_moves),
        });

        Ranking::Ranked(scored)
    }
}

impl Default for MoveRanker {
    fn default() -> Self { MoveRanker::new(MaterialEval::default(), Logger::silent()) }
}

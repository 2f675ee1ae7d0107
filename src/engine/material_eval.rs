use chess::{Color::{self, *}, Piece::*, ALL_PIECES};

use crate::{Position, Score, StaticEvaluator};

/// Weights for each term of the evaluation. The defaults are the fixed
/// heuristic the advisor has always used and shouldn't be tuned in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Weights {
    /// Value of each piece type, indexed by `Piece::to_index`
    pub pieces: [Score; 6],
    /// Bonus for a white pawn on each square, a1 first. Black pawns use the
    /// same table with the square index mirrored (`63 - index`).
    pub pawn_table: [Score; 64],
    /// Bonus for keeping each castling right, as `[kingside, queenside]`
    pub castling: [Score; 2],
}

#[rustfmt::skip]
const PAWN_TABLE: [Score; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

impl Default for Weights {
    fn default() -> Self {
        Weights {
            pieces: [100, 320, 330, 500, 900, 0],
            pawn_table: PAWN_TABLE,
            castling: [30, 20],
        }
    }
}

/// Material, pawn placement and castling rights. No search and no mobility.
#[derive(Clone, Debug, Default)]
pub struct MaterialEval {
    weights: Weights,
}

impl MaterialEval {
    pub fn new(weights: Weights) -> MaterialEval {
        MaterialEval { weights }
    }

    pub fn weights(&self) -> &Weights { &self.weights }

    /// The evaluation with positive values favouring white, regardless of
    /// whose turn it is
    pub fn white_score(&self, position: &Position) -> Score {
        self.side_score(position, White) - self.side_score(position, Black)
    }

    fn side_score(&self, position: &Position, color: Color) -> Score {
        let board = position.board();
        let mine = *board.color_combined(color);
        let mut score = 0;

        for piece in ALL_PIECES {
            let count = (*board.pieces(piece) & mine).popcnt() as Score;
            score += self.weights.pieces[piece.to_index()] * count;
        }

        for sq in *board.pieces(Pawn) & mine {
            let index = match color {
                White => sq.to_index(),
                Black => 63 - sq.to_index(),
            };
            score += self.weights.pawn_table[index];
        }

        let rights = position.castle_rights(color);
        if rights.has_kingside() {
            score += self.weights.castling[0];
        }
        if rights.has_queenside() {
            score += self.weights.castling[1];
        }

        score
    }
}

impl StaticEvaluator for MaterialEval {
    fn evaluate(&self, position: &Position) -> Score {
        let score = self.white_score(position);
        match position.side_to_move() {
            White => score,
            Black => -score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(fen: &str) -> Score {
        MaterialEval::default().evaluate(&fen.parse().unwrap())
    }

    /// Flips the board vertically and swaps the colours of every piece and
    /// castling right. The side to move is swapped only if `swap_turn`.
    fn mirror_fen(fen: &str, swap_turn: bool) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let swap_case = |s: &str| -> String {
            s.chars()
                .map(|c| {
                    if c.is_ascii_uppercase() { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() }
                })
                .collect()
        };

        let placement = fields[0].split('/').rev().map(swap_case).collect::<Vec<_>>().join("/");
        let turn = match (fields[1], swap_turn) {
            ("w", true) => "b",
            ("b", true) => "w",
            (t, _) => t,
        };
        let castling = if fields[2] == "-" {
            "-".to_string()
        } else {
            let swapped = swap_case(fields[2]);
            "KQkq".chars().filter(|c| swapped.contains(*c)).collect()
        };
        let en_passant = match fields[3] {
            "-" => "-".to_string(),
            sq => {
                let (file, rank) = sq.split_at(1);
                format!("{}{}", file, if rank == "3" { "6" } else { "3" })
            }
        };
        format!("{} {} {} {} {} {}", placement, turn, castling, en_passant, fields[4], fields[5])
    }

    #[test]
    fn default_weights_match_the_fixed_heuristic() {
        let weights = Weights::default();
        assert_eq!(weights.pieces[Pawn.to_index()], 100);
        assert_eq!(weights.pieces[Knight.to_index()], 320);
        assert_eq!(weights.pieces[Bishop.to_index()], 330);
        assert_eq!(weights.pieces[Rook.to_index()], 500);
        assert_eq!(weights.pieces[Queen.to_index()], 900);
        assert_eq!(weights.pieces[King.to_index()], 0);
        assert_eq!(weights.castling, [30, 20]);
        assert_eq!(weights.pawn_table.iter().sum::<Score>(), 660);
    }

    #[test]
    fn starting_position_is_level() {
        let eval = MaterialEval::default();
        assert_eq!(eval.white_score(&Position::starting()), 0);
        assert_eq!(eval.evaluate(&Position::starting()), 0);
    }

    #[test]
    fn score_is_from_the_side_to_move() {
        assert_eq!(eval("4k3/8/8/8/8/8/8/3QK3 w - - 0 1"), 900);
        assert_eq!(eval("4k3/8/8/8/8/8/8/3QK3 b - - 0 1"), -900);
        assert_eq!(eval("3qk3/8/8/8/8/8/8/4K3 w - - 0 1"), -900);
    }

    #[test]
    fn material_values_add_up() {
        // White: R + B + N, black: Q
        assert_eq!(eval("3qk3/8/8/8/8/8/8/1NB1K2R w - - 0 1"), 500 + 330 + 320 - 900);
    }

    #[test]
    fn pawns_read_the_table_by_square() {
        // a2 is worth 50 extra, a7 only 5
        assert_eq!(eval("4k3/8/8/8/8/8/P7/4K3 w - - 0 1"), 150);
        assert_eq!(eval("4k3/P7/8/8/8/8/8/4K3 w - - 0 1"), 105);
        // e4 reads index 28
        assert_eq!(eval("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1"), 125);
    }

    #[test]
    fn black_pawns_read_the_mirrored_table() {
        // h7 is index 55, mirrored to 8: worth 50 extra
        assert_eq!(eval("4k3/7p/8/8/8/8/8/4K3 b - - 0 1"), 150);
        // e5 is index 36, mirrored to 27
        assert_eq!(eval("4k3/8/8/4p3/8/8/8/4K3 b - - 0 1"), 125);
        // Facing pawns on e4 and e5 cancel out
        assert_eq!(eval("4k3/8/8/4p3/4P3/8/8/4K3 w - - 0 1"), 0);
    }

    #[test]
    fn castling_rights_are_rewarded() {
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"), 0);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w K - 0 1"), 30);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w Q - 0 1"), 20);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1"), 10);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R w k - 0 1"), -30);
        assert_eq!(eval("r3k2r/8/8/8/8/8/8/R3K2R b Qk - 0 1"), 10);
    }

    #[test]
    fn custom_weights_are_used() {
        let weights = Weights { pieces: [1, 3, 3, 5, 9, 0], pawn_table: [0; 64], castling: [0, 0] };
        let eval = MaterialEval::new(weights);
        assert_eq!(eval.weights(), &weights);
        assert_eq!(eval.evaluate(&Position::starting()), 0);
        let p: Position = "3qk3/8/8/8/8/8/PP6/4K2R w K - 0 1".parse().unwrap();
        assert_eq!(eval.evaluate(&p), 1 + 1 + 5 - 9);
    }

    const MIRROR_FENS: [&str; 4] = [
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        "r3k2r/pp3ppp/8/3p4/8/2P5/P4PPP/R3K2R w Kq - 0 1",
        "2r3k1/1p3ppp/p7/8/3N4/1P6/P4PPP/4R1K1 w - - 0 25",
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
    ];

    #[test]
    fn swapping_colours_negates_the_score() {
        for fen in MIRROR_FENS {
            let mirrored = mirror_fen(fen, false);
            assert_eq!(eval(&mirrored), -eval(fen), "{} vs {}", fen, mirrored);
        }
    }

    #[test]
    fn full_mirror_scores_the_same_for_the_new_side_to_move() {
        for fen in MIRROR_FENS {
            let mirrored = mirror_fen(fen, true);
            assert_eq!(eval(&mirrored), eval(fen), "{} vs {}", fen, mirrored);
        }
    }
}

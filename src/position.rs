use std::{fmt, str::FromStr};

use chess::{
    BitBoard, Board, BoardStatus, CastleRights, ChessMove, Color, File, MoveGen, Piece, Rank,
    Square, EMPTY,
};

use crate::{
    error::{Error, Result},
    notation,
};

/// a1, c1, e1, ... are the dark squares
const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);

/// Halfmove clock value at which the game is drawn without a claim
const SEVENTY_FIVE_MOVES: u32 = 150;

/// A snapshot of a game. Wraps `chess::Board`, which doesn't keep the move
/// clocks, so those are carried alongside it.
///
/// Positions are never mutated: `apply` returns a new one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Status {
    InProgress,
    Win(Color),
    Draw(DrawReason),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
}

impl Status {
    pub fn is_in_progress(&self) -> bool { matches!(self, Status::InProgress) }

    /// The result in PGN form
    pub fn result(&self) -> &'static str {
        match self {
            Status::InProgress => "*",
            Status::Win(Color::White) => "1-0",
            Status::Win(Color::Black) => "0-1",
            Status::Draw(_) => "1/2-1/2",
        }
    }
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            DrawReason::Stalemate => "stalemate",
            DrawReason::InsufficientMaterial => "insufficient material",
            DrawReason::SeventyFiveMoveRule => "seventy-five-move rule",
        })
    }
}

impl Position {

    pub fn starting() -> Position {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn board(&self) -> &Board { &self.board }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    pub fn halfmove_clock(&self) -> u32 { self.halfmove_clock }

    pub fn fullmove_number(&self) -> u32 { self.fullmove_number }

    pub fn castle_rights(&self, color: Color) -> CastleRights {
        self.board.castle_rights(color)
    }

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        Some((self.board.piece_on(sq)?, self.board.color_on(sq)?))
    }

    pub fn is_check(&self) -> bool { *self.board.checkers() != EMPTY }

    pub fn is_checkmate(&self) -> bool { self.board.status() == BoardStatus::Checkmate }

    /// Legal moves in the order the move generator produces them
    pub fn legal_moves(&self) -> MoveGen { MoveGen::new_legal(&self.board) }

    /// The move in standard algebraic notation. `mv` must be legal here.
    pub fn san(&self, mv: ChessMove) -> String { notation::san(&self.board, mv) }

    /// Returns the position after `mv`, which must be legal here
    pub fn apply(&self, mv: ChessMove) -> Position {
        let resets_clock = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();
        Position {
            board: self.board.make_move_new(mv),
            halfmove_clock: if resets_clock { 0 } else { self.halfmove_clock.saturating_add(1) },
            fullmove_number: match self.side_to_move() {
                Color::White => self.fullmove_number,
                Color::Black => self.fullmove_number.saturating_add(1),
            },
        }
    }

    pub fn status(&self) -> Status {
        match self.board.status() {
            BoardStatus::Checkmate => Status::Win(!self.side_to_move()),
            BoardStatus::Stalemate => Status::Draw(DrawReason::Stalemate),
            BoardStatus::Ongoing if self.is_insufficient_material() => {
                Status::Draw(DrawReason::InsufficientMaterial)
            }
            BoardStatus::Ongoing if self.halfmove_clock >= SEVENTY_FIVE_MOVES => {
                Status::Draw(DrawReason::SeventyFiveMoveRule)
            }
            BoardStatus::Ongoing => Status::InProgress,
        }
    }

    /// Neither side can possibly deliver mate
    pub fn is_insufficient_material(&self) -> bool {
        self.has_insufficient_material(Color::White) && self.has_insufficient_material(Color::Black)
    }

    fn has_insufficient_material(&self, color: Color) -> bool {
        let b = &self.board;
        let mine = *b.color_combined(color);
        let theirs = *b.color_combined(!color);
        let heavy = *b.pieces(Piece::Pawn) | *b.pieces(Piece::Rook) | *b.pieces(Piece::Queen);

        if mine & heavy != EMPTY {
            return false;
        }

        // A lone knight can only mate if the other side has pieces that can
        // block its own king in
        if mine & *b.pieces(Piece::Knight) != EMPTY {
            return mine.popcnt() <= 2
                && theirs & !*b.pieces(Piece::King) & !*b.pieces(Piece::Queen) == EMPTY;
        }

        // Bishops need to be on both square colours, or have some other piece
        // to help
        if mine & *b.pieces(Piece::Bishop) != EMPTY {
            let bishops = *b.pieces(Piece::Bishop);
            let same_colour = bishops & DARK_SQUARES == EMPTY || bishops & !DARK_SQUARES == EMPTY;
            return same_colour
                && *b.pieces(Piece::Pawn) == EMPTY
                && *b.pieces(Piece::Knight) == EMPTY;
        }

        true
    }

    /// Renders the board from white's side, rank 8 first
    pub fn diagram(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            out.push_str(&format!("{} ", rank + 1));
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                match self.piece_at(sq) {
                    Some((p, c)) => out.push_str(&p.to_string(c)),
                    None => out.push('.'),
                }
                if file < 7 { out.push(' '); }
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h");
        out
    }
}

impl Default for Position {
    fn default() -> Self { Position::starting() }
}

impl FromStr for Position {
    type Err = Error;

    /// Accepts a FEN string. The two clock fields are optional and default
    /// to `0 1`.
    fn from_str(fen: &str) -> Result<Position> {
        let invalid = |reason: String| Error::InvalidPosition { fen: fen.to_string(), reason };

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid(format!("expected 4 to 6 fields, found {}", fields.len())));
        }

        // `chess::Board` can't be trusted with a board that has no king, so
        // the fields it reads are checked here first
        let squares = parse_placement(fields[0]).map_err(&invalid)?;
        if fields[1] != "w" && fields[1] != "b" {
            return Err(invalid(format!("bad side to move \"{}\"", fields[1])));
        }
        let castling = clean_castling(fields[2], &squares).map_err(&invalid)?;
        check_en_passant(fields[3], fields[1], &squares).map_err(&invalid)?;

        let board = Board::from_str(&[fields[0], fields[1], castling.as_str(), fields[3]].join(" "))
            .map_err(|e| invalid(e.to_string()))?;

        let clock = |i: usize, default: u32, name: &str| match fields.get(i) {
            Some(s) => s.parse::<u32>().map_err(|_| invalid(format!("bad {} \"{}\"", name, s))),
            None => Ok(default),
        };
        let halfmove_clock = clock(4, 0, "halfmove clock")?;
        let fullmove_number = clock(5, 1, "fullmove number")?;
        if fullmove_number == 0 {
            return Err(invalid("fullmove number must be positive".to_string()));
        }

        Ok(Position { board, halfmove_clock, fullmove_number })
    }
}

/// What the piece placement field puts on each square, indexed from a1 = 0
/// to h8 = 63
fn parse_placement(field: &str) -> std::result::Result<[Option<char>; 64], String> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(format!("expected 8 ranks, found {}", ranks.len()));
    }

    let mut squares = [None; 64];
    for (i, row) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0;
        for c in row.chars() {
            match c {
                '1'..='8' => file += c as usize - '0' as usize,
                'P' | 'N' | 'B' | 'R' | 'Q' | 'K' | 'p' | 'n' | 'b' | 'r' | 'q' | 'k' => {
                    if file < 8 {
                        squares[rank * 8 + file] = Some(c);
                    }
                    file += 1;
                }
                _ => return Err(format!("unexpected '{}' on rank {}", c, rank + 1)),
            }
            if file > 8 {
                return Err(format!("rank {} has more than 8 squares", rank + 1));
            }
        }
        if file != 8 {
            return Err(format!("rank {} has {} squares", rank + 1, file));
        }
    }

    for (king, colour) in [('K', "white"), ('k', "black")] {
        let count = squares.iter().filter(|&&sq| sq == Some(king)).count();
        if count != 1 {
            return Err(format!("expected one {} king, found {}", colour, count));
        }
    }
    Ok(squares)
}

/// Drops castling rights whose king or rook is not on its starting square,
/// returning the field in `KQkq` order
fn clean_castling(field: &str, squares: &[Option<char>; 64]) -> std::result::Result<String, String> {
    if field != "-" {
        for (i, c) in field.char_indices() {
            if !"KQkq".contains(c) || field[..i].contains(c) {
                return Err(format!("bad castling rights \"{}\"", field));
            }
        }
    }

    let kept: String = [('K', 4, 7), ('Q', 4, 0), ('k', 60, 63), ('q', 60, 56)]
        .into_iter()
        .filter(|&(right, king, rook)| {
            let (k, r) = if right.is_ascii_uppercase() { ('K', 'R') } else { ('k', 'r') };
            field.contains(right) && squares[king] == Some(k) && squares[rook] == Some(r)
        })
        .map(|(right, _, _)| right)
        .collect();

    Ok(if kept.is_empty() { "-".to_string() } else { kept })
}

/// An en passant square must sit behind a pawn that could just have made a
/// double step
fn check_en_passant(field: &str, side: &str, squares: &[Option<char>; 64]) -> std::result::Result<(), String> {
    if field == "-" {
        return Ok(());
    }
    let bad = || format!("bad en passant square \"{}\"", field);

    let bytes = field.as_bytes();
    if bytes.len() != 2 || !(b'a'..=b'h').contains(&bytes[0]) {
        return Err(bad());
    }
    let file = (bytes[0] - b'a') as usize;
    let (pawn_square, pawn) = match (side, bytes[1]) {
        ("w", b'6') => (4 * 8 + file, 'p'),
        ("b", b'3') => (3 * 8 + file, 'P'),
        _ => return Err(bad()),
    };
    if squares[pawn_square] != Some(pawn) {
        return Err(format!("no pawn to take en passant on {}", field));
    }
    Ok(())
}

impl fmt::Display for Position {
    /// Writes the position as a full six-field FEN
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let board_fen = self.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        write!(f, "{} {} {}", fields.join(" "), self.halfmove_clock, self.fullmove_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn pos(fen: &str) -> Position { fen.parse().unwrap() }

    #[test]
    fn starting_position_matches_its_fen() {
        assert_eq!(Position::starting(), pos(START_FEN));
        assert_eq!(Position::starting().to_string(), START_FEN);
        assert_eq!(Position::starting().legal_moves().len(), 20);
    }

    #[test]
    fn clocks_survive_a_round_trip() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 37 52";
        let p = pos(fen);
        assert_eq!(p.halfmove_clock(), 37);
        assert_eq!(p.fullmove_number(), 52);
        assert_eq!(p.to_string(), fen);
    }

    #[test]
    fn clocks_default_when_missing() {
        let p = pos("8/8/8/8/8/8/8/K1k5 w - -");
        assert_eq!((p.halfmove_clock(), p.fullmove_number()), (0, 1));
    }

    #[test]
    fn invalid_fens_are_rejected() {
        for fen in [
            "",
            "not a fen at all",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra",
            // No kings, or too many
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "8/8/8/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
            // Ranks of the wrong length
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4KX2 w - - 0 1",
            // Side to move
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            // Castling rights
            "r3k2r/8/8/8/8/8/8/R3K2R w XYZ - 0 1",
            "r3k2r/8/8/8/8/8/8/R3K2R w KK - 0 1",
            // En passant squares
            "4k3/8/8/8/8/8/8/4K3 w - z9 0 1",
            "4k3/8/8/8/8/8/8/4K3 b - e3 0 1",
            "4k3/8/8/8/4P3/8/8/4K3 w - e3 0 1",
            "4k3/8/8/3p4/8/8/8/4K3 w - d3 0 1",
        ] {
            let err = fen.parse::<Position>().unwrap_err();
            assert!(matches!(err, Error::InvalidPosition { .. }), "{:?} accepted", fen);
        }
    }

    #[test]
    fn castling_rights_without_their_rook_are_dropped() {
        assert_eq!(pos("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").to_string(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            pos("r3k3/8/8/8/8/8/8/4K2R w qKkQ - 0 1").to_string(),
            "r3k3/8/8/8/8/8/8/4K2R w Kq - 0 1"
        );
    }

    #[test]
    fn en_passant_square_behind_a_double_step_is_kept() {
        assert!("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1".parse::<Position>().is_ok());
        let p = pos("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        assert!(p.legal_moves().any(|mv| mv == ChessMove::new(Square::E5, Square::F6, None)));
    }

    #[test]
    fn clocks_saturate_instead_of_overflowing() {
        let p = pos(&format!("4k3/8/8/8/8/8/8/R3K3 b - - {} {}", u32::MAX, u32::MAX));
        let after = p.apply(ChessMove::new(Square::E8, Square::D7, None));
        assert_eq!(after.fullmove_number(), u32::MAX);
        assert_eq!(after.halfmove_clock(), u32::MAX);
    }

    #[test]
    fn apply_leaves_the_position_untouched() {
        let start = Position::starting();
        let e4 = ChessMove::new(Square::E2, Square::E4, None);
        let after = start.apply(e4);
        assert_eq!(start, Position::starting());
        assert_eq!(after.side_to_move(), Color::Black);
        assert_eq!(after.piece_at(Square::E4), Some((Piece::Pawn, Color::White)));
        assert_eq!(start.piece_at(Square::E4), None);
    }

    #[test]
    fn clocks_advance_with_moves() {
        let start = Position::starting();
        let nf3 = start.apply(ChessMove::new(Square::G1, Square::F3, None));
        assert_eq!((nf3.halfmove_clock(), nf3.fullmove_number()), (1, 1));
        let nf6 = nf3.apply(ChessMove::new(Square::G8, Square::F6, None));
        assert_eq!((nf6.halfmove_clock(), nf6.fullmove_number()), (2, 2));
        let e4 = nf6.apply(ChessMove::new(Square::E2, Square::E4, None));
        assert_eq!((e4.halfmove_clock(), e4.fullmove_number()), (0, 2));
    }

    #[test]
    fn checkmate_is_a_win_for_the_side_that_moved() {
        let fools_mate = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(fools_mate.is_checkmate());
        assert!(fools_mate.is_check());
        assert_eq!(fools_mate.status(), Status::Win(Color::Black));
        assert_eq!(fools_mate.status().result(), "0-1");
    }

    #[test]
    fn stalemate_is_a_draw() {
        let p = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(!p.is_check());
        assert_eq!(p.status(), Status::Draw(DrawReason::Stalemate));
        assert_eq!(p.status().result(), "1/2-1/2");
    }

    #[test]
    fn insufficient_material_draws() {
        for fen in [
            "8/8/8/4k3/8/8/8/4K3 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KN2 w - - 0 1",
            "8/8/8/4k3/8/8/8/4KB2 b - - 0 1",
            // Both bishops on light squares
            "2b5/8/8/4k3/8/8/8/4KB2 w - - 0 1",
        ] {
            assert_eq!(
                pos(fen).status(),
                Status::Draw(DrawReason::InsufficientMaterial),
                "{}", fen
            );
        }
    }

    #[test]
    fn mating_material_is_not_a_draw() {
        for fen in [
            "8/8/8/4k3/8/8/4P3/4K3 w - - 0 1",
            "8/8/8/4k3/8/8/8/3RK3 w - - 0 1",
            // Bishops on opposite colours
            "5b2/8/8/4k3/8/8/8/4KB2 w - - 0 1",
            "8/8/8/4k3/8/8/8/3NKN2 w - - 0 1",
        ] {
            assert_eq!(pos(fen).status(), Status::InProgress, "{}", fen);
        }
    }

    #[test]
    fn seventy_five_move_rule_draws() {
        let fen = "8/8/8/4k3/8/8/8/3RK3 w - - 150 120";
        assert_eq!(pos(fen).status(), Status::Draw(DrawReason::SeventyFiveMoveRule));
        let fen = "8/8/8/4k3/8/8/8/3RK3 w - - 149 120";
        assert_eq!(pos(fen).status(), Status::InProgress);
    }

    #[test]
    fn diagram_shows_pieces_by_case() {
        let diagram = Position::starting().diagram();
        let lines: Vec<&str> = diagram.lines().collect();
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[7], "1 R N B Q K B N R");
        assert_eq!(lines[8], "  a b c d e f g h");
    }
}

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, EMPTY};

/// Renders a legal move in standard algebraic notation, including the
/// check (`+`) or mate (`#`) suffix.
pub fn san(board: &Board, mv: ChessMove) -> String {
    let (src, dest) = (mv.get_source(), mv.get_dest());
    let Some(piece) = board.piece_on(src) else {
        return mv.to_string();
    };

    let mut san = String::new();

    let file_distance = src.get_file().to_index().abs_diff(dest.get_file().to_index());
    if piece == Piece::King && file_distance == 2 {
        let kingside = dest.get_file().to_index() > src.get_file().to_index();
        san.push_str(if kingside { "O-O" } else { "O-O-O" });
    } else {
        // En passant is the only capture onto an empty square
        let is_capture = board.piece_on(dest).is_some()
            || (piece == Piece::Pawn && file_distance != 0);

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_char(src));
            }
        } else {
            san.push_str(&piece.to_string(Color::White));
            san.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            san.push('x');
        }

        san.push_str(&dest.to_string());

        if let Some(promo) = mv.get_promotion() {
            san.push('=');
            san.push_str(&promo.to_string(Color::White));
        }
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if *after.checkers() != EMPTY {
        san.push('+');
    }

    san
}

/// The file, rank, or full square of the source needed to tell `mv` apart
/// from other moves of the same piece type to the same square
fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let src = mv.get_source();
    let others: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != src
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| other.get_source())
        .collect();

    if others.is_empty() {
        return String::new();
    }

    let shares_file = others.iter().any(|sq| sq.get_file() == src.get_file());
    let shares_rank = others.iter().any(|sq| sq.get_rank() == src.get_rank());

    let mut out = String::new();
    if !shares_file || shares_rank {
        out.push(file_char(src));
    }
    if shares_file {
        out.push(rank_char(src));
    }
    out
}

fn file_char(sq: Square) -> char { (b'a' + sq.get_file().to_index() as u8) as char }

fn rank_char(sq: Square) -> char { (b'1' + sq.get_rank().to_index() as u8) as char }

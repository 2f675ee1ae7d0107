use ansi_term::{Colour, Style};
use anyhow::Result;
use chess::Color;
use molt_chess::{Position, Ranking, ScoredMove};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    fen: String,
    turn: &'static str,
    best_moves: &'a [ScoredMove],
}

fn turn_name(position: &Position) -> &'static str {
    match position.side_to_move() {
        Color::White => "white",
        Color::Black => "black",
    }
}

pub fn json(position: &Position, ranking: &Ranking) -> Result<String> {
    let report = JsonReport {
        fen: position.to_string(),
        turn: turn_name(position),
        best_moves: ranking.moves(),
    };
    Ok(serde_json::to_string(&report)?)
}

pub fn text(position: &Position, ranking: &Ranking, show_board: bool, colour: bool) -> String {
    let paint = |style: Style, s: &str| {
        if colour { style.paint(s).to_string() } else { s.to_string() }
    };

    let mut out = String::new();
    out.push_str(&format!("Position: {}\n", position));
    out.push_str(&format!(
        "Turn: {}\n",
        match position.side_to_move() {
            Color::White => "White",
            Color::Black => "Black",
        }
    ));
    if show_board {
        out.push('\n');
        out.push_str(&position.diagram());
        out.push('\n');
    }

    out.push_str("\nTop moves:\n");
    for (i, m) in ranking.moves().iter().enumerate() {
        let line = format!("{}. {:8} (eval: {})", i + 1, m.san, m.eval);
        if m.is_checkmate {
            out.push_str(&paint(Colour::Red.bold(), &line));
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }

    match ranking.best() {
        Some(best) => out.push_str(&format!(
            "\nRecommended: {}\n",
            paint(Colour::Green.bold(), &best.san)
        )),
        None => out.push_str("\nNo moves requested\n"),
    }
    out
}

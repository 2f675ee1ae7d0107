mod config;
mod report;
mod server;

use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
};

use ansi_term::Colour;
use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use molt_chess::{Logger, MaterialEval, MoveRanker, Position};
use rand::Rng;

use config::Credentials;
use server::{GameSource, Lobby, MatchServer, DEFAULT_API_URL};

/// Arguments to the advisor
#[derive(Parser, Debug)]
#[command(
    name = "molt-advisor",
    about = "Suggests moves for a chess position by looking one move ahead, and plays them on the match server."
)]
struct Cli {
    /// Credentials file to read and write instead of
    /// ~/.config/molt-chess/credentials.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Match server to talk to
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// API key to use instead of the saved one
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// Log more to stderr (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Never colour the output
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the best moves in a position (the default)
    Analyze(AnalyzeArgs),
    /// Play the best move in every active game where it is our turn
    Play {
        /// How many candidate moves to log for each game
        #[arg(short, long, default_value = "5")]
        top: usize,
    },
    /// Register a new agent and save its credentials
    Register {
        /// Agent name, defaults to $MOLT_CHESS_AGENT_NAME or one made from
        /// the hostname
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Position to analyse, as FEN
    #[arg(long, conflicts_with = "game_id")]
    fen: Option<String>,
    /// Game on the match server whose position should be analysed
    #[arg(long)]
    game_id: Option<u64>,
    /// How many moves to list
    #[arg(short, long, default_value = "5")]
    top: usize,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
    /// Also draw the board
    #[arg(long)]
    board: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        AnalyzeArgs { fen: None, game_id: None, top: 5, json: false, board: false }
    }
}

/// Where to find the server and the key to use with it. The credentials
/// file is only read by commands that talk to the server.
struct Settings {
    path: Option<PathBuf>,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl Settings {
    fn from_cli(cli: &Cli) -> Settings {
        Settings {
            path: cli.config.clone().or_else(config::default_path),
            api_url: cli.api_url.clone(),
            api_key: cli.api_key.clone(),
        }
    }

    fn path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| anyhow!("no home directory to keep credentials in, pass --config"))
    }

    fn saved(&self) -> Result<Option<Credentials>> {
        match &self.path {
            Some(path) => config::load(path),
            None => Ok(None),
        }
    }

    fn api_url(&self, saved: Option<&Credentials>) -> String {
        config::api_url(self.api_url.as_deref(), saved, DEFAULT_API_URL)
    }

    fn server(&self) -> Result<MatchServer> {
        let saved = self.saved()?;
        let shown = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("~/.config/molt-chess/credentials.json"));
        let key = config::api_key(self.api_key.as_deref(), saved.as_ref(), &shown)?;
        Ok(MatchServer::new(&self.api_url(saved.as_ref()), Some(key)))
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", Colour::Red.paint("error:"), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(&cli);
    let logger = Logger::new(cli.verbose.saturating_mul(2));
    let colour = !cli.no_color && std::io::stdout().is_terminal();
    let mut out = std::io::stdout().lock();

    match cli.command.unwrap_or(Command::Analyze(AnalyzeArgs::default())) {
        Command::Analyze(args) => {
            let connect = || -> Result<Box<dyn GameSource>> { Ok(Box::new(settings.server()?)) };
            let position = resolve_position(&args, connect)?;
            analyze(&position, &args, logger, colour, &mut out)
        }
        Command::Play { top } => {
            let server = settings.server()?;
            logger.log_lazy(4, || format!("Match server: {}", server.api_url()));
            let ranker = MoveRanker::new(MaterialEval::default(), logger);
            play_games(&server, &ranker, top, &mut out)?;
            Ok(())
        }
        Command::Register { name } => {
            let name = name
                .or_else(|| std::env::var("MOLT_CHESS_AGENT_NAME").ok())
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(default_agent_name);
            register(&settings, &name, &mut out)
        }
    }
}

/// Works out which position to analyse. The server is only contacted, and
/// credentials only needed, when a game id is given.
fn resolve_position(
    args: &AnalyzeArgs,
    connect: impl FnOnce() -> Result<Box<dyn GameSource>>,
) -> Result<Position> {
    let fen = match (&args.fen, args.game_id) {
        (Some(fen), _) => fen.clone(),
        (None, Some(game_id)) => connect()?.fetch_fen(game_id)?,
        (None, None) => return Ok(Position::starting()),
    };
    Ok(fen.parse::<Position>()?)
}

fn analyze(
    position: &Position,
    args: &AnalyzeArgs,
    mut logger: Logger,
    colour: bool,
    out: &mut impl Write,
) -> Result<()> {
    let status = position.status();
    if !status.is_in_progress() {
        writeln!(out, "Game over: {}", status.result())?;
        return Ok(());
    }

    logger.time_start(2, "Ranking");
    let ranking = MoveRanker::new(MaterialEval::default(), logger.clone()).rank(position, args.top);
    logger.time_end(2, "Ranking");

    if args.json {
        writeln!(out, "{}", report::json(position, &ranking)?)?;
    } else {
        write!(out, "{}", report::text(position, &ranking, args.board, colour))?;
    }
    Ok(())
}

/// Plays one move in every game waiting on us. A failure in one game is
/// reported and the rest are still played. Returns how many moves were made.
fn play_games(
    lobby: &dyn Lobby,
    ranker: &MoveRanker,
    top_n: usize,
    out: &mut impl Write,
) -> Result<usize> {
    let games = lobby.active_games()?;
    let waiting: Vec<_> = games.iter().filter(|g| g.your_turn).collect();
    if waiting.is_empty() {
        writeln!(out, "No games waiting for a move ({} active)", games.len())?;
        return Ok(0);
    }

    let mut played = 0;
    for game in &waiting {
        match play_game(lobby, ranker, game.game_id, top_n) {
            Ok(Some((san, result))) => {
                played += 1;
                writeln!(out, "Game {}: Played {}", game.game_id, san)?;
                if let Some(result) = result {
                    writeln!(out, "  Game ended: {}", result)?;
                }
            }
            Ok(None) => writeln!(out, "Game {}: no legal move to play", game.game_id)?,
            Err(e) => writeln!(out, "Game {}: {:#}", game.game_id, e)?,
        }
    }
    writeln!(out, "Played {} of {} waiting games", played, waiting.len())?;
    Ok(played)
}

fn play_game(
    lobby: &dyn Lobby,
    ranker: &MoveRanker,
    game_id: u64,
    top_n: usize,
) -> Result<Option<(String, Option<String>)>> {
    let position: Position = lobby.fetch_fen(game_id)?.parse()?;
    let ranking = ranker.rank(&position, top_n.max(1));
    let Some(best) = ranking.best() else { return Ok(None) };

    let outcome = lobby.submit_move(game_id, &best.san)?;
    if !outcome.success {
        bail!("server did not accept {}", best.san);
    }
    Ok(Some((best.san.clone(), outcome.result)))
}

fn register(settings: &Settings, name: &str, out: &mut impl Write) -> Result<()> {
    let path = settings.path()?;
    // A file that can't be read is about to be replaced anyway
    let saved = settings.saved().unwrap_or_default();
    let server = MatchServer::new(&settings.api_url(saved.as_ref()), None);
    let agent = server.register(name)?;

    let credentials = Credentials {
        name: agent.name.clone(),
        api_key: agent.api_key.clone(),
        api_url: Some(server.api_url().to_string()),
    };
    config::save(path, &credentials)?;

    writeln!(out, "Registered {}", agent.name)?;
    writeln!(out, "Credentials saved to {}", path.display())?;
    if let Some(url) = &agent.claim_url {
        writeln!(out, "Claim URL: {}", url)?;
    }
    if let Some(code) = &agent.verification_code {
        writeln!(out, "Verification code: {}", code)?;
    }
    Ok(())
}

fn default_agent_name() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .unwrap_or_default();
    agent_name(&host, rand::thread_rng().gen_range(1000..=9999))
}

fn agent_name(host: &str, suffix: u16) -> String {
    let host: String = host.trim().to_lowercase().replace('.', "-").chars().take(20).collect();
    let host = if host.is_empty() { "molt".to_string() } else { host };
    format!("agent-{}-{}", host, suffix)
}

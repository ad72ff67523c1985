//! Session CLI
//!
//! Play a clocked game against a UCI engine from the terminal, and inspect
//! saved game records.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chess_core::{Board, Color, GameClock, GameSnapshot, GameState, Move};
use chess_session::{BoardAnchor, EngineMoveCallback, GameRecord, GameRegistry, SessionConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn print_usage() {
    println!("Chess session runner");
    println!();
    println!("Usage:");
    println!("  chess_session play [--config FILE] [--color white|black] [--out FILE]");
    println!("  chess_session show <FILE>");
    println!();
    println!("While playing, enter moves in UCI form (e2e4, e7e8q) or:");
    println!("  moves   list legal moves");
    println!("  fen     print the current position");
    println!("  board   redraw the board");
    println!("  quit    stop the game");
}

struct PlayArgs {
    config: Option<PathBuf>,
    color: Color,
    out: Option<PathBuf>,
}

fn parse_play_args(args: &[String]) -> Result<PlayArgs> {
    let mut parsed = PlayArgs {
        config: None,
        color: Color::White,
        out: None,
    };

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--config" | "-c", Some(v)) => parsed.config = Some(PathBuf::from(v)),
            ("--out" | "-o", Some(v)) => parsed.out = Some(PathBuf::from(v)),
            ("--color", Some(v)) => {
                parsed.color = match v.to_lowercase().as_str() {
                    "white" | "w" => Color::White,
                    "black" | "b" => Color::Black,
                    other => bail!("unknown color '{other}'"),
                }
            }
            (flag, _) => bail!("unexpected argument '{flag}'"),
        }
        i += 2;
    }
    Ok(parsed)
}

fn render_board(board: &Board, perspective: Color) -> String {
    let rows: Vec<i8> = match perspective {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };
    let cols: Vec<i8> = match perspective {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };

    let mut out = String::new();
    for &row in &rows {
        out.push_str(&format!("{} ", row + 1));
        for &col in &cols {
            let c = board.get(row, col).map_or('.', |pc| pc.fen_char());
            out.push(' ');
            out.push(c);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for &col in &cols {
        out.push(' ');
        out.push((b'a' + col as u8) as char);
    }
    out
}

fn print_status(snapshot: &GameSnapshot, human: Color) {
    println!("{}", render_board(&snapshot.board, human));
    println!(
        "White {}  Black {}",
        GameClock::format_time(Duration::from_millis(snapshot.white_time_ms)),
        GameClock::format_time(Duration::from_millis(snapshot.black_time_ms)),
    );
    match snapshot.state {
        GameState::Active if snapshot.in_check => println!("{} to move (check)", snapshot.current_player),
        GameState::Active => println!("{} to move", snapshot.current_player),
        GameState::WhiteWins => println!("White wins"),
        GameState::BlackWins => println!("Black wins"),
        GameState::Stalemate => println!("Stalemate"),
    }
}

async fn run_play(args: &[String]) -> Result<()> {
    let args = parse_play_args(args)?;
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let time_control = config.time_control();

    let registry = Arc::new(GameRegistry::new(config));
    let ticker = registry.spawn_ticker();

    let game = registry.create_game(BoardAnchor::new(0, 0, 0), "terminal")?;
    let human = Uuid::new_v4();
    registry.assign_player(game.id(), human, args.color);

    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel::<(Move, GameSnapshot)>();
    let on_move: EngineMoveCallback = Arc::new(move |mv: &Move, snapshot: &GameSnapshot| {
        let _ = engine_tx.send((*mv, snapshot.clone()));
    });
    registry
        .bind_engine(game.id(), args.color.other(), Some(on_move))
        .await
        .context("could not start the engine (set engine.path in the config)")?;

    let snapshot = game.snapshot().await.context("game closed unexpectedly")?;
    let (white, black) = match args.color {
        Color::White => ("human", "engine"),
        Color::Black => ("engine", "human"),
    };
    let mut record = GameRecord::new(white, black, time_control, &snapshot);
    print_status(&snapshot, args.color);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(500));
    let mut last_state = snapshot.state;

    while !last_state.is_terminal() {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                let cmd = line.trim();
                match cmd {
                    "" => {}
                    "quit" | "exit" => break,
                    "help" => print_usage(),
                    "fen" => {
                        if let Some(s) = game.snapshot().await {
                            println!("{}", s.fen);
                        }
                    }
                    "board" => {
                        if let Some(s) = game.snapshot().await {
                            print_status(&s, args.color);
                        }
                    }
                    "moves" => {
                        let Some(s) = game.snapshot().await else { break };
                        let mut all = Vec::new();
                        for row in 0..8 {
                            for col in 0..8 {
                                all.extend(game.legal_moves(row, col).await);
                            }
                        }
                        let list: Vec<String> = all.iter().map(Move::to_string).collect();
                        println!("{} legal moves for {}: {}", list.len(), s.current_player, list.join(" "));
                    }
                    text => match game.play_uci(text).await {
                        Some(mv) => {
                            record.push_move(mv.to_string());
                            if let Some(s) = game.snapshot().await {
                                println!("You played {mv}");
                                print_status(&s, args.color);
                                last_state = s.state;
                            }
                        }
                        None => println!("Illegal move: {text}"),
                    },
                }
            }
            Some((mv, s)) = engine_rx.recv() => {
                record.push_move(mv.to_string());
                println!("Engine played {mv}");
                print_status(&s, args.color);
                last_state = s.state;
            }
            _ = poll.tick() => {
                let Some(s) = game.snapshot().await else { break };
                if s.state.is_terminal() && !last_state.is_terminal() {
                    print_status(&s, args.color);
                }
                last_state = s.state;
            }
        }
    }

    if let Some(s) = game.snapshot().await {
        record.finish(&s);
    }
    registry.remove_game(game.id()).await;
    ticker.abort();

    record.print_report();
    if let Some(path) = &args.out {
        record
            .save(path)
            .with_context(|| format!("failed to save record to {}", path.display()))?;
        println!("Record saved to {}", path.display());
    }
    Ok(())
}

fn show_record(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("show requires a record file");
    };
    let record = GameRecord::load(Path::new(path))
        .with_context(|| format!("failed to load {path}"))?;
    record.print_report();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "play" => run_play(&args[2..]).await,
        "show" => show_record(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            Ok(())
        }
    }
}

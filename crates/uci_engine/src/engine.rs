//! A UCI engine running as a child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::SearchClock;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::protocol::{self, BestMove};
use crate::provider::MoveProvider;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How to launch an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Budget for the `uci`/`isready` exchange after spawning
    pub handshake_timeout: Duration,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

struct EngineIo {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineIo {
    async fn send(&mut self, line: &str) -> Result<()> {
        debug!(">> {line}");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self, waiting_for: &'static str) -> Result<String> {
        match self.lines.next_line().await? {
            Some(line) => {
                debug!("<< {line}");
                Ok(line)
            }
            None => Err(EngineError::Closed(waiting_for)),
        }
    }

    /// `uci` → `uciok`, then `isready` → `readyok`. Returns the name the
    /// engine reported, if any.
    async fn handshake(&mut self) -> Result<Option<String>> {
        self.send(protocol::UCI).await?;
        let mut name = None;
        loop {
            let line = self.next_line(protocol::UCI_OK).await?;
            if let Some(n) = protocol::parse_id_name(&line) {
                name = Some(n.to_string());
            }
            if line.trim() == protocol::UCI_OK {
                break;
            }
        }

        self.send(protocol::IS_READY).await?;
        while self.next_line(protocol::READY_OK).await?.trim() != protocol::READY_OK {}
        Ok(name)
    }

    async fn new_game(&mut self) -> Result<()> {
        self.send(protocol::NEW_GAME).await?;
        self.send(protocol::IS_READY).await?;
        while self.next_line(protocol::READY_OK).await?.trim() != protocol::READY_OK {}
        Ok(())
    }

    async fn search(&mut self, fen: &str, clock: &SearchClock) -> Result<BestMove> {
        self.send(&protocol::position_command(fen)).await?;
        self.send(&protocol::go_command(clock)).await?;
        loop {
            let line = self.next_line("bestmove").await?;
            if let Some(best) = protocol::parse_bestmove(&line) {
                return Ok(best);
            }
        }
    }
}

/// Adapter around one engine process.
///
/// The process is killed when the adapter is closed or dropped. Queries are
/// serialized: a second `best_move` waits for the first to finish.
pub struct UciEngine {
    name: String,
    child: parking_lot::Mutex<Option<Child>>,
    io: tokio::sync::Mutex<Option<EngineIo>>,
}

impl UciEngine {
    /// Spawn the engine and complete the UCI handshake.
    pub async fn start(command: &EngineCommand) -> Result<Self> {
        let program = command.program.display().to_string();
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(EngineError::MissingPipe("stdout"))?;
        let mut io = EngineIo {
            stdin,
            lines: BufReader::new(stdout).lines(),
        };

        // On any failure below `child` is dropped and killed.
        let reported = tokio::time::timeout(command.handshake_timeout, io.handshake())
            .await
            .map_err(|_| EngineError::HandshakeTimeout(command.handshake_timeout))??;
        let name = reported.unwrap_or(program);
        info!(engine = %name, "UCI engine ready");

        Ok(Self {
            name,
            child: parking_lot::Mutex::new(Some(child)),
            io: tokio::sync::Mutex::new(Some(io)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.child.lock().is_none()
    }

    /// Ask for the best move in `fen`. `None` when the engine has no move,
    /// has gone away, or fails mid-query; a failed engine stays failed.
    pub async fn best_move(&self, fen: &str, clock: SearchClock) -> Option<String> {
        let mut guard = self.io.lock().await;
        let io = guard.as_mut()?;
        match io.search(fen, &clock).await {
            Ok(best) => best.into_move(),
            Err(err) => {
                if self.is_closed() {
                    debug!(engine = %self.name, "query ended by close");
                } else {
                    warn!(engine = %self.name, error = %err, "engine query failed");
                }
                *guard = None;
                None
            }
        }
    }

    /// Tell the engine a new game is starting and wait until it is ready.
    /// Returns false if the engine is gone.
    pub async fn new_game(&self) -> bool {
        let mut guard = self.io.lock().await;
        let Some(io) = guard.as_mut() else {
            return false;
        };
        match io.new_game().await {
            Ok(()) => true,
            Err(err) => {
                warn!(engine = %self.name, error = %err, "ucinewgame failed");
                *guard = None;
                false
            }
        }
    }

    /// Kill the process. Safe to call more than once; a query in flight
    /// sees the closed pipe and resolves to no move.
    pub fn close(&self) {
        let Some(mut child) = self.child.lock().take() else {
            return;
        };
        match child.start_kill() {
            Ok(()) => info!(engine = %self.name, "UCI engine closed"),
            Err(err) => warn!(engine = %self.name, error = %err, "failed to kill engine"),
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl MoveProvider for UciEngine {
    fn name(&self) -> &str {
        UciEngine::name(self)
    }

    async fn best_move(&self, fen: &str, clock: SearchClock) -> Option<String> {
        UciEngine::best_move(self, fen, clock).await
    }

    fn close(&self) {
        UciEngine::close(self)
    }
}

//! Per-connection request handling.
//!
//! Requests are single lines of the form `<verb> <argument> [rest]`. Each
//! line gets exactly one reply line; the reply is flushed before the next
//! request is read.

use std::io;

use junkmap_core::{Ledger, normalize_address};
use thiserror::Error;
use tokio::io::{
  AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::{
  AppState,
  reply::{INVALID_DOMAIN, INVALID_INPUT, NOT_IMPLEMENTED},
};

/// Longest accepted request line, excluding the terminator.
pub const MAX_LINE: usize = 4096;

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// A well-formed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
  /// `get <address>`; the address is already trimmed.
  Get(&'a str),
  /// `put ...`; accepted by the parser but never served.
  Put,
}

/// Why a request line was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
  #[error("empty request")]
  Empty,
  #[error("{0:?} needs an argument")]
  MissingArgument(String),
  #[error("unknown verb {0:?}")]
  UnknownVerb(String),
  #[error("request longer than {} bytes", MAX_LINE)]
  TooLong,
  #[error("request is not valid UTF-8")]
  NotUtf8,
}

impl<'a> Command<'a> {
  pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut parts = line.splitn(3, ' ');

    let verb = parts.next().unwrap_or_default();
    if verb.is_empty() {
      return Err(ProtocolError::Empty);
    }
    let argument = parts.next().and_then(normalize_address);

    match (verb, argument) {
      ("get", Some(address)) => Ok(Command::Get(address)),
      ("put", Some(_)) => Ok(Command::Put),
      ("get" | "put", None) => Err(ProtocolError::MissingArgument(verb.to_owned())),
      (other, _) => Err(ProtocolError::UnknownVerb(other.to_owned())),
    }
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Compute the reply line for one request line.
pub async fn respond<'s, L: Ledger>(line: &str, state: &'s AppState<L>) -> &'s str {
  match Command::parse(line) {
    Ok(Command::Get(address)) => {
      if !state.settings.accepts_domain(address) {
        tracing::debug!(address, "address outside configured domain");
        return INVALID_DOMAIN;
      }
      let verdict = state.evaluator.evaluate(address).await;
      state.settings.replies.render(verdict)
    }
    Ok(Command::Put) => NOT_IMPLEMENTED,
    Err(e) => {
      tracing::debug!(error = %e, "invalid request");
      INVALID_INPUT
    }
  }
}

// ─── Connection loop ─────────────────────────────────────────────────────────

/// Outcome of reading one request from the peer.
enum Read {
  Eof,
  Line,
  TooLong,
}

/// Serve requests on `stream` until the peer closes it, a read or write
/// fails, or the configured idle timeout elapses. Malformed requests are
/// answered and the connection stays open.
pub async fn handle<S, L>(stream: S, state: &AppState<L>) -> io::Result<()>
where
  S: AsyncRead + AsyncWrite + Unpin,
  L: Ledger,
{
  let (rd, mut wr) = tokio::io::split(stream);
  let mut reader = BufReader::new(rd);
  let mut buf = Vec::new();

  loop {
    let read = read_request(&mut reader, &mut buf);

    let outcome = match state.settings.idle_timeout {
      Some(idle) => match tokio::time::timeout(idle, read).await {
        Ok(r) => r?,
        Err(_) => {
          tracing::debug!("idle timeout, closing connection");
          return Ok(());
        }
      },
      None => read.await?,
    };

    let reply = match outcome {
      Read::Eof => return Ok(()),
      Read::TooLong => {
        tracing::debug!(error = %ProtocolError::TooLong, "invalid request");
        INVALID_INPUT
      }
      Read::Line => match std::str::from_utf8(&buf) {
        Ok(line) => {
          tracing::debug!(request = line.trim_end(), "request");
          respond(line, state).await
        }
        Err(_) => {
          tracing::debug!(error = %ProtocolError::NotUtf8, "invalid request");
          INVALID_INPUT
        }
      },
    };

    tracing::debug!(reply, "reply");
    write_reply(&mut wr, reply).await?;
  }
}

/// Read one request line into `buf`. A line longer than [`MAX_LINE`] is
/// skipped through its terminator and reported as [`Read::TooLong`].
async fn read_request<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Read>
where
  R: AsyncBufRead + Unpin,
{
  buf.clear();
  let limit = MAX_LINE as u64 + 1;
  let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
  if n == 0 {
    return Ok(Read::Eof);
  }
  if buf.last() != Some(&b'\n') && n as u64 == limit {
    discard_line(reader).await?;
    return Ok(Read::TooLong);
  }
  Ok(Read::Line)
}

async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
  R: AsyncBufRead + Unpin,
{
  loop {
    let available = reader.fill_buf().await?;
    if available.is_empty() {
      return Ok(());
    }
    match available.iter().position(|&b| b == b'\n') {
      Some(i) => {
        reader.consume(i + 1);
        return Ok(());
      }
      None => {
        let len = available.len();
        reader.consume(len);
      }
    }
  }
}

async fn write_reply<W: AsyncWrite + Unpin>(wr: &mut W, reply: &str) -> io::Result<()> {
  wr.write_all(reply.as_bytes()).await?;
  wr.write_all(b"\n").await?;
  wr.flush().await
}

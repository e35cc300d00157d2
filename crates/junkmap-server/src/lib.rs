//! Line-oriented TCP front end for junkmap.
//!
//! Accepts `get <address>` lookups from a mail server, runs them through the
//! [`TrustEvaluator`] backed by any [`Ledger`], and answers with one reply
//! line per request.

pub mod config;
pub mod error;
pub mod reply;
pub mod session;

pub use config::{ServerConfig, Settings};
pub use error::{Error, Result};

use std::{future::Future, io, sync::Arc};

use junkmap_core::{Ledger, TrustEvaluator};
use tokio::net::TcpListener;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state handed to every connection task.
pub struct AppState<L> {
  pub evaluator: TrustEvaluator<L>,
  pub settings:  Arc<Settings>,
}

impl<L> Clone for AppState<L> {
  fn clone(&self) -> Self {
    Self { evaluator: self.evaluator.clone(), settings: Arc::clone(&self.settings) }
  }
}

impl<L: Ledger> AppState<L> {
  pub fn new(ledger: Arc<L>, settings: Arc<Settings>) -> Self {
    Self { evaluator: TrustEvaluator::new(ledger, settings.expiry), settings }
  }
}

// ─── Accept loop ──────────────────────────────────────────────────────────────

/// Accept connections on `listener` until `shutdown` resolves, serving each
/// one on its own task.
pub async fn serve<L, F>(listener: TcpListener, state: AppState<L>, shutdown: F) -> io::Result<()>
where
  L: Ledger + 'static,
  F: Future<Output = ()>,
{
  tokio::pin!(shutdown);

  loop {
    tokio::select! {
      () = &mut shutdown => {
        tracing::info!("shutting down");
        return Ok(());
      }
      accepted = listener.accept() => {
        let (stream, peer) = match accepted {
          Ok(conn) => conn,
          Err(e) => {
            tracing::warn!(error = %e, "accept failed");
            continue;
          }
        };

        let state = state.clone();
        tokio::spawn(async move {
          tracing::debug!(%peer, "connection opened");
          if let Err(e) = session::handle(stream, &state).await {
            tracing::warn!(%peer, error = %e, "connection error");
          }
          tracing::debug!(%peer, "connection closed");
        });
      }
    }
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

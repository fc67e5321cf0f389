// Process signals for the HTTP server: shutdown and knowledge base rebuilds

use crate::error::{Result, TaError};
use tokio::signal::unix::{signal, Signal as TokioSignal, SignalKind};

/// What a received signal asks the server to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSignal {
    Shutdown(&'static str),
    Rebuild,
}

/// Listens for SIGTERM, SIGINT, SIGHUP and SIGUSR1
pub struct SignalHandler {
    sigterm: TokioSignal,
    sigint: TokioSignal,
    sighup: TokioSignal,
    sigusr1: TokioSignal,
}

fn install(kind: SignalKind, name: &str) -> Result<TokioSignal> {
    signal(kind).map_err(|e| TaError::Io {
        source: e,
        context: format!("Failed to set up {} handler", name),
    })
}

impl SignalHandler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sigterm: install(SignalKind::terminate(), "SIGTERM")?,
            sigint: install(SignalKind::interrupt(), "SIGINT")?,
            sighup: install(SignalKind::hangup(), "SIGHUP")?,
            sigusr1: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }

    /// Wait for the next signal
    pub async fn wait(&mut self) -> ServerSignal {
        tokio::select! {
            _ = self.sigterm.recv() => {
                tracing::info!("Received SIGTERM");
                ServerSignal::Shutdown("SIGTERM")
            }
            _ = self.sigint.recv() => {
                tracing::info!("Received SIGINT");
                ServerSignal::Shutdown("SIGINT")
            }
            _ = self.sighup.recv() => {
                tracing::info!("Received SIGHUP");
                ServerSignal::Shutdown("SIGHUP")
            }
            _ = self.sigusr1.recv() => {
                tracing::info!("Received SIGUSR1");
                ServerSignal::Rebuild
            }
        }
    }
}

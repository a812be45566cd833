// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns process signals into one [`CancellationToken`].
//!
//! The bot loop and the escalation scheduler both watch the token; the
//! caller writes the final snapshot once they have returned.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawns a task that cancels the returned token on SIGINT or SIGTERM.
///
/// Cancelling the token from elsewhere ends the task quietly.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), stopping tocsin");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, stopping tocsin");
                }
                _ = token_clone.cancelled() => {
                    debug!("shutdown requested internally");
                    return;
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => info!("received Ctrl+C, stopping tocsin"),
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
    });

    token
}

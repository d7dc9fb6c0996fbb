//! # Cross-platform interrupt signal handling.
//!
//! Provides [`wait_for_interrupt_signal`], which completes when the process
//! receives a termination signal. The annotator uses it (when
//! `AnnotatorConfig::interrupt_on_signal` is set) to abort the publisher
//! instead of letting a stuck agent hold up process exit.
//!
//! ## Signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio_util::sync::CancellationToken;

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_interrupt_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(not(unix))]
pub(crate) async fn wait_for_interrupt_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Cancels `token` on the first termination signal.
///
/// Exits quietly when the token is cancelled first or registration fails.
pub(crate) async fn interrupt_on_signal(token: CancellationToken) {
    tokio::select! {
        res = wait_for_interrupt_signal() => {
            if res.is_ok() {
                token.cancel();
            }
        }
        _ = token.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn watcher_exits_quietly_once_token_is_cancelled() {
        let token = CancellationToken::new();
        let watcher = tokio::spawn(interrupt_on_signal(token.clone()));

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher should stop with its token")
            .unwrap();
    }

    #[tokio::test]
    async fn watcher_leaves_token_alone_without_a_signal() {
        let token = CancellationToken::new();
        let watcher = tokio::spawn(interrupt_on_signal(token.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!token.is_cancelled());
        assert!(!watcher.is_finished());
        watcher.abort();
    }
}

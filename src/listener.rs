//! Background loop that idles while the server may push messages.
//!
//! Inbound messages are read by the connection's own read loop; this task
//! only keeps a second line of control alive until it is told to stop.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::cli::output::Printer;

pub struct Listener {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<u64>,
}

impl Listener {
    /// Start the loop. It wakes every `poll` and checks for cancellation.
    pub fn spawn(poll: Duration, printer: Printer) -> Self {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            let mut wakeups = 0u64;
            loop {
                tokio::time::sleep(poll).await;
                wakeups += 1;
                match shutdown_rx.try_recv() {
                    Err(TryRecvError::Empty) => {
                        tracing::trace!("Listener still waiting (wakeup {wakeups})");
                    }
                    _ => {
                        printer.status("waitReq Done...");
                        return wakeups;
                    }
                }
            }
        });

        Self { shutdown_tx, handle }
    }

    /// Signal the loop and wait for it to notice. Returns how often it woke up.
    pub async fn cancel(self) -> u64 {
        let _ = self.shutdown_tx.send(());
        match self.handle.await {
            Ok(wakeups) => wakeups,
            Err(e) => {
                tracing::warn!("Listener task ended abnormally: {e}");
                0
            }
        }
    }
}

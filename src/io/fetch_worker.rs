use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::io::source::{FetchError, MentionSource};
use crate::model::candidate::StaffRecord;
use crate::ops::directory::RefreshTicket;

/// A finished directory fetch, ready for `MentionEngine::on_refresh_completed`.
#[derive(Debug)]
pub struct FetchCompleted {
    pub ticket: RefreshTicket,
    pub result: Result<Vec<StaffRecord>, FetchError>,
}

/// Runs directory fetches on background threads and queues their results for
/// the host's event loop.
pub struct FetchWorker {
    source: Arc<dyn MentionSource>,
    tx: mpsc::Sender<FetchCompleted>,
    rx: mpsc::Receiver<FetchCompleted>,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn MentionSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        FetchWorker { source, tx, rx }
    }

    /// Fetch in the background. The thread skips sending if the session has
    /// already been unmounted by the time the fetch returns.
    pub fn spawn(&self, ticket: RefreshTicket) -> std::io::Result<()> {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::Builder::new()
            .name("mention-fetch".into())
            .spawn(move || {
                let result = source.fetch_mentionable_users();
                if !ticket.is_alive() {
                    debug!(generation = ticket.generation(), "fetch finished after unmount");
                    return;
                }
                let generation = ticket.generation();
                if tx.send(FetchCompleted { ticket, result }).is_err() {
                    debug!(generation, "fetch finished after the worker was dropped");
                }
            })?;
        Ok(())
    }

    /// Non-blocking poll for finished fetches.
    pub fn poll(&self) -> Vec<FetchCompleted> {
        let mut done = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            done.push(evt);
        }
        done
    }

    /// Block until the next fetch finishes.
    pub fn wait(&self) -> Option<FetchCompleted> {
        self.rx.recv().ok()
    }
}

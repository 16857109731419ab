// worker.rs

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, warn};

use crate::list::{Outcome, Request};
use crate::store::ItemStore;

/// Runs store requests off the UI thread. Each request gets its own thread;
/// finished outcomes queue up on a channel until the event loop drains them,
/// in whatever order the responses resolved.
pub struct Dispatcher {
    store: Arc<dyn ItemStore>,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            store,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn submit(&mut self, request: Request) {
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        debug!(?request, "dispatching");
        let spawned = thread::Builder::new()
            .name("taskdeck-request".into())
            .spawn(move || {
                let outcome = request.execute(store.as_ref());
                // Receiver gone means the app is shutting down.
                let _ = tx.send(outcome);
            });
        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => warn!(error = %e, "could not spawn request thread"),
        }
    }

    /// Outcomes that have arrived so far, without waiting.
    pub fn drain(&mut self) -> Vec<Outcome> {
        let mut out = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            out.push(outcome);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    /// Blocks until every submitted request has answered.
    pub fn settle(&mut self) -> Vec<Outcome> {
        let mut out = Vec::new();
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(outcome) => {
                    self.in_flight -= 1;
                    out.push(outcome);
                }
                // Unreachable while `self.tx` is alive.
                Err(_) => break,
            }
        }
        out
    }
}

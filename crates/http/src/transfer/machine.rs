use std::io;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::transfer::{StreamOutcome, TransferEvent};

/// Where a transfer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// nothing decided yet
    Idle,
    /// the body goes out in several writes
    Streaming,
    /// the body went out with a single write
    FileSent,
    /// an outcome was produced
    Done,
}

/// Reconciles transfer events with the finished signal of the response.
///
/// The connection may report it is finished before, after or without the
/// transfer reporting its end. The first signal that decides the outcome
/// resolves the machine; later signals are ignored.
#[derive(Debug)]
pub struct StreamMachine {
    state: StreamState,
    resolver: Option<oneshot::Sender<StreamOutcome>>,
    deferred: bool,
}

impl StreamMachine {
    pub fn new() -> (Self, oneshot::Receiver<StreamOutcome>) {
        let (resolver, outcome) = oneshot::channel();
        (Self { state: StreamState::Idle, resolver: Some(resolver), deferred: false }, outcome)
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_none()
    }

    /// Whether a clean finish waits for the deferred check.
    pub fn is_deferred(&self) -> bool {
        self.deferred && !self.is_resolved()
    }

    pub fn on_event(&mut self, event: TransferEvent) {
        trace!(?event, state = ?self.state, "transfer event");
        match event {
            TransferEvent::Error(e) => self.resolve(StreamOutcome::Failed(e.into())),
            TransferEvent::Directory => self.resolve(StreamOutcome::DirectoryRejected),
            TransferEvent::Headers => {}
            TransferEvent::Stream => self.transition(StreamState::Streaming),
            TransferEvent::File => self.transition(StreamState::FileSent),
            TransferEvent::End => self.resolve(StreamOutcome::Completed),
        }
    }

    /// Handles the finished signal of the response.
    ///
    /// A reset connection aborts and any other error fails. A clean finish is
    /// only judged one scheduling tick later by [`on_deferred_check`](Self::on_deferred_check),
    /// giving the transfer the chance to report its end first.
    pub fn on_finished(&mut self, error: Option<io::Error>) {
        match error {
            Some(e) if e.kind() == io::ErrorKind::ConnectionReset => self.resolve(StreamOutcome::Aborted),
            Some(e) => self.resolve(StreamOutcome::Failed(e.into())),
            None => self.deferred = true,
        }
    }

    /// Aborts unless the body went out with a single write.
    pub fn on_deferred_check(&mut self) {
        self.deferred = false;
        if self.state != StreamState::FileSent {
            self.resolve(StreamOutcome::Aborted);
        }
    }

    /// Aborts a transfer that can no longer report anything.
    pub fn abandon(&mut self) {
        self.resolve(StreamOutcome::Aborted);
    }

    fn transition(&mut self, state: StreamState) {
        if self.state != StreamState::Done {
            self.state = state;
        }
    }

    fn resolve(&mut self, outcome: StreamOutcome) {
        match self.resolver.take() {
            Some(resolver) => {
                debug!(?outcome, "transfer resolved");
                self.state = StreamState::Done;
                let _ = resolver.send(outcome);
            }
            None => debug!(?outcome, "ignore signal after resolution"),
        }
    }
}

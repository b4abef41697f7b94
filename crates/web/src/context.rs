//! The state the middlewares work on.
//!
//! An [`InputContext`] owns the raw [`IncomingMessage`] and the
//! [`IncomingEvent`] being built from it. An [`OutputContext`] carries the
//! [`OutgoingResult`] of the application towards a [`ResponseSink`]; output
//! middlewares prepare the response head and pick a [`Dispatch`], which
//! [`OutputContext::send`] then performs.

use std::fmt;

use bytes::Bytes;
use edge_http::protocol::{HttpFailure, IncomingMessage, ResponseSink};
use edge_http::transfer::{FileTransfer, stream_file};
use tracing::debug;

use crate::{IncomingEvent, OutgoingResult};

#[derive(Debug)]
pub struct InputContext {
    pub message: IncomingMessage,
    pub event: IncomingEvent,
}

impl InputContext {
    pub fn new(message: IncomingMessage) -> Self {
        Self { message, event: IncomingEvent::new() }
    }

    pub fn into_event(self) -> IncomingEvent {
        self.event
    }
}

/// How the response body gets written.
#[derive(Debug)]
pub enum Dispatch {
    /// end the response, with the whole body if any
    End(Option<Bytes>),
    File(FileTransfer),
}

pub struct OutputContext<'r> {
    pub event: &'r IncomingEvent,
    pub response: &'r mut dyn ResponseSink,
    pub result: OutgoingResult,
    pub dispatch: Option<Dispatch>,
}

impl fmt::Debug for OutputContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputContext")
            .field("event", &self.event)
            .field("result", &self.result)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl<'r> OutputContext<'r> {
    pub fn new(event: &'r IncomingEvent, response: &'r mut dyn ResponseSink, result: OutgoingResult) -> Self {
        Self { event, response, result, dispatch: None }
    }

    /// Whether an output middleware already decided how to send the body.
    pub fn is_dispatched(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Performs the chosen dispatch.
    ///
    /// # Errors
    ///
    /// A failing write is reported as an unexpected failure; a file transfer
    /// reports its [`StreamOutcome`](edge_http::transfer::StreamOutcome) mapped
    /// onto a failure.
    pub async fn send(self) -> Result<(), HttpFailure> {
        match self.dispatch {
            Some(Dispatch::End(chunk)) => self.response.end(chunk).await.map_err(HttpFailure::io),
            Some(Dispatch::File(transfer)) => stream_file(self.response, &transfer).await.into_result(),
            None => {
                debug!("nothing dispatched, response left open");
                Ok(())
            }
        }
    }
}

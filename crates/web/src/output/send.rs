use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use http::Method;
use tracing::warn;

use crate::{Dispatch, OutputContext, OutputMiddleware, ResultContent};

/// Ends the response with the buffered content, unless a dispatch was already chosen.
///
/// `HEAD` requests get no body.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendMiddleware;

#[async_trait]
impl OutputMiddleware for SendMiddleware {
    async fn handle(&self, ctx: &mut OutputContext<'_>) -> Result<(), HttpFailure> {
        if ctx.is_dispatched() {
            return Ok(());
        }

        let chunk = match ctx.result.content() {
            _ if ctx.event.is_method(&Method::HEAD) => None,
            ResultContent::Empty => None,
            ResultContent::Bytes(bytes) => Some(bytes.clone()),
            ResultContent::File(path) => {
                warn!(path = %path.display(), "file result without a file sender, sending no body");
                None
            }
        };

        ctx.dispatch = Some(Dispatch::End(chunk));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::HeaderStatusMiddleware;
    use crate::output::test_support::respond;
    use crate::{IncomingEvent, OutgoingResult};
    use http::StatusCode;

    #[tokio::test]
    async fn sends_buffered_content() {
        let written = respond(
            &[&HeaderStatusMiddleware, &SendMiddleware],
            &IncomingEvent::new(),
            OutgoingResult::bytes(StatusCode::OK, "hello"),
        )
        .await
        .unwrap();

        assert_eq!(written, "HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello");
    }

    #[tokio::test]
    async fn head_request_has_no_body() {
        let event = IncomingEvent { method: Method::HEAD, ..IncomingEvent::new() };

        let written =
            respond(&[&HeaderStatusMiddleware, &SendMiddleware], &event, OutgoingResult::bytes(StatusCode::OK, "hello")).await.unwrap();

        assert_eq!(written, "HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
    }
}

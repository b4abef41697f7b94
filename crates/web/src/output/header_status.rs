use async_trait::async_trait;
use edge_http::protocol::{HttpFailure, ReasonPhrase};
use http::StatusCode;

use crate::{OutputContext, OutputMiddleware};

/// Sets the status, the reason phrase and the result headers on the response.
///
/// A result without status is answered with `500`. Result headers replace the
/// response headers of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderStatusMiddleware;

#[async_trait]
impl OutputMiddleware for HeaderStatusMiddleware {
    async fn handle(&self, ctx: &mut OutputContext<'_>) -> Result<(), HttpFailure> {
        let result = &ctx.result;
        let head = ctx.response.head_mut();

        *head.status_mut() = result.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match result.status_message() {
            Some(message) => {
                head.extensions_mut().insert(ReasonPhrase(message.to_string()));
            }
            None => {
                head.extensions_mut().remove::<ReasonPhrase>();
            }
        }

        let headers = head.headers_mut();
        for name in result.headers().keys() {
            headers.remove(name);
        }
        for (name, value) in result.headers() {
            headers.append(name, value.clone());
        }
        Ok(())
    }
}

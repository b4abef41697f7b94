use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use edge_http::transfer::{DownloadOptions, FileTransfer};
use http::Method;
use http::header::RANGE;

use crate::{Dispatch, OutputContext, OutputMiddleware, ResultContent};

/// Streams file results from disk.
///
/// The transfer honours the `Range` header of the request; `HEAD` requests end
/// without a body.
#[derive(Debug, Clone, Default)]
pub struct SendFileMiddleware {
    options: DownloadOptions,
}

impl SendFileMiddleware {
    pub fn new(options: DownloadOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl OutputMiddleware for SendFileMiddleware {
    async fn handle(&self, ctx: &mut OutputContext<'_>) -> Result<(), HttpFailure> {
        let ResultContent::File(path) = ctx.result.content() else {
            return Ok(());
        };

        ctx.dispatch = Some(if ctx.event.is_method(&Method::HEAD) {
            Dispatch::End(None)
        } else {
            let range = ctx.event.headers().get(RANGE).and_then(|value| value.to_str().ok());
            Dispatch::File(FileTransfer::new(path.clone(), self.options.clone()).with_range(range))
        });
        Ok(())
    }
}

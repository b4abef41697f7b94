use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use edge_http::upload::{UploadOptions, ingest, is_multipart};

use crate::{EventBody, InputContext, InputMiddleware};

/// Ingests multipart bodies: files land on disk, fields become the body.
#[derive(Debug, Clone, Default)]
pub struct FilesMiddleware {
    options: UploadOptions,
}

impl FilesMiddleware {
    pub fn new(options: UploadOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl InputMiddleware for FilesMiddleware {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        if !is_multipart(ctx.message.headers()) {
            return Ok(());
        }
        let Some(body) = ctx.message.take_body() else {
            return Ok(());
        };

        let (fields, files) = ingest(ctx.message.headers(), body, &self.options).await?.into_parts();
        ctx.event.body = EventBody::Fields(fields);
        ctx.event.files = files;
        Ok(())
    }
}

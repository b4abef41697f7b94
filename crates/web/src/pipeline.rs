use std::fmt;

use async_trait::async_trait;
use edge_http::protocol::{HttpFailure, IncomingMessage, ResponseSink};
use tracing::debug;

use crate::config::{AdapterConfig, ConfigError};
use crate::input::{BodyMiddleware, CommonMiddleware, FilesMiddleware, HostMiddleware, IpMiddleware};
use crate::output::{HeaderStatusMiddleware, SendFileMiddleware, SendMiddleware};
use crate::{IncomingEvent, InputContext, OutgoingResult, OutputContext};

/// A step turning the raw message into the [`IncomingEvent`].
#[async_trait]
pub trait InputMiddleware: Send + Sync {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure>;
}

/// A step turning the [`OutgoingResult`] into a response.
#[async_trait]
pub trait OutputMiddleware: Send + Sync {
    async fn handle(&self, ctx: &mut OutputContext<'_>) -> Result<(), HttpFailure>;
}

/// Input middlewares run in order; the first failure stops the pipeline.
pub struct InputPipeline {
    inner: Vec<Box<dyn InputMiddleware>>,
}

impl fmt::Debug for InputPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPipeline").field("middlewares", &self.inner.len()).finish()
    }
}

#[async_trait]
impl InputMiddleware for InputPipeline {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        for middleware in self.inner.iter() {
            middleware.handle(ctx).await.inspect_err(|failure| {
                debug!(status = %failure.status(), code = failure.code(), "input middleware failed: {failure}");
            })?;
        }
        Ok(())
    }
}

impl InputPipeline {
    pub fn builder() -> InputPipelineBuilder {
        InputPipelineBuilder::new()
    }

    /// The default pipeline: common, host, ip, body and files.
    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        let trust = config.trust_policy();
        Ok(Self::builder()
            .add_last(CommonMiddleware::new(trust.clone()))
            .add_last(HostMiddleware::new(config.host_policy()?))
            .add_last(IpMiddleware::new(trust))
            .add_last(BodyMiddleware::new(config.body_options()?))
            .add_last(FilesMiddleware::new(config.upload_options()?))
            .build())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs every middleware over a fresh context built from `message`.
    pub async fn process(&self, message: IncomingMessage) -> Result<InputContext, HttpFailure> {
        let mut ctx = InputContext::new(message);
        self.handle(&mut ctx).await?;
        Ok(ctx)
    }
}

pub struct InputPipelineBuilder {
    inner: Vec<Box<dyn InputMiddleware>>,
}

impl fmt::Debug for InputPipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPipelineBuilder").field("middlewares", &self.inner.len()).finish()
    }
}

impl InputPipelineBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn add_last<M: InputMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.inner.push(Box::new(middleware));
        self
    }

    pub fn add_first<M: InputMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.inner.insert(0, Box::new(middleware));
        self
    }

    pub fn build(self) -> InputPipeline {
        InputPipeline { inner: self.inner }
    }
}

/// Output middlewares run in order; the first failure stops the pipeline.
pub struct OutputPipeline {
    inner: Vec<Box<dyn OutputMiddleware>>,
}

impl fmt::Debug for OutputPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPipeline").field("middlewares", &self.inner.len()).finish()
    }
}

#[async_trait]
impl OutputMiddleware for OutputPipeline {
    async fn handle(&self, ctx: &mut OutputContext<'_>) -> Result<(), HttpFailure> {
        for middleware in self.inner.iter() {
            middleware.handle(ctx).await?;
        }
        Ok(())
    }
}

impl OutputPipeline {
    pub fn builder() -> OutputPipelineBuilder {
        OutputPipelineBuilder::new()
    }

    /// The default pipeline: header status, send file and send.
    pub fn from_config(config: &AdapterConfig) -> Result<Self, ConfigError> {
        Ok(Self::builder()
            .add_last(HeaderStatusMiddleware)
            .add_last(SendFileMiddleware::new(config.download_options()?))
            .add_last(SendMiddleware)
            .build())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs every middleware and sends the response.
    pub async fn respond(
        &self,
        event: &IncomingEvent,
        response: &mut dyn ResponseSink,
        result: OutgoingResult,
    ) -> Result<(), HttpFailure> {
        let mut ctx = OutputContext::new(event, response, result);
        self.handle(&mut ctx).await?;
        ctx.send().await
    }
}

pub struct OutputPipelineBuilder {
    inner: Vec<Box<dyn OutputMiddleware>>,
}

impl fmt::Debug for OutputPipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPipelineBuilder").field("middlewares", &self.inner.len()).finish()
    }
}

impl OutputPipelineBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn add_last<M: OutputMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.inner.push(Box::new(middleware));
        self
    }

    pub fn add_first<M: OutputMiddleware + 'static>(mut self, middleware: M) -> Self {
        self.inner.insert(0, Box::new(middleware));
        self
    }

    pub fn build(self) -> OutputPipeline {
        OutputPipeline { inner: self.inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_http::connection::WireResponse;
    use http::{Request, StatusCode};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::{Arc, Mutex};

    struct Record(&'static str, Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl InputMiddleware for Record {
        async fn handle(&self, _ctx: &mut InputContext) -> Result<(), HttpFailure> {
            self.1.lock().unwrap().push(self.0);
            Ok(())
        }
    }

    struct Fail;

    #[async_trait]
    impl InputMiddleware for Fail {
        async fn handle(&self, _ctx: &mut InputContext) -> Result<(), HttpFailure> {
            Err(HttpFailure::new(StatusCode::BAD_REQUEST, "nope", "failing on purpose"))
        }
    }

    fn message() -> IncomingMessage {
        let request = Request::builder().uri("/").header("host", "example.com").body(()).unwrap();
        IncomingMessage::new(request, IpAddr::V4(Ipv4Addr::LOCALHOST), false)
    }

    #[tokio::test]
    async fn runs_in_builder_order_and_stops_at_first_failure() {
        let calls = Arc::new(Mutex::new(vec![]));
        let pipeline = InputPipeline::builder()
            .add_last(Record("b", calls.clone()))
            .add_first(Record("a", calls.clone()))
            .add_last(Fail)
            .add_last(Record("c", calls.clone()))
            .build();

        assert_eq!(pipeline.len(), 4);
        let failure = pipeline.process(message()).await.unwrap_err();

        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn default_pipelines_round_trip() {
        let config = AdapterConfig::default();
        let input = InputPipeline::from_config(&config).unwrap();
        let output = OutputPipeline::from_config(&config).unwrap();
        assert_eq!(input.len(), 5);
        assert_eq!(output.len(), 3);

        let ctx = input.process(message()).await.unwrap();
        assert_eq!(ctx.event.url(), "http://example.com/");

        let mut response = WireResponse::new(Vec::new());
        output.respond(&ctx.event, &mut response, OutgoingResult::bytes(StatusCode::OK, "hi")).await.unwrap();

        let written = String::from_utf8(response.into_inner()).unwrap();
        assert!(written.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(written.contains("content-length: 2\r\n"));
        assert!(written.ends_with("\r\n\r\nhi"));
    }
}

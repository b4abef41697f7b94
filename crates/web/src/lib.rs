//! Input and output middleware pipelines for HTTP adapters
//!
//! An adapter receives an [`IncomingMessage`](edge_http::protocol::IncomingMessage)
//! from its transport and runs it through an [`InputPipeline`], which fills an
//! [`IncomingEvent`]: method, headers, protocol, hostname, URL, client address,
//! parsed body and uploaded files. The application answers with an
//! [`OutgoingResult`], which an [`OutputPipeline`] writes to a
//! [`ResponseSink`](edge_http::protocol::ResponseSink).
//!
//! # Example
//!
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! use edge_http::connection::WireResponse;
//! use edge_http::protocol::{IncomingMessage, RequestBody};
//! use edge_web::{AdapterConfig, InputPipeline, OutgoingResult, OutputPipeline};
//! use http::{Request, StatusCode};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = AdapterConfig::from_json(r#"{ "proxy": { "trusted": "127.0.0.1" } }"#)?;
//! let input = InputPipeline::from_config(&config)?;
//! let output = OutputPipeline::from_config(&config)?;
//!
//! let request = Request::builder()
//!     .uri("/hello")
//!     .header("host", "example.com")
//!     .body(RequestBody::empty())?;
//! let message = IncomingMessage::from_request(request, IpAddr::V4(Ipv4Addr::LOCALHOST), false);
//!
//! let event = input.process(message).await?.into_event();
//! let mut response = WireResponse::new(tokio::io::stdout());
//! output.respond(&event, &mut response, OutgoingResult::bytes(StatusCode::OK, event.url().to_string())).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod event;
mod outgoing;
mod pipeline;

pub mod input;
pub mod output;

pub use config::AdapterConfig;
pub use config::BodyConfig;
pub use config::BodyOptions;
pub use config::ConfigError;
pub use config::DomainConfig;
pub use config::DownloadConfig;
pub use config::FilesConfig;
pub use config::LimitsConfig;
pub use config::OneOrMany;
pub use config::ProxyConfig;
pub use config::SizeValue;
pub use config::UploadConfig;
pub use context::Dispatch;
pub use context::InputContext;
pub use context::OutputContext;
pub use event::EventBody;
pub use event::IncomingEvent;
pub use outgoing::OutgoingResult;
pub use outgoing::ResultContent;
pub use pipeline::InputMiddleware;
pub use pipeline::InputPipeline;
pub use pipeline::InputPipelineBuilder;
pub use pipeline::OutputMiddleware;
pub use pipeline::OutputPipeline;
pub use pipeline::OutputPipelineBuilder;

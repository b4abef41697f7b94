//! Runs a few requests through the default pipelines and prints the responses.

use std::io::Write;
use std::net::IpAddr;

use edge_http::connection::WireResponse;
use edge_http::protocol::{IncomingMessage, RequestBody};
use edge_web::{AdapterConfig, EventBody, IncomingEvent, InputPipeline, OutgoingResult, OutputPipeline};
use http::{Request, StatusCode};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const CONFIG: &str = r#"{
    "proxy": { "trusted": ["127.0.0.1", "10.0.0.0/8"] },
    "domain": { "trusted": ["example.com", "/^(.+\\.)?example\\.com$/"] },
    "body": { "limit": "16kb" },
    "files": { "download": { "headers": { "cache-control": "no-cache" } } }
}"#;

fn application(event: &IncomingEvent, download: &std::path::Path) -> OutgoingResult {
    match event.body() {
        EventBody::Json(json) => OutgoingResult::bytes(StatusCode::OK, format!("hello {} from {}", json["name"], event.ip())),
        EventBody::Empty if event.url().ends_with("/download") => OutgoingResult::file(download),
        _ => OutgoingResult::new().with_status(StatusCode::NOT_FOUND).with_status_message("Nothing Here"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AdapterConfig::from_json(CONFIG)?;
    let input = InputPipeline::from_config(&config)?;
    let output = OutputPipeline::from_config(&config)?;

    let mut download = tempfile::NamedTempFile::with_suffix(".txt")?;
    writeln!(download, "served from disk")?;

    let requests = vec![
        Request::builder()
            .method("POST")
            .uri("/greet")
            .header("x-forwarded-host", "api.example.com")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.3")
            .header("content-type", "application/json")
            .body(RequestBody::buffered(r#"{"name":"stone"}"#))?,
        Request::builder().uri("/download").header("x-forwarded-host", "example.com").body(RequestBody::empty())?,
        Request::builder().uri("/").header("x-forwarded-host", "evil.org").body(RequestBody::empty())?,
    ];

    let peer: IpAddr = "10.0.0.2".parse()?;
    for request in requests {
        let message = IncomingMessage::from_request(request, peer, false);
        let event = match input.process(message).await {
            Ok(ctx) => ctx.into_event(),
            Err(failure) => {
                error!(status = %failure.status(), "rejected: {}", failure.body());
                continue;
            }
        };

        let result = application(&event, download.path());
        let mut response = WireResponse::new(Vec::new());
        output.respond(&event, &mut response, result).await?;

        info!("{} {}\n{}", event.method(), event.url(), String::from_utf8_lossy(&response.into_inner()));
    }
    Ok(())
}

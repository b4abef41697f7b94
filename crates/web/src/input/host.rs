use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use edge_http::proxy::{HostPolicy, resolve_hostname};
use tracing::debug;

use crate::{InputContext, InputMiddleware};

/// Resolves the hostname and builds the absolute URL and the query string.
///
/// Must run after [`CommonMiddleware`](crate::input::CommonMiddleware), whose
/// protocol it uses.
#[derive(Debug, Clone, Default)]
pub struct HostMiddleware {
    policy: HostPolicy,
}

impl HostMiddleware {
    pub fn new(policy: HostPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl InputMiddleware for HostMiddleware {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        let message = &ctx.message;
        let event = &mut ctx.event;

        let hostname = resolve_hostname(message.remote_addr(), message.headers(), &self.policy)?;
        let uri = message.uri();
        let target = uri.path_and_query().map_or("/", |path_and_query| path_and_query.as_str());

        event.url = if hostname.is_empty() { target.to_string() } else { format!("{}://{hostname}{target}", event.protocol) };
        event.query_string = match uri.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        };
        event.hostname = hostname;

        debug!(url = %event.url, "resolved url");
        Ok(())
    }
}

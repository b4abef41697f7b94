use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use edge_http::proxy::{TrustPolicy, resolve_protocol};

use crate::{InputContext, InputMiddleware};

/// Copies the method and headers, and resolves the protocol.
#[derive(Debug, Clone, Default)]
pub struct CommonMiddleware {
    trust: TrustPolicy,
}

impl CommonMiddleware {
    pub fn new(trust: TrustPolicy) -> Self {
        Self { trust }
    }
}

#[async_trait]
impl InputMiddleware for CommonMiddleware {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        let message = &ctx.message;
        let event = &mut ctx.event;

        event.method = message.method().clone();
        event.headers = message.headers().clone();
        event.protocol = resolve_protocol(message.remote_addr(), message.headers(), message.is_encrypted(), &self.trust);
        Ok(())
    }
}

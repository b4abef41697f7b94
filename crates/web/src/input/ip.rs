use async_trait::async_trait;
use edge_http::protocol::HttpFailure;
use edge_http::proxy::{ForwardedChain, TrustPolicy};

use crate::{InputContext, InputMiddleware};

/// Resolves the client address and the trusted forwarded chain.
#[derive(Debug, Clone, Default)]
pub struct IpMiddleware {
    trust: TrustPolicy,
}

impl IpMiddleware {
    pub fn new(trust: TrustPolicy) -> Self {
        Self { trust }
    }
}

#[async_trait]
impl InputMiddleware for IpMiddleware {
    async fn handle(&self, ctx: &mut InputContext) -> Result<(), HttpFailure> {
        let client = ForwardedChain::resolve(ctx.message.remote_addr(), ctx.message.headers(), &self.trust);
        (ctx.event.ip, ctx.event.ips) = client.into_parts();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::test_support::context;
    use edge_http::protocol::RequestBody;
    use http::Request;

    fn request() -> Request<RequestBody> {
        Request::builder()
            .header("x-forwarded-for", "223.19.23.0, 125.19.23.0, 125.19.23.55, 125.19.23.60")
            .body(RequestBody::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn follows_trusted_hops() {
        let mut ctx = context(request(), "127.0.0.1", false);
        let trust = TrustPolicy::from_specs(["127.0.0.1", "125.19.23.0/24"], [] as [&str; 0]);

        IpMiddleware::new(trust).handle(&mut ctx).await.unwrap();

        assert_eq!(ctx.event.ip(), "223.19.23.0");
        assert_eq!(ctx.event.ips(), ["223.19.23.0", "125.19.23.0", "125.19.23.55", "125.19.23.60"]);
    }

    #[tokio::test]
    async fn untrusted_peer_is_the_client() {
        let mut ctx = context(request(), "127.0.0.1", false);

        IpMiddleware::default().handle(&mut ctx).await.unwrap();

        assert_eq!(ctx.event.ip(), "127.0.0.1");
        assert!(ctx.event.ips().is_empty());
    }
}

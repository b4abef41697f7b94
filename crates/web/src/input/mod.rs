//! Middlewares filling the [`IncomingEvent`](crate::IncomingEvent).
//!
//! The default order matters: [`HostMiddleware`] builds the URL from the
//! protocol resolved by [`CommonMiddleware`], and [`BodyMiddleware`] leaves
//! multipart bodies to [`FilesMiddleware`].

mod body;
mod common;
mod files;
mod host;
mod ip;

pub use body::BodyError;
pub use body::BodyMiddleware;
pub use common::CommonMiddleware;
pub use files::FilesMiddleware;
pub use host::HostMiddleware;
pub use ip::IpMiddleware;

#[cfg(test)]
pub(crate) mod test_support {
    use std::net::IpAddr;

    use edge_http::protocol::{IncomingMessage, RequestBody};
    use http::Request;

    use crate::InputContext;

    pub(crate) fn context(request: Request<RequestBody>, remote_addr: &str, encrypted: bool) -> InputContext {
        let remote_addr: IpAddr = remote_addr.parse().unwrap();
        InputContext::new(IncomingMessage::from_request(request, remote_addr, encrypted))
    }
}

//! Middlewares turning the [`OutgoingResult`](crate::OutgoingResult) into a response.

mod header_status;
mod send;
mod send_file;

pub use header_status::HeaderStatusMiddleware;
pub use send::SendMiddleware;
pub use send_file::SendFileMiddleware;

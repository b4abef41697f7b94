//! Core protocol abstractions shared by the adapter layer.
//!
//! # Architecture
//!
//! - **Framing**: types fed to the response encoder
//!   - [`Message`]: a head or a body item
//!   - [`PayloadItem`]: a body chunk or the end of the body
//!   - [`PayloadSize`]: how the body is framed
//!
//! - **Inbound** ([`body`]): the raw message as handed over by the transport
//!   - [`IncomingMessage`]: header, socket address, encryption flag and body
//!   - [`RequestBody`]: buffered bytes or a live stream
//!
//! - **Outbound**: the response collaborator
//!   - [`ResponseSink`]: status, headers, body writes and the finished notification
//!   - [`ResponseHead`]: response headers before body attachment
//!
//! - **Headers**: [`HeaderMapExt`], comma separated value helpers for proxy headers
//!
//! - **Error Handling**:
//!   - [`HttpFailure`]: the failure every public operation reports
//!   - [`SendError`]: response encoding errors

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::IncomingMessage;
pub use request::RequestHeader;

mod response;
pub use response::FinishedSignal;
pub use response::ReasonPhrase;
pub use response::ResponseHead;
pub use response::ResponseSink;

mod header;
pub use header::HeaderMapExt;

mod error;
pub use error::native_code;
pub use error::BoxError;
pub use error::HttpFailure;
pub use error::SendError;

pub mod body;
pub use body::RequestBody;

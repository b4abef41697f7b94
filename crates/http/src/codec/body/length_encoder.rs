use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// Copies chunks through until the announced length is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
    eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length, eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(mut bytes) => {
                if self.length == 0 {
                    warn!("encode payload_item but no need to encode anymore");
                    return Ok(());
                }

                let take = u64::try_from(bytes.remaining()).map_or(self.length, |size| size.min(self.length));
                let mut left = usize::try_from(take).unwrap_or(usize::MAX);
                self.length -= take;
                while left > 0 && bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len().min(left);
                    dst.extend_from_slice(&chunk[..len]);
                    bytes.advance(len);
                    left -= len;
                }
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                Ok(())
            }
        }
    }
}

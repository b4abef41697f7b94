//! `multipart/form-data` decoding
//!
//! [`MultipartDecoder`] splits a form body into a flat stream of [`PartItem`]s:
//! a [`PartHeader`] opens each part, body chunks follow, and `PartEnd` closes it.
//! `Eof` is emitted once the closing boundary is seen.

mod multipart_decoder;
mod part_header;

pub use multipart_decoder::MultipartDecoder;
pub use multipart_decoder::PartItem;
pub use part_header::PartHeader;

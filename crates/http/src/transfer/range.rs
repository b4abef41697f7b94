/// An inclusive byte range of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// The number of bytes in the range.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// The `Content-Range` value for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }

    /// Parses a single `bytes=` range against a file of `size` bytes.
    ///
    /// Multiple ranges, other units and unsatisfiable ranges give `None`.
    pub fn parse(header: &str, size: u64) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?.trim();
        if spec.contains(',') || size == 0 {
            return None;
        }

        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());
        let last = size - 1;

        let range = if start.is_empty() {
            let suffix: u64 = end.parse().ok()?;
            if suffix == 0 {
                return None;
            }
            Self { start: size.saturating_sub(suffix), end: last }
        } else {
            let start: u64 = start.parse().ok()?;
            let end = if end.is_empty() { last } else { end.parse::<u64>().ok()?.min(last) };
            Self { start, end }
        };

        (range.start <= range.end).then_some(range)
    }
}

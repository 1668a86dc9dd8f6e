//! Line and SSE helpers shared by streaming providers

/// Buffer management for line-based streaming protocols
///
/// Bytes are held until a newline arrives, so a multi-byte character split
/// across two network chunks is decoded intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    /// Create a new line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Add data to buffer and return complete, non-blank lines
    pub fn add_data(&mut self, data: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }

        lines
    }

    /// Get any remaining data in the buffer
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// Split an SSE line into field and value
///
/// Comment lines (leading `:`) and lines without a colon yield `None`.
pub fn parse_sse_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(':') {
        return None;
    }
    let pos = line.find(':')?;
    let (field, value) = line.split_at(pos);
    let value = value.get(1..)?.trim_start();
    Some((field, value))
}

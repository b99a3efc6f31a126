//! AWS event-stream framing (`application/vnd.amazon.eventstream`).
//!
//! Wire layout of one message:
//!
//! ```text
//! total_len:u32 | headers_len:u32 | prelude_crc:u32 | headers | payload | message_crc:u32
//! ```
//!
//! All integers are big-endian; both checksums are CRC-32 (IEEE). The
//! decoder is incremental: network chunks are pushed in as they arrive and
//! complete frames are pulled out, so a frame may straddle any number of
//! chunks.

use relay_domain::error::{Error, Result};

const PRELUDE_LEN: usize = 12;
const TRAILER_LEN: usize = 4;
const MIN_FRAME_LEN: usize = PRELUDE_LEN + TRAILER_LEN;
/// Frames above this are rejected rather than buffered.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Frame model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Bytes(Vec<u8>),
    String(String),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Uuid([u8; 16]),
}

impl HeaderValue {
    fn type_tag(&self) -> u8 {
        match self {
            HeaderValue::Bool(true) => 0,
            HeaderValue::Bool(false) => 1,
            HeaderValue::Byte(_) => 2,
            HeaderValue::Short(_) => 3,
            HeaderValue::Int(_) => 4,
            HeaderValue::Long(_) => 5,
            HeaderValue::Bytes(_) => 6,
            HeaderValue::String(_) => 7,
            HeaderValue::Timestamp(_) => 8,
            HeaderValue::Uuid(_) => 9,
        }
    }
}

/// One decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// A header's value if it is a string header.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        match self.header(name)? {
            HeaderValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Incremental decoder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pull the next complete frame, or `Ok(None)` if more bytes are needed.
    ///
    /// A checksum or layout error is fatal: the buffer is left as-is and
    /// the caller should abandon the stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.buf.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let total_len = read_u32(&self.buf[0..4]) as usize;
        let headers_len = read_u32(&self.buf[4..8]) as usize;
        let prelude_crc = read_u32(&self.buf[8..12]);

        if crc32fast::hash(&self.buf[0..8]) != prelude_crc {
            return Err(Error::Decode("event stream prelude checksum mismatch".into()));
        }
        if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&total_len) {
            return Err(Error::Decode(format!(
                "event stream frame length {total_len} out of range"
            )));
        }
        if headers_len > total_len - MIN_FRAME_LEN {
            return Err(Error::Decode(format!(
                "event stream headers length {headers_len} exceeds frame length {total_len}"
            )));
        }
        if self.buf.len() < total_len {
            return Ok(None);
        }

        let message_crc = read_u32(&self.buf[total_len - TRAILER_LEN..total_len]);
        if crc32fast::hash(&self.buf[..total_len - TRAILER_LEN]) != message_crc {
            return Err(Error::Decode("event stream message checksum mismatch".into()));
        }

        let frame: Vec<u8> = self.buf.drain(..total_len).collect();
        let headers_end = PRELUDE_LEN + headers_len;
        let headers = parse_headers(&frame[PRELUDE_LEN..headers_end])?;
        let payload = frame[headers_end..total_len - TRAILER_LEN].to_vec();

        Ok(Some(Frame { headers, payload }))
    }
}

fn parse_headers(mut raw: &[u8]) -> Result<Vec<(String, HeaderValue)>> {
    let mut headers = Vec::new();

    while !raw.is_empty() {
        let name_len = take(&mut raw, 1)?[0] as usize;
        let name = String::from_utf8(take(&mut raw, name_len)?.to_vec())
            .map_err(|_| Error::Decode("event stream header name is not UTF-8".into()))?;
        let tag = take(&mut raw, 1)?[0];

        let value = match tag {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => HeaderValue::Byte(take(&mut raw, 1)?[0] as i8),
            3 => HeaderValue::Short(i16::from_be_bytes(array(take(&mut raw, 2)?))),
            4 => HeaderValue::Int(i32::from_be_bytes(array(take(&mut raw, 4)?))),
            5 => HeaderValue::Long(i64::from_be_bytes(array(take(&mut raw, 8)?))),
            6 | 7 => {
                let len = u16::from_be_bytes(array(take(&mut raw, 2)?)) as usize;
                let bytes = take(&mut raw, len)?.to_vec();
                if tag == 6 {
                    HeaderValue::Bytes(bytes)
                } else {
                    HeaderValue::String(String::from_utf8(bytes).map_err(|_| {
                        Error::Decode(format!("event stream header '{name}' is not UTF-8"))
                    })?)
                }
            }
            8 => HeaderValue::Timestamp(i64::from_be_bytes(array(take(&mut raw, 8)?))),
            9 => HeaderValue::Uuid(array(take(&mut raw, 16)?)),
            other => {
                return Err(Error::Decode(format!(
                    "event stream header '{name}' has unknown type {other}"
                )))
            }
        };

        headers.push((name, value));
    }

    Ok(headers)
}

fn take<'a>(raw: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if raw.len() < n {
        return Err(Error::Decode("event stream header truncated".into()));
    }
    let (head, tail) = raw.split_at(n);
    *raw = tail;
    Ok(head)
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(array(bytes))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Encoder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encode one frame. The relay only ever decodes, but stub runtimes in
/// tests and local tooling need to produce well-formed streams.
pub fn encode_frame(headers: &[(&str, HeaderValue)], payload: &[u8]) -> Vec<u8> {
    let mut header_bytes = Vec::new();
    for (name, value) in headers {
        header_bytes.push(name.len() as u8);
        header_bytes.extend_from_slice(name.as_bytes());
        header_bytes.push(value.type_tag());
        match value {
            HeaderValue::Bool(_) => {}
            HeaderValue::Byte(b) => header_bytes.push(*b as u8),
            HeaderValue::Short(v) => header_bytes.extend_from_slice(&v.to_be_bytes()),
            HeaderValue::Int(v) => header_bytes.extend_from_slice(&v.to_be_bytes()),
            HeaderValue::Long(v) | HeaderValue::Timestamp(v) => {
                header_bytes.extend_from_slice(&v.to_be_bytes())
            }
            HeaderValue::Bytes(b) => {
                header_bytes.extend_from_slice(&(b.len() as u16).to_be_bytes());
                header_bytes.extend_from_slice(b);
            }
            HeaderValue::String(s) => {
                header_bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
                header_bytes.extend_from_slice(s.as_bytes());
            }
            HeaderValue::Uuid(u) => header_bytes.extend_from_slice(u),
        }
    }

    let total_len = MIN_FRAME_LEN + header_bytes.len() + payload.len();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&(total_len as u32).to_be_bytes());
    out.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    let prelude_crc = crc32fast::hash(&out);
    out.extend_from_slice(&prelude_crc.to_be_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(payload);
    let message_crc = crc32fast::hash(&out);
    out.extend_from_slice(&message_crc.to_be_bytes());
    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_frame(payload: &[u8]) -> Vec<u8> {
        encode_frame(
            &[
                (":message-type", HeaderValue::String("event".into())),
                (":event-type", HeaderValue::String("chunk".into())),
                (":content-type", HeaderValue::String("application/json".into())),
            ],
            payload,
        )
    }

    #[test]
    fn decodes_single_frame() {
        let mut dec = FrameDecoder::new();
        dec.push(&chunk_frame(br#"{"bytes":"SGk="}"#));

        let frame = dec.next_frame().unwrap().expect("frame");
        assert_eq!(frame.header_str(":event-type"), Some("chunk"));
        assert_eq!(frame.header_str(":message-type"), Some("event"));
        assert_eq!(frame.payload, br#"{"bytes":"SGk="}"#);
        assert!(dec.next_frame().unwrap().is_none());
        assert!(dec.is_empty());
    }

    #[test]
    fn frame_split_across_pushes() {
        let bytes = chunk_frame(b"payload");
        let mut dec = FrameDecoder::new();

        for piece in bytes.chunks(5) {
            if let Some(frame) = dec.next_frame().unwrap() {
                panic!("frame completed early: {frame:?}");
            }
            dec.push(piece);
        }

        let frame = dec.next_frame().unwrap().expect("complete frame");
        assert_eq!(frame.payload, b"payload");
    }

    #[test]
    fn two_frames_in_one_push() {
        let mut bytes = chunk_frame(b"one");
        bytes.extend(chunk_frame(b"two"));
        let mut dec = FrameDecoder::new();
        dec.push(&bytes);

        assert_eq!(dec.next_frame().unwrap().unwrap().payload, b"one");
        assert_eq!(dec.next_frame().unwrap().unwrap().payload, b"two");
        assert!(dec.next_frame().unwrap().is_none());
    }

    #[test]
    fn corrupted_payload_fails_message_crc() {
        let mut bytes = chunk_frame(b"payload");
        let idx = bytes.len() - TRAILER_LEN - 1;
        bytes[idx] ^= 0xFF;
        let mut dec = FrameDecoder::new();
        dec.push(&bytes);

        let err = dec.next_frame().unwrap_err();
        assert!(err.to_string().contains("message checksum"));
    }

    #[test]
    fn corrupted_prelude_fails_fast() {
        let mut bytes = chunk_frame(b"payload");
        bytes[2] ^= 0x01;
        let mut dec = FrameDecoder::new();
        dec.push(&bytes[..PRELUDE_LEN]);

        let err = dec.next_frame().unwrap_err();
        assert!(err.to_string().contains("prelude checksum"));
    }

    #[test]
    fn typed_headers_survive() {
        let headers = [
            ("flag", HeaderValue::Bool(false)),
            ("b", HeaderValue::Byte(-3)),
            ("s", HeaderValue::Short(-300)),
            ("i", HeaderValue::Int(70_000)),
            ("l", HeaderValue::Long(-1)),
            ("raw", HeaderValue::Bytes(vec![0, 1, 2])),
            ("ts", HeaderValue::Timestamp(1_700_000_000_000)),
            ("id", HeaderValue::Uuid([7u8; 16])),
        ];
        let mut dec = FrameDecoder::new();
        dec.push(&encode_frame(&headers, b""));
        let frame = dec.next_frame().unwrap().unwrap();

        assert_eq!(frame.headers.len(), headers.len());
        assert_eq!(frame.header("s"), Some(&HeaderValue::Short(-300)));
        assert_eq!(frame.header("raw"), Some(&HeaderValue::Bytes(vec![0, 1, 2])));
        assert_eq!(frame.header("id"), Some(&HeaderValue::Uuid([7u8; 16])));
        assert!(frame.payload.is_empty());
        // Non-string header is not exposed as a string.
        assert_eq!(frame.header_str("i"), None);
    }

    #[test]
    fn unknown_header_type_is_rejected() {
        // name "x", type 42: the encoder can't produce this, so build it by hand.
        let header_bytes = [1u8, b'x', 42];
        let total_len = (MIN_FRAME_LEN + header_bytes.len()) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&total_len.to_be_bytes());
        bytes.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
        let prelude_crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&prelude_crc.to_be_bytes());
        bytes.extend_from_slice(&header_bytes);
        let message_crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&message_crc.to_be_bytes());

        let mut dec = FrameDecoder::new();
        dec.push(&bytes);
        let err = dec.next_frame().unwrap_err();
        assert!(err.to_string().contains("unknown type 42"));
    }
}

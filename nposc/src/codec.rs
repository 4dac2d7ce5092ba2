//! OSC 1.0 message encoding
//!
//! A message is laid out as:
//!
//! ```text
//! address  : null terminated string, padded to 4 bytes
//! type tags: ',' + one char per argument, null terminated, padded to 4 bytes
//! arguments: i = big-endian i32, f = big-endian f32, s = padded string,
//!            T / F = no payload
//! ```
//!
//! Bundles are not supported.

use crate::error::{OscError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
    Bool(bool),
}

impl OscArg {
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if !address.starts_with('/') || address.contains('\0') {
            return Err(OscError::BadAddress(address));
        }
        Ok(Self {
            address,
            args: Vec::new(),
        })
    }

    pub fn arg(mut self, arg: OscArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());

        put_padded_str(&mut buf, &self.address);

        let tags: String = std::iter::once(',')
            .chain(self.args.iter().map(OscArg::type_tag))
            .collect();
        put_padded_str(&mut buf, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => buf.put_i32(*v),
                OscArg::Float(v) => buf.put_f32(*v),
                OscArg::Str(s) => put_padded_str(&mut buf, s),
                OscArg::Bool(_) => {}
            }
        }

        buf.freeze()
    }

    pub fn decode(packet: &[u8]) -> Result<Self> {
        let mut buf = packet;

        let address = get_padded_str(&mut buf)?;
        if !address.starts_with('/') {
            return Err(OscError::BadAddress(address));
        }

        // A message without a type tag string carries no arguments
        if !buf.has_remaining() {
            return Ok(Self {
                address,
                args: Vec::new(),
            });
        }

        let tags = get_padded_str(&mut buf)?;
        let Some(tags) = tags.strip_prefix(',') else {
            return Err(OscError::InvalidString);
        };

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                'i' => {
                    ensure_remaining(buf, 4)?;
                    OscArg::Int(buf.get_i32())
                }
                'f' => {
                    ensure_remaining(buf, 4)?;
                    OscArg::Float(buf.get_f32())
                }
                's' => OscArg::Str(get_padded_str(&mut buf)?),
                'T' => OscArg::Bool(true),
                'F' => OscArg::Bool(false),
                other => return Err(OscError::UnsupportedTag(other)),
            };
            args.push(arg);
        }

        Ok(Self { address, args })
    }

    fn encoded_len(&self) -> usize {
        let mut len = padded_len(self.address.len()) + padded_len(self.args.len() + 1);
        for arg in &self.args {
            len += match arg {
                OscArg::Int(_) | OscArg::Float(_) => 4,
                OscArg::Str(s) => padded_len(s.len()),
                OscArg::Bool(_) => 0,
            };
        }
        len
    }
}

/// Size of a string plus its terminator, rounded up to 4
fn padded_len(len: usize) -> usize {
    (len + 4) & !3
}

fn put_padded_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    let padding = padded_len(s.len()) - s.len();
    buf.put_bytes(0, padding);
}

fn get_padded_str(buf: &mut &[u8]) -> Result<String> {
    let Some(end) = buf.iter().position(|b| *b == 0) else {
        return Err(OscError::Truncated);
    };
    let s = std::str::from_utf8(&buf[..end])
        .map_err(|_| OscError::InvalidString)?
        .to_string();

    let consumed = padded_len(end);
    ensure_remaining(buf, consumed)?;
    buf.advance(consumed);
    Ok(s)
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        Err(OscError::Truncated)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 4);
        assert_eq!(padded_len(3), 4);
        assert_eq!(padded_len(4), 8);
        assert_eq!(padded_len(15), 16);
    }

    #[test]
    fn test_typing_indicator_bytes() {
        let message = OscMessage::new("/chatbox/typing")
            .unwrap()
            .arg(OscArg::Int(1));
        let bytes = message.encode();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"/chatbox/typing\0");
        expected.extend_from_slice(b",i\0\0");
        expected.extend_from_slice(&[0, 0, 0, 1]);
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_chatbox_input_layout() {
        let message = OscMessage::new("/chatbox/input")
            .unwrap()
            .arg(OscArg::Str("hi".into()))
            .arg(OscArg::Int(1))
            .arg(OscArg::Bool(false));
        let bytes = message.encode();

        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(bytes.len(), message.encoded_len());
        assert_eq!(&bytes[..16], b"/chatbox/input\0\0");
        assert_eq!(&bytes[16..24], b",siF\0\0\0\0");
        assert_eq!(&bytes[24..28], b"hi\0\0");
        assert_eq!(&bytes[28..32], &[0, 0, 0, 1]);

        assert_eq!(OscMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_utf8_string_is_padded_by_bytes() {
        let message = OscMessage::new("/a")
            .unwrap()
            .arg(OscArg::Str("é".into()));
        let bytes = message.encode();
        // "é" is two bytes, plus terminator and one pad byte
        assert_eq!(&bytes[8..12], &[0xc3, 0xa9, 0, 0]);
        assert_eq!(OscMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            OscMessage::new("chatbox"),
            Err(OscError::BadAddress(_))
        ));
        assert!(matches!(
            OscMessage::decode(b"/abc"),
            Err(OscError::Truncated)
        ));
        assert!(matches!(
            OscMessage::decode(b"/ab\0,i\0\0\0\0"),
            Err(OscError::Truncated)
        ));
        assert!(matches!(
            OscMessage::decode(b"/ab\0,b\0\0"),
            Err(OscError::UnsupportedTag('b'))
        ));
    }
}

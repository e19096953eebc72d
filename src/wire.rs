/***************************************************************************************************
 * Copyright (c) 2021 Jeremy O'Donoghue. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * CBOR Wire Codec
 *
 * Low-level read/write of CBOR's "initial byte + argument" framing (§4.1). This is the only part
 * of the core that touches the byte stream directly; `Encoder` and `Decoder` are built on top of
 * it and never poke at raw bytes themselves.
 **************************************************************************************************/
use crate::constants::*;
use crate::error::{CborError, Result};

/// Decoded form of a CBOR initial byte's argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    Value(u64),
    Indefinite,
}

/// Write a byte sequence to some sink. Implemented for `Vec<u8>` for in-memory encoding; a host
/// may implement it over a socket or file to stream the output directly.
pub trait ByteSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Read exactly `n` bytes from some source, or fail with `UnexpectedEof`.
pub trait ByteSource {
    fn read(&mut self, n: usize) -> Result<Vec<u8>>;
    /// Number of bytes left, when known; used only for error reporting.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

/// A `ByteSource` over an in-memory slice, with a cursor. The usual way to decode a buffer that
/// is already fully in memory.
pub struct SliceSource<'buf> {
    bytes: &'buf [u8],
    index: usize,
}

impl<'buf> SliceSource<'buf> {
    pub fn new(bytes: &'buf [u8]) -> Self {
        SliceSource { bytes, index: 0 }
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index >= self.bytes.len()
    }
}

impl<'buf> ByteSource for SliceSource<'buf> {
    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let available = self.bytes.len() - self.index;
        if n > available {
            return Err(CborError::UnexpectedEof {
                needed: n,
                available,
            });
        }
        let out = self.bytes[self.index..self.index + n].to_vec();
        self.index += n;
        Ok(out)
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.bytes.len() - self.index)
    }
}

/// Write `major | argument` to `sink`, choosing the shortest encoding for `argument` (immediate
/// if < 24; otherwise the narrowest of the 1/2/4/8-byte big-endian forms). `major` must already
/// be shifted into the top 3 bits (one of the `MT_*` constants).
pub fn write_head(sink: &mut dyn ByteSink, major: u8, argument: u64) -> Result<()> {
    if argument <= PAYLOAD_AI_BITS as u64 {
        sink.write(&[major | argument as u8])
    } else if argument <= u8::MAX as u64 {
        sink.write(&[major | PAYLOAD_ONE_BYTE, argument as u8])
    } else if argument <= u16::MAX as u64 {
        let mut buf = vec![major | PAYLOAD_TWO_BYTES];
        buf.extend_from_slice(&(argument as u16).to_be_bytes());
        sink.write(&buf)
    } else if argument <= u32::MAX as u64 {
        let mut buf = vec![major | PAYLOAD_FOUR_BYTES];
        buf.extend_from_slice(&(argument as u32).to_be_bytes());
        sink.write(&buf)
    } else {
        let mut buf = vec![major | PAYLOAD_EIGHT_BYTES];
        buf.extend_from_slice(&argument.to_be_bytes());
        sink.write(&buf)
    }
}

/// Write `major | additional_info` as a single literal byte, with no minimal-encoding selection.
/// For the fixed-width subtypes (floats, extended simple values) where the additional-info value
/// itself is the wire format, not an argument to be compacted.
pub fn write_literal_head(sink: &mut dyn ByteSink, major: u8, additional_info: u8) -> Result<()> {
    sink.write(&[major | additional_info])
}

/// Write the initial byte for an indefinite-length item (majors 2..5 only).
pub fn write_indefinite_head(sink: &mut dyn ByteSink, major: u8) -> Result<()> {
    sink.write(&[major | PAYLOAD_INDEFINITE])
}

pub fn write_break(sink: &mut dyn ByteSink) -> Result<()> {
    sink.write(&[MT_SIMPLE | PAYLOAD_INDEFINITE])
}

pub fn write_bytes(sink: &mut dyn ByteSink, bytes: &[u8]) -> Result<()> {
    sink.write(bytes)
}

/// Read one initial byte and split it into `(major, subtype)`. `major` is left shifted into bits
/// 5-7, matching the `MT_*` constants, so callers can match directly on it.
pub fn read_head(source: &mut dyn ByteSource) -> Result<(u8, u8)> {
    let byte = source.read(1)?[0];
    Ok((byte & MT_MASK, byte & AI_MASK))
}

/// Decode the argument that follows a subtype byte. Subtypes 28-30 are reserved and rejected.
pub fn read_argument(source: &mut dyn ByteSource, subtype: u8) -> Result<Argument> {
    match subtype {
        0..=23 => Ok(Argument::Value(subtype as u64)),
        24 => {
            let b = source.read(1)?;
            Ok(Argument::Value(b[0] as u64))
        }
        25 => {
            let b = source.read(2)?;
            Ok(Argument::Value(u16::from_be_bytes([b[0], b[1]]) as u64))
        }
        26 => {
            let b = source.read(4)?;
            Ok(Argument::Value(u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64))
        }
        27 => {
            let b = source.read(8)?;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&b);
            Ok(Argument::Value(u64::from_be_bytes(arr)))
        }
        31 => Ok(Argument::Indefinite),
        _ => Err(CborError::MalformedInput("reserved additional-information value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_head(major: u8, arg: u64, expect: &[u8]) {
        let mut buf = Vec::new();
        write_head(&mut buf, major, arg).unwrap();
        assert_eq!(buf, expect);

        let mut src = SliceSource::new(&buf);
        let (m, subtype) = read_head(&mut src).unwrap();
        assert_eq!(m, major);
        let parsed = match read_argument(&mut src, subtype).unwrap() {
            Argument::Value(v) => v,
            Argument::Indefinite => panic!("unexpected indefinite"),
        };
        assert_eq!(parsed, arg);
    }

    #[test]
    fn minimal_head_encodings() {
        roundtrip_head(MT_UINT, 0, &[0x00]);
        roundtrip_head(MT_UINT, 23, &[0x17]);
        roundtrip_head(MT_UINT, 24, &[0x18, 0x18]);
        roundtrip_head(MT_UINT, 255, &[0x18, 0xff]);
        roundtrip_head(MT_UINT, 256, &[0x19, 0x01, 0x00]);
        roundtrip_head(MT_UINT, 65536, &[0x1a, 0x00, 0x01, 0x00, 0x00]);
        roundtrip_head(MT_UINT, u64::MAX, &[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn reserved_subtype_is_malformed() {
        let mut src = SliceSource::new(&[0x1c]);
        let (_, subtype) = read_head(&mut src).unwrap();
        assert!(read_argument(&mut src, subtype).is_err());
    }

    #[test]
    fn short_stream_reports_requested_and_available() {
        let mut src = SliceSource::new(&[0x19, 0x01]);
        let (_, subtype) = read_head(&mut src).unwrap();
        match read_argument(&mut src, subtype) {
            Err(CborError::UnexpectedEof { needed, available }) => {
                assert_eq!(needed, 2);
                assert_eq!(available, 1);
            }
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }
}

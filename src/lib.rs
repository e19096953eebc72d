/***************************************************************************************************
 * Copyright (c) 2021, 2022 Qualcomm Innovation Center, Inc. All rights reserved.
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
//! A bidirectional CBOR (RFC 7049 / RFC 8949) codec core.
//!
//! Four cooperating pieces, matching the module layout directly:
//!
//! - [`wire`] — the byte-level "initial byte + argument" framing.
//! - [`encode`] — traverses a value graph and emits CBOR bytes.
//! - [`decode`] — reads CBOR bytes and reconstructs a value graph.
//! - [`tag`] — well-known semantic tags (datetime, bignum, UUID, regexp, ...).
//!
//! [`value`] holds the in-memory value domain both sides operate on; [`sharing`] holds the
//! value-sharing/cycle bookkeeping that `encode` and `decode` each need their own half of;
//! [`registry`] is the escape hatch for host types beyond the built-in [`value::Value`] variants.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod error;
pub mod registry;
pub mod sharing;
pub mod tag;
pub mod value;
pub mod wire;

pub use decode::{DecodeOptions, Decoder, StrErrors};
pub use encode::{EncodeOptions, Encoder, EncodingStyle};
#[cfg(feature = "chrono_tags")]
pub use encode::TimestampFormat;
pub use error::{CborError, Result};
pub use value::{Link, Value};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Encode `value` to a new byte vector using default options.
pub fn to_vec(value: &Link) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    Encoder::new(EncodeOptions::default()).encode(value, &mut buf)?;
    Ok(buf)
}

/// Decode the single top-level CBOR item in `bytes` using default options.
pub fn from_slice(bytes: &[u8]) -> Result<Link> {
    let mut source = wire::SliceSource::new(bytes);
    Decoder::new(DecodeOptions::default()).decode(&mut source)
}

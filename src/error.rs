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
/***************************************************************************************************
 * rs_cbor Error API
 *
 * Error kinds for the CBOR codec core: malformed wire input, stream failures, and the encoder-side
 * failures (unencodable types, cycle detection, recursion limits).
 **************************************************************************************************/
use std::io;
use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, CborError>;

/// `CborError` describes everything that can go wrong encoding a value graph to CBOR or decoding
/// a CBOR byte stream back into one.
#[derive(Error, Debug)]
pub enum CborError {
    #[error("buffer insufficient to process the next item: needed {needed}, had {available}")]
    UnexpectedEof { needed: usize, available: usize },

    #[error("malformed CBOR input: {0}")]
    MalformedInput(&'static str),

    #[error("indefinite-length chunk had the wrong major type")]
    BadIndefiniteChunk,

    #[error("break byte (0xFF) encountered outside an open indefinite-length item")]
    UnexpectedBreak,

    #[error("a tstr contains an invalid UTF-8 sequence")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("no handler registered to encode this value, and no default handler configured")]
    UnencodableType,

    #[error("value re-entered during encoding without value sharing enabled (cycle detected)")]
    CycleDetected,

    #[error("naive datetime encountered with no default timezone configured")]
    NaiveDatetime,

    #[error("shared reference (tag 29) pointed at an index that is out of range or not yet populated")]
    UnresolvedSharedReference,

    #[error("recursion limit ({0}) exceeded")]
    RecursionLimit(usize),

    #[error("integer {0} is out of the representable range for the requested conversion")]
    OutOfRange(String),

    #[error("value is of incompatible type for the requested conversion")]
    IncompatibleType,

    #[error("resource limit exceeded: length {0} is not representable on this host")]
    ResourceLimit(usize),

    #[error("tag {tag} requires a {expected} payload")]
    TagPayloadMismatch { tag: u64, expected: &'static str },

    #[error("stream error: {0}")]
    Stream(#[from] io::Error),
}

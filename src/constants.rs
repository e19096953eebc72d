/***************************************************************************************************
 * Copyright (c) 2020-2022 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * rs_cbor CBOR constants
 **************************************************************************************************/
/// Additional Information bitmask
pub const AI_MASK: u8 = 0b000_11111;
pub const MT_MASK: u8 = 0b111_00000;

/// Major Type 0 (Positive integers)
pub const MT_UINT: u8 = 0b000_00000;
/// Major Type 1 (Negative integers)
pub const MT_NINT: u8 = 0b001_00000;
/// Major Type 2 (Byte Strings)
pub const MT_BSTR: u8 = 0b010_00000;
/// Major Type 3 (Text Strings)
pub const MT_TSTR: u8 = 0b011_00000;
/// Major Type 4 (Array)
pub const MT_ARRAY: u8 = 0b100_00000;
/// Major Type 5 (Map)
pub const MT_MAP: u8 = 0b101_00000;
/// Major Type 6 (Tag)
pub const MT_TAG: u8 = 0b110_00000;
/// Major Type 7 (Floats, simple types etc.)
pub const MT_SIMPLE: u8 = 0b111_00000;

/// Maximum value of a "simple" payload mapped on AI bits
pub const PAYLOAD_AI_BITS: u8 = 23;
/// One byte of length/value information follows MT/AI byte
pub const PAYLOAD_ONE_BYTE: u8 = 24;
/// Two bytes of length/value information follow MT/AI byte
pub const PAYLOAD_TWO_BYTES: u8 = 25;
/// Four bytes of length/value information follow MT/AI byte
pub const PAYLOAD_FOUR_BYTES: u8 = 26;
/// Eight bytes of length/value information follow MT/AI byte
pub const PAYLOAD_EIGHT_BYTES: u8 = 27;
/// An indefinite number of chunks/items follow, terminated by `BREAK`
pub const PAYLOAD_INDEFINITE: u8 = 31;

/// Simple value constants (major type 7, AI 20-23 and the extended 8-bit form)
pub mod simple {
    pub const FALSE: u8 = 20;
    pub const TRUE: u8 = 21;
    pub const NULL: u8 = 22;
    pub const UNDEFINED: u8 = 23;
    pub const RESERVED_START: u8 = 24;
    pub const RESERVED_END: u8 = 31;
    pub const FLOAT16: u8 = 25;
    pub const FLOAT32: u8 = 26;
    pub const FLOAT64: u8 = 27;
    pub const BREAK: u8 = 31;
}

/// Well-known semantic tags (major type 6). See `crate::tag` for encode/decode rules.
pub mod tag {
    pub const DATETIME_TEXT: u64 = 0;
    pub const DATETIME_EPOCH: u64 = 1;
    pub const BIGNUM_POS: u64 = 2;
    pub const BIGNUM_NEG: u64 = 3;
    pub const DECIMAL_FRACTION: u64 = 4;
    pub const BIGFLOAT: u64 = 5;
    pub const SHAREABLE: u64 = 28;
    pub const SHARED_REF: u64 = 29;
    pub const RATIONAL: u64 = 30;
    pub const REGEXP: u64 = 35;
    pub const MIME: u64 = 36;
    pub const UUID: u64 = 37;
    pub const SET: u64 = 258;
    pub const IP_ADDRESS: u64 = 260;
    pub const IP_NETWORK: u64 = 261;
}

/// Default ceiling on encode/decode recursion depth (see design notes, §9).
pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

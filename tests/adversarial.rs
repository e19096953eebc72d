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
 * Adversarial and malformed-input test cases (§7)
 **************************************************************************************************/

use rs_cbor::wire::SliceSource;
use rs_cbor::{from_slice, CborError, DecodeOptions, Decoder};

#[test]
fn break_outside_any_indefinite_frame_is_rejected() {
    assert!(matches!(from_slice(&[0xFF]), Err(CborError::UnexpectedBreak)));
}

#[test]
fn reserved_additional_info_subtype_is_malformed() {
    // Major type 0 (uint), additional info 28 — reserved, never assigned a meaning.
    assert!(matches!(from_slice(&[0x1C]), Err(CborError::MalformedInput(_))));
}

#[test]
fn truncated_stream_reports_unexpected_eof() {
    // Claims a 4-byte argument but supplies none.
    assert!(matches!(from_slice(&[0x1a]), Err(CborError::UnexpectedEof { .. })));
}

#[test]
fn indefinite_text_string_chunk_of_wrong_major_type_is_rejected() {
    // 0x7F (indefinite tstr) followed by a definite bstr chunk instead of a tstr chunk.
    assert!(matches!(from_slice(&[0x7F, 0x41, 0x01, 0xFF]), Err(CborError::BadIndefiniteChunk)));
}

#[test]
fn invalid_utf8_under_strict_mode_is_rejected() {
    let mut source = SliceSource::new(&[0x61, 0xFF]);
    let result = Decoder::new(DecodeOptions::default()).decode(&mut source);
    assert!(matches!(result, Err(CborError::Utf8Error(_))));
}

#[test]
fn invalid_utf8_under_replace_mode_substitutes() {
    let mut source = SliceSource::new(&[0x61, 0xFF]);
    let options = DecodeOptions { str_errors: rs_cbor::StrErrors::Replace, ..DecodeOptions::default() };
    let decoded = Decoder::new(options).decode(&mut source).unwrap();
    assert_eq!(decoded.borrow().as_text(), Some("\u{FFFD}"));
}

#[test]
fn unresolvable_shared_reference_is_rejected() {
    // tag 29 pointing at index 3, with nothing ever reserved.
    assert!(matches!(from_slice(&[0xd8, 0x1d, 0x03]), Err(CborError::UnresolvedSharedReference)));
}

#[test]
fn set_tag_over_a_non_array_inner_is_rejected() {
    // tag 258 wrapping a plain uint instead of an array.
    assert!(matches!(from_slice(&[0xd9, 0x01, 0x02, 0x01]), Err(CborError::MalformedInput(_))));
}

#[test]
fn bignum_tag_over_a_non_bytes_inner_is_rejected() {
    // tag 2 (positive bignum) wrapping a uint instead of a bstr.
    assert!(matches!(from_slice(&[0xc2, 0x01]), Err(CborError::TagPayloadMismatch { .. })));
}

#[test]
fn self_reference_to_a_bare_placeholder_scalar_is_rejected() {
    // tag 28 wrapping tag 29/0 — a self-reference to its own slot before anything ever
    // populates it. Unlike arrays/maps, a bare tag-28 body has no empty-shape intermediate to
    // land on, so this can never resolve.
    assert!(matches!(from_slice(&[0xd8, 0x1c, 0xd8, 0x1d, 0x00]), Err(CborError::UnresolvedSharedReference)));
}

#[test]
fn reserved_simple_value_range_is_rejected_on_decode() {
    // Major 7, additional info 24 (one extra byte follows), byte value 31 — within the
    // spec-reserved 20..31 range, so never a legal simple value.
    assert!(matches!(from_slice(&[0xf8, 0x1f]), Err(CborError::MalformedInput(_))));
}

#[test]
fn recursion_limit_is_enforced_on_decode() {
    // 200 nested single-element indefinite arrays, with a recursion ceiling of 10.
    let mut bytes = vec![0x9f; 200];
    bytes.push(0x00);
    bytes.extend(std::iter::repeat_n(0xff, 200));
    let mut source = SliceSource::new(&bytes);
    let options = DecodeOptions { recursion_limit: 10, ..DecodeOptions::default() };
    let result = Decoder::new(options).decode(&mut source);
    assert!(matches!(result, Err(CborError::RecursionLimit(10))));
}

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
 * Test cases from RFC8949, for encoding
 **************************************************************************************************/

use num_bigint::BigInt;
use rs_cbor::{to_vec, CborError, EncodeOptions, Encoder, EncodingStyle, Value};

fn encode(v: Value) -> Vec<u8> {
    to_vec(&v.link()).unwrap()
}

fn encode_canonical(v: Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    Encoder::new(EncodeOptions { enc_style: EncodingStyle::Canonical, ..EncodeOptions::default() })
        .encode(&v.link(), &mut bytes)
        .unwrap();
    bytes
}

#[test]
fn rfc8949_encode_small_integers() {
    // Table 4: minimal-head selection for integers of increasing magnitude.
    assert_eq!(encode(Value::int(0)), vec![0x00]);
    assert_eq!(encode(Value::int(23)), vec![0x17]);
    assert_eq!(encode(Value::int(24)), vec![0x18, 0x18]);
    assert_eq!(encode(Value::int(-1)), vec![0x20]);
    assert_eq!(encode(Value::int(-100)), vec![0x38, 0x63]);
    assert_eq!(encode(Value::int(1000)), vec![0x19, 0x03, 0xe8]);
}

#[test]
fn rfc8949_encode_array_of_ints() {
    let v = Value::array(vec![Value::int(1).link(), Value::int(2).link(), Value::int(3).link()]);
    assert_eq!(encode(v), vec![0x83, 0x01, 0x02, 0x03]);
}

#[test]
fn rfc8949_encode_text_and_bytes() {
    assert_eq!(encode(Value::text("IETF")), vec![0x64, b'I', b'E', b'T', b'F']);
    assert_eq!(encode(Value::Bytes(vec![0x01, 0x02, 0x03, 0x04])), vec![0x44, 0x01, 0x02, 0x03, 0x04]);
    assert_eq!(encode(Value::text("")), vec![0x60]);
}

#[test]
fn rfc8949_encode_simple_values() {
    assert_eq!(encode(Value::Bool(false)), vec![0xf4]);
    assert_eq!(encode(Value::Bool(true)), vec![0xf5]);
    assert_eq!(encode(Value::Null), vec![0xf6]);
    assert_eq!(encode(Value::Undefined), vec![0xf7]);
}

#[test]
fn canonical_map_sorts_keys_by_encoded_bytes() {
    // Scenario 3: the empty text key sorts before "a", which sorts before "b".
    let v = Value::map(vec![
        (Value::text("a").link(), Value::int(1).link()),
        (Value::text("b").link(), Value::int(2).link()),
        (Value::text("").link(), Value::int(3).link()),
    ]);
    let expected: Vec<u8> = vec![0xA3, 0x60, 0x03, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02];
    assert_eq!(encode_canonical(v), expected);
}

#[test]
fn reserved_simple_value_range_is_rejected_on_encode() {
    // 20..31 is reserved (20..23 for false/true/null/undefined, 24..31 unassigned).
    for v in [20u8, 23, 24, 31] {
        assert!(matches!(encode_checked(Value::Simple(v)), Err(CborError::MalformedInput(_))));
    }
    // 32 is the first legal extended simple value.
    assert_eq!(encode(Value::Simple(32)), vec![0xf8, 0x20]);
}

fn encode_checked(v: Value) -> Result<Vec<u8>, CborError> {
    let mut bytes = Vec::new();
    Encoder::new(EncodeOptions::default()).encode(&v.link(), &mut bytes)?;
    Ok(bytes)
}

#[cfg(feature = "float")]
#[test]
fn nan_and_infinity_use_the_canonical_half_form_even_in_regular_mode() {
    // §4.2 "Float (non-canonical)": NaN/infinity aren't subject to minimal-width selection like
    // other floats, but they're still special-cased to half-precision outside canonical mode.
    assert_eq!(encode(Value::F64(f64::NAN)), vec![0xf9, 0x7e, 0x00]);
    assert_eq!(encode(Value::F64(f64::INFINITY)), vec![0xf9, 0x7c, 0x00]);
    assert_eq!(encode(Value::F64(f64::NEG_INFINITY)), vec![0xf9, 0xfc, 0x00]);
    assert_eq!(encode(Value::F32(f32::NAN)), vec![0xf9, 0x7e, 0x00]);
}

#[cfg(feature = "chrono_tags")]
#[test]
fn datetime_encodes_per_configured_timestamp_format() {
    let dt = chrono::DateTime::parse_from_rfc3339("2013-03-21T20:04:00Z").unwrap();

    let mut iso_bytes = Vec::new();
    Encoder::new(EncodeOptions::default()).encode_datetime(&dt, &mut iso_bytes).unwrap();
    assert_eq!(iso_bytes[0], 0xC0); // tag 0

    let mut numeric_bytes = Vec::new();
    let options = EncodeOptions {
        timestamp_format: rs_cbor::TimestampFormat::Numeric,
        ..EncodeOptions::default()
    };
    Encoder::new(options).encode_datetime(&dt, &mut numeric_bytes).unwrap();
    assert_eq!(numeric_bytes[0], 0xC1); // tag 1
}

#[cfg(feature = "chrono_tags")]
#[test]
fn naive_datetime_without_a_configured_timezone_fails() {
    let naive = chrono::NaiveDate::from_ymd_opt(2013, 3, 21)
        .unwrap()
        .and_hms_opt(20, 4, 0)
        .unwrap();
    let mut bytes = Vec::new();
    let result = Encoder::new(EncodeOptions::default()).encode_naive_datetime(&naive, &mut bytes);
    assert!(matches!(result, Err(CborError::NaiveDatetime)));
}

#[test]
fn unmatched_host_type_without_a_default_handler_is_unencodable() {
    struct Celsius(f64);
    let mut bytes = Vec::new();
    let result = Encoder::new(EncodeOptions::default()).encode_host(&Celsius(21.0), &mut bytes);
    assert!(matches!(result, Err(CborError::UnencodableType)));
}

#[test]
fn host_type_encodes_via_a_registered_default_handler() {
    struct Celsius(f64);
    let mut registry = rs_cbor::registry::Registry::new();
    registry.set_default_handler(|_| Some(Value::int(0)));
    let mut bytes = Vec::new();
    Encoder::new_with_registry(EncodeOptions::default(), registry)
        .encode_host(&Celsius(21.0), &mut bytes)
        .unwrap();
    assert_eq!(bytes, vec![0x00]);
}

#[test]
fn canonical_bignum_range_completeness() {
    // Scenario / quantified invariant: tag 2/3 kicks in only once |v| exceeds the
    // single-head-representable range (u64::MAX for positive, -(u64::MAX)-1 for negative).
    let at_boundary = Value::Int(BigInt::parse_bytes(b"18446744073709551615", 10).unwrap()); // u64::MAX
    let mut bytes = Vec::new();
    Encoder::new(EncodeOptions::default()).encode(&at_boundary.link(), &mut bytes).unwrap();
    assert_eq!(bytes[0], 0x1b); // major 0, 8-byte argument, no tag wrapper

    let over_boundary = Value::Int(BigInt::parse_bytes(b"18446744073709551616", 10).unwrap()); // u64::MAX + 1
    let mut bytes = Vec::new();
    Encoder::new(EncodeOptions::default()).encode(&over_boundary.link(), &mut bytes).unwrap();
    assert_eq!(bytes[0], 0xc2); // tag 2 (positive bignum)
}

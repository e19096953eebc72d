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
 * Tag & Simple-Value Registry (§4.4)
 *
 * Well-known semantic tags live here as free functions rather than a runtime-keyed table: the
 * wire-level dispatch on tag number happens once, in `decode.rs`/`encode.rs`, and each well-known
 * tag gets its own decode/encode pair. Unknown tags fall through to a plain `(tag, inner)` wrap,
 * handled directly by the caller.
 **************************************************************************************************/
use num_bigint::{BigInt, Sign};

use crate::constants::tag::*;
use crate::error::{CborError, Result};
use crate::value::{Link, Value};

/// Tag 2/3: big integer from a big-endian byte string. `negative` selects `-1 - magnitude`.
pub fn bignum_from_bytes(bytes: &[u8], negative: bool) -> Value {
    let magnitude = BigInt::from_bytes_be(Sign::Plus, bytes);
    let v = if negative { -BigInt::from(1) - magnitude } else { magnitude };
    Value::Int(v)
}

/// Tag 2/3: minimal big-endian bytes of `|v|`, and which of the two tags applies.
pub fn bignum_to_bytes(v: &BigInt) -> (u64, Vec<u8>) {
    if v.sign() == Sign::Minus {
        let magnitude = -(v + BigInt::from(1));
        (BIGNUM_NEG, magnitude.to_bytes_be().1)
    } else {
        (BIGNUM_POS, v.to_bytes_be().1)
    }
}

/// Tag 0: strict ISO-8601 text, parsed via the grammar `YYYY-MM-DDTHH:MM:SS(.FFF*)?(Z|±HH:MM)`.
#[cfg(feature = "chrono_tags")]
pub fn parse_iso8601(text: &str) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc3339(text)
        .map_err(|_| CborError::MalformedInput("tag 0 payload is not a valid ISO-8601 datetime"))
}

/// Tag 0: render with `+00:00` replaced by `Z`, matching the common CBOR diagnostic convention.
#[cfg(feature = "chrono_tags")]
pub fn render_iso8601(dt: &chrono::DateTime<chrono::FixedOffset>) -> String {
    let s = dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
    if let Some(stripped) = s.strip_suffix("+00:00") {
        format!("{}Z", stripped)
    } else {
        s
    }
}

/// Tag 1: numeric timestamp (integer seconds or float seconds) to UTC datetime.
#[cfg(feature = "chrono_tags")]
pub fn datetime_from_epoch_seconds(seconds: f64) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds.fract()) * 1_000_000_000.0).round() as u32;
    chrono::DateTime::from_timestamp(whole, nanos)
        .map(|dt| dt.with_timezone(&chrono::FixedOffset::east_opt(0).unwrap()))
        .ok_or(CborError::MalformedInput("tag 1 payload is out of the representable epoch range"))
}

/// Decimal fraction / big-float payload: `[exponent, mantissa]`, both arbitrary-precision
/// integers (§4.2, "Decimal fraction"/"Rational"). `base` is 10 for tag 4, 2 for tag 5.
pub fn decimal_value(inner: &[Link]) -> Result<(BigInt, BigInt)> {
    if inner.len() != 2 {
        return Err(CborError::TagPayloadMismatch {
            tag: DECIMAL_FRACTION,
            expected: "two-element array [exponent, mantissa]",
        });
    }
    let exponent = inner[0]
        .borrow()
        .as_int()
        .cloned()
        .ok_or(CborError::TagPayloadMismatch {
            tag: DECIMAL_FRACTION,
            expected: "integer exponent",
        })?;
    let mantissa = inner[1]
        .borrow()
        .as_int()
        .cloned()
        .ok_or(CborError::TagPayloadMismatch {
            tag: DECIMAL_FRACTION,
            expected: "integer mantissa",
        })?;
    Ok((exponent, mantissa))
}

pub fn decimal_pair_value(exponent: &BigInt, mantissa: &BigInt) -> Value {
    Value::array(vec![
        Value::Int(exponent.clone()).link(),
        Value::Int(mantissa.clone()).link(),
    ])
}

/// Tag 35: compiled regular expression, wrapping the pattern text.
pub fn regexp_from_pattern(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern)
        .map_err(|_| CborError::MalformedInput("tag 35 payload is not a valid regular expression"))
}

/// Tag 37: UUID from its 16-byte form.
pub fn uuid_from_bytes(bytes: &[u8]) -> Result<uuid::Uuid> {
    uuid::Uuid::from_slice(bytes)
        .map_err(|_| CborError::TagPayloadMismatch { tag: UUID, expected: "16-byte UUID" })
}

pub fn uuid_to_bytes(id: &uuid::Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Tag 260: IP address from its packed (4- or 16-byte) form.
pub fn ip_addr_from_bytes(bytes: &[u8]) -> Result<std::net::IpAddr> {
    match bytes.len() {
        4 => {
            let mut b = [0u8; 4];
            b.copy_from_slice(bytes);
            Ok(std::net::IpAddr::V4(std::net::Ipv4Addr::from(b)))
        }
        16 => {
            let mut b = [0u8; 16];
            b.copy_from_slice(bytes);
            Ok(std::net::IpAddr::V6(std::net::Ipv6Addr::from(b)))
        }
        _ => Err(CborError::TagPayloadMismatch { tag: IP_ADDRESS, expected: "4- or 16-byte address" }),
    }
}

pub fn ip_addr_to_bytes(addr: &std::net::IpAddr) -> Vec<u8> {
    match addr {
        std::net::IpAddr::V4(v4) => v4.octets().to_vec(),
        std::net::IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bignum_roundtrips_positive_and_negative() {
        let v = BigInt::parse_bytes(b"18446744073709551616", 10).unwrap(); // 2^64
        let (tag, bytes) = bignum_to_bytes(&v);
        assert_eq!(tag, BIGNUM_POS);
        assert_eq!(bignum_from_bytes(&bytes, false), Value::Int(v));

        let neg = -BigInt::parse_bytes(b"18446744073709551617", 10).unwrap(); // -(2^64 + 1)
        let (tag, bytes) = bignum_to_bytes(&neg);
        assert_eq!(tag, BIGNUM_NEG);
        assert_eq!(bignum_from_bytes(&bytes, true), Value::Int(neg));
    }

    #[test]
    fn uuid_bytes_roundtrip() {
        let id = uuid::Uuid::parse_str("f81d4fae-7dec-11d0-a765-00a0c91e6bf6").unwrap();
        let bytes = uuid_to_bytes(&id);
        assert_eq!(uuid_from_bytes(&bytes).unwrap(), id);
    }

    #[test]
    fn ip_address_bytes_roundtrip_v4_and_v6() {
        let v4: std::net::IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(ip_addr_from_bytes(&ip_addr_to_bytes(&v4)).unwrap(), v4);

        let v6: std::net::IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(ip_addr_from_bytes(&ip_addr_to_bytes(&v6)).unwrap(), v6);
    }

    #[cfg(feature = "chrono_tags")]
    #[test]
    fn iso8601_roundtrips_with_z_suffix() {
        let dt = parse_iso8601("2013-03-21T20:04:00Z").unwrap();
        assert_eq!(render_iso8601(&dt), "2013-03-21T20:04:00Z");
    }
}

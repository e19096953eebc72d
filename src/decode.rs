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
 * Decoder (§4.3)
 *
 * Reads CBOR items through the Wire Codec and reconstructs a value graph, threading the
 * `immutable` and `shared_index` context flags through recursion and maintaining the shareables
 * list (tag 28/29 protocol). The teacher's `tps_minicbor::decode::parse_item` dispatch-on-lead-
 * byte-range shape is kept; its zero-copy borrowed slices become owned `Value`s here, and the
 * indefinite-length forms it left as TODOs are implemented in full.
 **************************************************************************************************/
use num_bigint::BigInt;

use crate::constants::*;
use crate::error::{CborError, Result};
use crate::sharing::Shareables;
use crate::tag;
use crate::value::{Link, Value};
use crate::wire::{self, Argument, ByteSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrErrors {
    Strict,
    Replace,
}

/// Mirrors spec.md §6's configuration table, decoder-relevant subset.
pub struct DecodeOptions {
    pub str_errors: StrErrors,
    pub recursion_limit: usize,
    /// §4.3 Major 5: post-processes every decoded map.
    pub object_hook: Option<Box<dyn Fn(&Value) -> Value>>,
    /// §4.3 Major 6: post-processes the `(tag, inner)` wrapper of an unknown tag.
    pub tag_hook: Option<Box<dyn Fn(u64, &Value) -> Value>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            str_errors: StrErrors::Strict,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            object_hook: None,
            tag_hook: None,
        }
    }
}

/// No sharing slot is being populated by the value currently under construction.
const NO_SHARED_INDEX: usize = usize::MAX;

pub struct Decoder {
    options: DecodeOptions,
    shareables: Shareables,
    depth: usize,
    immutable: bool,
    shared_index: usize,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Decoder {
            options,
            shareables: Shareables::new(),
            depth: 0,
            immutable: false,
            shared_index: NO_SHARED_INDEX,
        }
    }

    /// Top-level entry point: reads exactly one CBOR item from `source`.
    pub fn decode(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        self.immutable = false;
        self.shared_index = NO_SHARED_INDEX;
        let result = self.decode_value(source);
        self.shareables = Shareables::new();
        self.depth = 0;
        result
    }

    /// Saves and restores `immutable`/`shared_index` around a single nested decode that must not
    /// itself be installed into a sharing slot — map keys, and the inner of tag 29 (§4.3).
    fn decode_unshared(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let saved = self.shared_index;
        self.shared_index = NO_SHARED_INDEX;
        let result = self.decode_value(source);
        self.shared_index = saved;
        result
    }

    fn decode_immutable_unshared(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let saved_immutable = self.immutable;
        let saved_index = self.shared_index;
        self.immutable = true;
        self.shared_index = NO_SHARED_INDEX;
        let result = self.decode_value(source);
        self.immutable = saved_immutable;
        self.shared_index = saved_index;
        result
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.recursion_limit {
            return Err(CborError::RecursionLimit(self.options.recursion_limit));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn decode_value(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        self.enter()?;
        let result = self.decode_item(source);
        self.exit();
        result
    }

    /// Install `value` into whatever sharing slot the current call was asked to populate, and
    /// return the `Link` that the rest of the graph should reference. If no slot was requested,
    /// a fresh `Link` is created directly.
    fn finish(&mut self, value: Value) -> Link {
        if self.shared_index != NO_SHARED_INDEX {
            self.shareables.populate(self.shared_index, value.clone());
            self.shareables.get(self.shared_index).unwrap_or_else(|_| value.link())
        } else {
            value.link()
        }
    }

    fn decode_item(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let (major, subtype) = wire::read_head(source)?;
        self.decode_item_from_head(source, major, subtype)
    }

    fn decode_item_from_head(&mut self, source: &mut dyn ByteSource, major: u8, subtype: u8) -> Result<Link> {
        match major {
            MT_UINT => self.decode_uint(source, subtype),
            MT_NINT => self.decode_nint(source, subtype),
            MT_BSTR => self.decode_bytestring(source, subtype),
            MT_TSTR => self.decode_textstring(source, subtype),
            MT_ARRAY => self.decode_array(source, subtype),
            MT_MAP => self.decode_map(source, subtype),
            MT_TAG => self.decode_tag(source, subtype),
            MT_SIMPLE => self.decode_simple(source, subtype),
            _ => unreachable!("major type is masked to 3 bits"),
        }
    }

    /// Reads one item for the body of an open indefinite array/map, or detects the closing
    /// break. There is no true peek on `ByteSource`, so this reads the head unconditionally and
    /// either recognizes it as `0xFF` (the only legal break encoding) or hands it straight to
    /// `decode_item_from_head` without re-reading it — the same recursion budget and sharing-slot
    /// bookkeeping as `decode_value`/`decode_immutable_unshared` apply either way, selected by
    /// `immutable`/`unshared`.
    fn decode_or_break(&mut self, source: &mut dyn ByteSource, immutable: bool, unshared: bool) -> Result<Option<Link>> {
        let saved_immutable = self.immutable;
        let saved_index = self.shared_index;
        if immutable {
            self.immutable = true;
        }
        if unshared {
            self.shared_index = NO_SHARED_INDEX;
        }
        self.enter()?;
        let (major, subtype) = wire::read_head(source)?;
        if major == MT_SIMPLE && subtype == simple::BREAK {
            self.exit();
            self.immutable = saved_immutable;
            self.shared_index = saved_index;
            return Ok(None);
        }
        let result = self.decode_item_from_head(source, major, subtype);
        self.exit();
        self.immutable = saved_immutable;
        self.shared_index = saved_index;
        result.map(Some)
    }

    fn decode_value_or_break(&mut self, source: &mut dyn ByteSource) -> Result<Option<Link>> {
        self.decode_or_break(source, false, false)
    }

    fn decode_uint(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        let arg = self.read_definite_argument(source, subtype)?;
        Ok(self.finish(Value::Int(BigInt::from(arg))))
    }

    fn decode_nint(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        let arg = self.read_definite_argument(source, subtype)?;
        Ok(self.finish(Value::Int(-BigInt::from(1) - BigInt::from(arg))))
    }

    fn read_definite_argument(&self, source: &mut dyn ByteSource, subtype: u8) -> Result<u64> {
        match wire::read_argument(source, subtype)? {
            Argument::Value(v) => Ok(v),
            Argument::Indefinite => Err(CborError::MalformedInput("integers cannot be indefinite-length")),
        }
    }

    fn decode_bytestring(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        match wire::read_argument(source, subtype)? {
            Argument::Value(len) => {
                let bytes = source.read(len as usize)?;
                Ok(self.finish(Value::Bytes(bytes)))
            }
            Argument::Indefinite => {
                let mut out = Vec::new();
                loop {
                    let (chunk_major, chunk_subtype) = wire::read_head(source)?;
                    if chunk_major == MT_SIMPLE && chunk_subtype == simple::BREAK {
                        break;
                    }
                    if chunk_major != MT_BSTR {
                        return Err(CborError::BadIndefiniteChunk);
                    }
                    match wire::read_argument(source, chunk_subtype)? {
                        Argument::Value(len) => out.extend(source.read(len as usize)?),
                        Argument::Indefinite => return Err(CborError::BadIndefiniteChunk),
                    }
                }
                Ok(self.finish(Value::Bytes(out)))
            }
        }
    }

    fn decode_textstring(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        match wire::read_argument(source, subtype)? {
            Argument::Value(len) => {
                let bytes = source.read(len as usize)?;
                let text = self.bytes_to_text(bytes)?;
                Ok(self.finish(Value::Text(text)))
            }
            Argument::Indefinite => {
                let mut out = String::new();
                loop {
                    let (chunk_major, chunk_subtype) = wire::read_head(source)?;
                    if chunk_major == MT_SIMPLE && chunk_subtype == simple::BREAK {
                        break;
                    }
                    if chunk_major != MT_TSTR {
                        return Err(CborError::BadIndefiniteChunk);
                    }
                    match wire::read_argument(source, chunk_subtype)? {
                        // Each chunk is itself a definite-length tstr, so UTF-8 validation
                        // happens per chunk: chunk boundaries can never split a code point,
                        // because each chunk is independently valid UTF-8 (§3, invariant 3).
                        Argument::Value(len) => {
                            let bytes = source.read(len as usize)?;
                            out.push_str(&self.bytes_to_text(bytes)?);
                        }
                        Argument::Indefinite => return Err(CborError::BadIndefiniteChunk),
                    }
                }
                Ok(self.finish(Value::Text(out)))
            }
        }
    }

    fn bytes_to_text(&self, bytes: Vec<u8>) -> Result<String> {
        match std::str::from_utf8(&bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(e) => match self.options.str_errors {
                StrErrors::Strict => Err(CborError::Utf8Error(e)),
                StrErrors::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            },
        }
    }

    /// Arrays and maps support a genuine forward self-reference (`A = [A]`, §4.3: "Container
    /// decoders set the placeholder to the new container before populating it"): the slot is
    /// overwritten with an empty container of the right shape immediately, so a tag-29 reference
    /// decoded from inside the body resolves to a real value instead of the raw placeholder. Sets
    /// and tag wrappers don't get this treatment (§4.3's stated exception) — a self-reference into
    /// one of those is rejected by `Shareables::get` as unresolved.
    fn prime_container(&mut self, slot: usize, shape: Value) {
        if slot != NO_SHARED_INDEX {
            self.shareables.populate(slot, shape);
        }
    }

    fn decode_array(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        let slot = self.reserve_slot();
        self.prime_container(slot, Value::Array(vec![]));
        let items = match wire::read_argument(source, subtype)? {
            Argument::Value(len) => {
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(self.decode_value(source)?);
                }
                items
            }
            Argument::Indefinite => {
                let mut items = Vec::new();
                while let Some(item) = self.decode_value_or_break(source)? {
                    items.push(item);
                }
                items
            }
        };
        Ok(self.install(slot, Value::Array(items)))
    }

    fn decode_map(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        let slot = self.reserve_slot();
        self.prime_container(slot, Value::Map(vec![]));
        let pairs = match wire::read_argument(source, subtype)? {
            Argument::Value(len) => {
                let mut pairs = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    let key = self.decode_immutable_unshared(source)?;
                    let value = self.decode_value(source)?;
                    pairs.push((key, value));
                }
                pairs
            }
            Argument::Indefinite => {
                let mut pairs = Vec::new();
                while let Some(key) = self.decode_or_break(source, true, true)? {
                    let value = self.decode_value(source)?;
                    pairs.push((key, value));
                }
                pairs
            }
        };
        let map_value = Value::Map(pairs);
        let map_value = match &self.options.object_hook {
            Some(hook) => hook(&map_value),
            None => map_value,
        };
        Ok(self.install(slot, map_value))
    }

    /// Container decoders reserve their shareables slot before decoding their body, so a
    /// recursive tag-29 reference inside that body resolves to the right `Link` (§4.3,
    /// "Shareables protocol"). `reserve_slot` hands the *outer* call's requested slot down by
    /// temporarily clearing `shared_index`, since the body's own elements must not claim it.
    fn reserve_slot(&mut self) -> usize {
        let requested = self.shared_index;
        self.shared_index = NO_SHARED_INDEX;
        requested
    }

    fn install(&mut self, slot: usize, value: Value) -> Link {
        if slot != NO_SHARED_INDEX {
            self.shareables.populate(slot, value);
            self.shareables.get(slot).unwrap_or_else(|_| Value::Null.link())
        } else {
            value.link()
        }
    }

    fn decode_tag(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        let tag_number = self.read_definite_argument(source, subtype)?;
        match tag_number {
            crate::constants::tag::DATETIME_TEXT => self.decode_datetime_text(source),
            crate::constants::tag::DATETIME_EPOCH => self.decode_datetime_epoch(source),
            crate::constants::tag::BIGNUM_POS => self.decode_bignum(source, false),
            crate::constants::tag::BIGNUM_NEG => self.decode_bignum(source, true),
            crate::constants::tag::DECIMAL_FRACTION | crate::constants::tag::BIGFLOAT => {
                self.decode_decimal_like(source, tag_number)
            }
            crate::constants::tag::SHAREABLE => self.decode_shareable(source),
            crate::constants::tag::SHARED_REF => self.decode_shared_ref(source),
            crate::constants::tag::RATIONAL => self.decode_tag_wrapped(source, tag_number),
            crate::constants::tag::REGEXP => self.decode_regexp(source),
            crate::constants::tag::MIME => self.decode_tag_wrapped(source, tag_number),
            crate::constants::tag::UUID => self.decode_uuid(source),
            crate::constants::tag::SET => self.decode_set(source),
            crate::constants::tag::IP_ADDRESS => self.decode_ip_address(source),
            crate::constants::tag::IP_NETWORK => self.decode_tag_wrapped(source, tag_number),
            _ => self.decode_tag_unknown(source, tag_number),
        }
    }

    fn decode_tag_wrapped(&mut self, source: &mut dyn ByteSource, tag_number: u64) -> Result<Link> {
        let slot = self.reserve_slot();
        let inner = self.decode_value(source)?;
        Ok(self.install(slot, Value::Tag(tag_number, inner)))
    }

    /// §4.3 Major 6: "for unknown tags, decode the inner value and wrap it; if a `tag_hook` is
    /// configured, pass the wrapper through it." Tags handled elsewhere in `decode_tag` (including
    /// the generic wrap used for RATIONAL/MIME/IP_NETWORK) are "known" and don't go through the
    /// hook.
    fn decode_tag_unknown(&mut self, source: &mut dyn ByteSource, tag_number: u64) -> Result<Link> {
        let slot = self.reserve_slot();
        let inner = self.decode_value(source)?;
        let wrapped = Value::Tag(tag_number, inner);
        let wrapped = match &self.options.tag_hook {
            Some(hook) => hook(tag_number, &wrapped),
            None => wrapped,
        };
        Ok(self.install(slot, wrapped))
    }

    #[cfg(feature = "chrono_tags")]
    fn decode_datetime_text(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let text = inner
            .borrow()
            .as_text()
            .map(|s| s.to_string())
            .ok_or(CborError::TagPayloadMismatch { tag: crate::constants::tag::DATETIME_TEXT, expected: "tstr" })?;
        tag::parse_iso8601(&text)?;
        Ok(self.finish(Value::Tag(crate::constants::tag::DATETIME_TEXT, inner)))
    }

    #[cfg(not(feature = "chrono_tags"))]
    fn decode_datetime_text(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        self.decode_tag_wrapped(source, crate::constants::tag::DATETIME_TEXT)
    }

    #[cfg(feature = "chrono_tags")]
    fn decode_datetime_epoch(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let seconds = match &*inner.borrow() {
            Value::Int(i) => i
                .to_string()
                .parse::<f64>()
                .map_err(|_| CborError::MalformedInput("tag 1 integer payload out of range"))?,
            #[cfg(feature = "float")]
            Value::F64(f) => *f,
            #[cfg(feature = "float")]
            Value::F32(f) => *f as f64,
            _ => return Err(CborError::TagPayloadMismatch { tag: crate::constants::tag::DATETIME_EPOCH, expected: "integer or float" }),
        };
        tag::datetime_from_epoch_seconds(seconds)?;
        Ok(self.finish(Value::Tag(crate::constants::tag::DATETIME_EPOCH, inner)))
    }

    #[cfg(not(feature = "chrono_tags"))]
    fn decode_datetime_epoch(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        self.decode_tag_wrapped(source, crate::constants::tag::DATETIME_EPOCH)
    }

    fn decode_bignum(&mut self, source: &mut dyn ByteSource, negative: bool) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let bytes = inner
            .borrow()
            .as_bytes()
            .map(|b| b.to_vec())
            .ok_or(CborError::TagPayloadMismatch {
                tag: if negative { crate::constants::tag::BIGNUM_NEG } else { crate::constants::tag::BIGNUM_POS },
                expected: "bstr",
            })?;
        Ok(self.finish(tag::bignum_from_bytes(&bytes, negative)))
    }

    fn decode_decimal_like(&mut self, source: &mut dyn ByteSource, tag_number: u64) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let items = inner
            .borrow()
            .as_array()
            .map(|s| s.to_vec())
            .ok_or(CborError::TagPayloadMismatch { tag: tag_number, expected: "two-element array" })?;
        tag::decimal_value(&items)?;
        Ok(self.finish(Value::Tag(tag_number, inner)))
    }

    fn decode_shareable(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let placeholder = Value::Null.link();
        let index = self.shareables.reserve(placeholder);
        let saved = self.shared_index;
        self.shared_index = index;
        let result = self.decode_value(source);
        self.shared_index = saved;
        result
    }

    /// Tag 29's target is always reached synchronously: either the referenced index was reserved
    /// by an enclosing tag 28 already on the call stack (a genuine cycle, `Link` identity already
    /// valid even though its interior is still being filled in by an outer frame), or it was
    /// reserved and fully populated earlier (a plain share). `Shareables::get` itself rejects an
    /// index that was never reserved at all.
    fn decode_shared_ref(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let index = inner
            .borrow()
            .as_int()
            .and_then(|i| i.to_string().parse::<usize>().ok())
            .ok_or(CborError::TagPayloadMismatch { tag: crate::constants::tag::SHARED_REF, expected: "non-negative integer index" })?;
        self.shareables.get(index)
    }

    fn decode_regexp(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let pattern = inner
            .borrow()
            .as_text()
            .map(|s| s.to_string())
            .ok_or(CborError::TagPayloadMismatch { tag: crate::constants::tag::REGEXP, expected: "tstr" })?;
        tag::regexp_from_pattern(&pattern)?;
        Ok(self.finish(Value::Tag(crate::constants::tag::REGEXP, inner)))
    }

    fn decode_uuid(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let bytes = inner
            .borrow()
            .as_bytes()
            .map(|b| b.to_vec())
            .ok_or(CborError::TagPayloadMismatch { tag: crate::constants::tag::UUID, expected: "16-byte bstr" })?;
        tag::uuid_from_bytes(&bytes)?;
        Ok(self.finish(Value::Tag(crate::constants::tag::UUID, inner)))
    }

    fn decode_ip_address(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let inner = self.decode_unshared(source)?;
        let bytes = inner
            .borrow()
            .as_bytes()
            .map(|b| b.to_vec())
            .ok_or(CborError::TagPayloadMismatch { tag: crate::constants::tag::IP_ADDRESS, expected: "4- or 16-byte bstr" })?;
        tag::ip_addr_from_bytes(&bytes)?;
        Ok(self.finish(Value::Tag(crate::constants::tag::IP_ADDRESS, inner)))
    }

    /// Tag 258: set, backed by an array inner (§4.4). Rejects a non-array inner per the
    /// malformed-input case spec.md §7 calls out explicitly ("set-tag on non-array inner").
    fn decode_set(&mut self, source: &mut dyn ByteSource) -> Result<Link> {
        let slot = self.reserve_slot();
        let inner = self.decode_value(source)?;
        let items = inner
            .borrow()
            .as_array()
            .map(|s| s.to_vec())
            .ok_or(CborError::MalformedInput("tag 258 requires an array inner"))?;
        Ok(self.install(slot, Value::Set(items)))
    }

    fn decode_simple(&mut self, source: &mut dyn ByteSource, subtype: u8) -> Result<Link> {
        match subtype {
            0..=19 => Ok(self.finish(Value::Simple(subtype))),
            simple::FALSE => Ok(self.finish(Value::Bool(false))),
            simple::TRUE => Ok(self.finish(Value::Bool(true))),
            simple::NULL => Ok(self.finish(Value::Null)),
            simple::UNDEFINED => Ok(self.finish(Value::Undefined)),
            PAYLOAD_ONE_BYTE => {
                let b = source.read(1)?[0];
                if b <= 31 {
                    return Err(CborError::MalformedInput(
                        "simple-value extension byte must encode a value of 32 or greater",
                    ));
                }
                Ok(self.finish(Value::Simple(b)))
            }
            #[cfg(feature = "float")]
            simple::FLOAT16 => {
                let b = source.read(2)?;
                let bits = u16::from_be_bytes([b[0], b[1]]);
                Ok(self.finish(Value::F16(half::f16::from_bits(bits))))
            }
            #[cfg(feature = "float")]
            simple::FLOAT32 => {
                let b = source.read(4)?;
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&b);
                Ok(self.finish(Value::F32(f32::from_be_bytes(arr))))
            }
            #[cfg(feature = "float")]
            simple::FLOAT64 => {
                let b = source.read(8)?;
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b);
                Ok(self.finish(Value::F64(f64::from_be_bytes(arr))))
            }
            simple::BREAK => Err(CborError::UnexpectedBreak),
            _ => Err(CborError::MalformedInput("reserved simple-value subtype")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{EncodeOptions, Encoder, EncodingStyle};
    use crate::value::semantic_eq;
    use crate::wire::SliceSource;

    fn roundtrip(v: Value, encode_opts: EncodeOptions) -> Link {
        let mut bytes = Vec::new();
        Encoder::new(encode_opts).encode(&v.link(), &mut bytes).unwrap();
        let mut source = SliceSource::new(&bytes);
        Decoder::new(DecodeOptions::default()).decode(&mut source).unwrap()
    }

    #[test]
    fn decode_small_integers() {
        let v = roundtrip(Value::int(24), EncodeOptions::default());
        assert_eq!(*v.borrow(), Value::int(24));
        let v = roundtrip(Value::int(-100), EncodeOptions::default());
        assert_eq!(*v.borrow(), Value::int(-100));
    }

    #[test]
    fn decode_array_preserves_order() {
        let v = Value::array(vec![Value::int(1).link(), Value::int(2).link(), Value::int(3).link()]);
        let back = roundtrip(v.clone(), EncodeOptions::default());
        assert!(semantic_eq(&v, &back.borrow()));
    }

    #[test]
    fn decode_datetime_tag0() {
        let mut source = SliceSource::new(&[
            0xC0, 0x74, b'2', b'0', b'1', b'3', b'-', b'0', b'3', b'-', b'2', b'1', b'T', b'2',
            b'0', b':', b'0', b'4', b':', b'0', b'0', b'Z',
        ]);
        let v = Decoder::new(DecodeOptions::default()).decode(&mut source).unwrap();
        match &*v.borrow() {
            Value::Tag(0, inner) => assert_eq!(inner.borrow().as_text(), Some("2013-03-21T20:04:00Z")),
            other => panic!("expected tag 0, got {:?}", other),
        };
    }

    #[test]
    fn indefinite_text_string_concatenates_chunks() {
        // 0x7F "ab"(0x62) "cd"(0x62) break
        let mut source = SliceSource::new(&[0x7F, 0x62, b'a', b'b', 0x62, b'c', b'd', 0xFF]);
        let v = Decoder::new(DecodeOptions::default()).decode(&mut source).unwrap();
        assert_eq!(*v.borrow(), Value::text("abcd"));
    }

    #[test]
    fn self_referential_array_decodes_to_a_real_cycle() {
        let mut bytes = Vec::new();
        let outer = Value::Array(vec![]).link();
        outer.borrow_mut().clone_from(&Value::Array(vec![outer.clone()]));
        Encoder::new(EncodeOptions { value_sharing: true, ..EncodeOptions::default() })
            .encode(&outer, &mut bytes)
            .unwrap();

        let mut source = SliceSource::new(&bytes);
        let decoded = Decoder::new(DecodeOptions::default()).decode(&mut source).unwrap();
        match &*decoded.borrow() {
            Value::Array(items) => assert!(std::rc::Rc::ptr_eq(&items[0], &decoded)),
            other => panic!("expected array, got {:?}", other),
        };
    }

    #[test]
    fn break_outside_indefinite_collection_is_rejected() {
        let mut source = SliceSource::new(&[0xFF]);
        assert!(matches!(
            Decoder::new(DecodeOptions::default()).decode(&mut source),
            Err(CborError::UnexpectedBreak)
        ));
    }

    #[test]
    fn canonical_map_roundtrips_regardless_of_original_key_order() {
        let pairs = vec![
            (Value::text("b").link(), Value::int(2).link()),
            (Value::text("a").link(), Value::int(1).link()),
        ];
        let v = Value::map(pairs);
        let options = EncodeOptions { enc_style: EncodingStyle::Canonical, ..EncodeOptions::default() };
        let back = roundtrip(v.clone(), options);
        assert!(semantic_eq(&v, &back.borrow()));
    }
}

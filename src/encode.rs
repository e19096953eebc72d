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
 * Encoder (§4.2)
 *
 * Traverses a value graph, emits bytes through the Wire Codec, and manages the sharing table and
 * recursion budget. Canonical mode is a per-encode flag rather than a separate type: it changes
 * how maps/sets/floats are emitted, nothing else.
 **************************************************************************************************/
use std::collections::HashSet;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

#[cfg(feature = "chrono_tags")]
use chrono::TimeZone;

use crate::constants::*;
use crate::error::{CborError, Result};
use crate::registry::Registry;
use crate::sharing::EncodeSharing;
use crate::tag;
use crate::value::{Link, Value};
use crate::wire::{self, ByteSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingStyle {
    Regular,
    Canonical,
}

/// §6 `timestamp_format`: choose tag 0 (ISO text) or tag 1 (numeric epoch) for datetimes.
#[cfg(feature = "chrono_tags")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    Iso,
    Numeric,
}

/// Mirrors spec.md §6's configuration table, encoder-relevant subset.
pub struct EncodeOptions {
    pub value_sharing: bool,
    pub enc_style: EncodingStyle,
    pub recursion_limit: usize,
    #[cfg(feature = "chrono_tags")]
    pub timestamp_format: TimestampFormat,
    #[cfg(feature = "chrono_tags")]
    pub timezone: Option<chrono::FixedOffset>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            value_sharing: false,
            enc_style: EncodingStyle::Regular,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            #[cfg(feature = "chrono_tags")]
            timestamp_format: TimestampFormat::Iso,
            #[cfg(feature = "chrono_tags")]
            timezone: None,
        }
    }
}

pub struct Encoder {
    options: EncodeOptions,
    sharing: EncodeSharing,
    /// Identities of containers that are actually visited more than once while walking the
    /// value graph from the root (real sharing or a genuine cycle), computed once per top-level
    /// `encode` call. Only members of this set get a shared-index/tag 28 wrapper; a container
    /// that merely appears once is emitted plainly, matching spec.md §8 scenario 4 (the outer
    /// array of a two-element share is never itself tag-wrapped).
    shared: HashSet<usize>,
    depth: usize,
    registry: Registry,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Encoder {
            options,
            sharing: EncodeSharing::new(),
            shared: HashSet::new(),
            depth: 0,
            registry: Registry::new(),
        }
    }

    /// Same as `new`, but with a handler registry already populated (§4.2, "Handler selection"
    /// phases 2-4) for encoding host types that have no direct `Value` representation.
    pub fn new_with_registry(options: EncodeOptions, registry: Registry) -> Self {
        Encoder {
            options,
            sharing: EncodeSharing::new(),
            shared: HashSet::new(),
            depth: 0,
            registry,
        }
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Encode a host value with no direct `Value` representation by running it through the
    /// registry (§4.2 phases 2-4): exact handler, then deferred/subclass handlers, then the
    /// default handler. Fails with `unencodable-type` if nothing matches.
    pub fn encode_host<T: 'static>(&mut self, value: &T, sink: &mut dyn ByteSink) -> Result<()> {
        let resolved = self.registry.encode_via_registry(value).ok_or(CborError::UnencodableType)?;
        self.encode_value(&resolved.link(), sink)
    }

    /// §4.2 "Datetime (ISO mode)"/"(timestamp mode)": render per `timestamp_format`.
    #[cfg(feature = "chrono_tags")]
    pub fn encode_datetime(&mut self, dt: &chrono::DateTime<chrono::FixedOffset>, sink: &mut dyn ByteSink) -> Result<()> {
        let value = match self.options.timestamp_format {
            TimestampFormat::Iso => Value::Tag(
                crate::constants::tag::DATETIME_TEXT,
                Value::text(tag::render_iso8601(dt)).link(),
            ),
            TimestampFormat::Numeric => Value::Tag(
                crate::constants::tag::DATETIME_EPOCH,
                epoch_value(dt.timestamp(), dt.timestamp_subsec_nanos()).link(),
            ),
        };
        self.encode_value(&value.link(), sink)
    }

    /// §4.2 "Naive datetimes attach the configured timezone; if none is configured, fail with
    /// naive-datetime."
    #[cfg(feature = "chrono_tags")]
    pub fn encode_naive_datetime(&mut self, dt: &chrono::NaiveDateTime, sink: &mut dyn ByteSink) -> Result<()> {
        let tz = self.options.timezone.ok_or(CborError::NaiveDatetime)?;
        let attached = tz
            .from_local_datetime(dt)
            .single()
            .ok_or(CborError::MalformedInput("naive datetime is ambiguous in the configured timezone"))?;
        self.encode_datetime(&attached, sink)
    }

    /// Top-level entry point: `encode(value)` must leave the encoder in IDLE with the sharing
    /// table empty, whether it succeeds or fails (§4.2, "Encoder state machine").
    pub fn encode(&mut self, root: &Link, sink: &mut dyn ByteSink) -> Result<()> {
        if self.options.value_sharing {
            self.shared = detect_shared(root);
        }
        let result = self.encode_value(root, sink);
        self.sharing = EncodeSharing::new();
        self.shared = HashSet::new();
        self.depth = 0;
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

    fn encode_value(&mut self, link: &Link, sink: &mut dyn ByteSink) -> Result<()> {
        self.enter()?;
        let result = self.encode_value_inner(link, sink);
        self.exit();
        result
    }

    fn encode_value_inner(&mut self, link: &Link, sink: &mut dyn ByteSink) -> Result<()> {
        let is_container = matches!(
            &*link.borrow(),
            Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Tag(_, _)
        );

        if !is_container {
            return self.encode_body(link, sink);
        }

        if self.options.value_sharing {
            if let Some(index) = self.sharing.lookup(link) {
                wire::write_head(sink, MT_TAG, crate::constants::tag::SHARED_REF)?;
                return self.encode_uint(sink, index as u64);
            }
            if self.shared.contains(&(Rc::as_ptr(link) as usize)) {
                self.sharing.enter_shared(link);
                wire::write_head(sink, MT_TAG, crate::constants::tag::SHAREABLE)?;
                return self.encode_body(link, sink);
            }
            self.encode_body(link, sink)
        } else {
            if self.sharing.lookup(link).is_some() {
                return Err(CborError::CycleDetected);
            }
            self.sharing.enter_unshared(link);
            let body_result = self.encode_body(link, sink);
            self.sharing.exit_unshared(link);
            body_result
        }
    }

    fn encode_body(&mut self, link: &Link, sink: &mut dyn ByteSink) -> Result<()> {
        let value = link.borrow();
        match &*value {
            Value::Int(i) => self.encode_int(sink, i),
            Value::Bytes(b) => self.encode_bytestring(sink, b),
            Value::Text(s) => self.encode_textstring(sink, s),
            Value::Array(items) => {
                let items = items.clone();
                drop(value);
                wire::write_head(sink, MT_ARRAY, items.len() as u64)?;
                for item in &items {
                    self.encode_value(item, sink)?;
                }
                Ok(())
            }
            Value::Map(pairs) => {
                let pairs = pairs.clone();
                drop(value);
                self.encode_map(&pairs, sink)
            }
            Value::Set(items) => {
                let items = items.clone();
                drop(value);
                self.encode_set(&items, sink)
            }
            Value::Bool(b) => {
                wire::write_head(sink, MT_SIMPLE, if *b { simple::TRUE as u64 } else { simple::FALSE as u64 })
            }
            Value::Null => wire::write_head(sink, MT_SIMPLE, simple::NULL as u64),
            Value::Undefined => wire::write_head(sink, MT_SIMPLE, simple::UNDEFINED as u64),
            #[cfg(feature = "float")]
            Value::F16(_) | Value::F32(_) | Value::F64(_) => self.encode_float(sink, &value),
            Value::Simple(v) => {
                let v = *v;
                drop(value);
                self.encode_simple(sink, v)
            }
            Value::Tag(t, inner) => {
                let t = *t;
                let inner = inner.clone();
                drop(value);
                wire::write_head(sink, MT_TAG, t)?;
                self.encode_value(&inner, sink)
            }
        }
    }

    fn encode_int(&self, sink: &mut dyn ByteSink, v: &BigInt) -> Result<()> {
        if let Some(small) = v.to_i128() {
            if (0..(1i128 << 64)).contains(&small) {
                return self.encode_uint(sink, small as u64);
            }
            if (-(1i128 << 64)..0).contains(&small) {
                let arg = (-1 - small) as u64;
                return wire::write_head(sink, MT_NINT, arg);
            }
        }
        let (tag_num, bytes) = tag::bignum_to_bytes(v);
        wire::write_head(sink, MT_TAG, tag_num)?;
        self.encode_bytestring(sink, &bytes)
    }

    fn encode_uint(&self, sink: &mut dyn ByteSink, v: u64) -> Result<()> {
        wire::write_head(sink, MT_UINT, v)
    }

    fn encode_bytestring(&self, sink: &mut dyn ByteSink, bytes: &[u8]) -> Result<()> {
        wire::write_head(sink, MT_BSTR, bytes.len() as u64)?;
        wire::write_bytes(sink, bytes)
    }

    fn encode_textstring(&self, sink: &mut dyn ByteSink, s: &str) -> Result<()> {
        let utf8 = s.as_bytes();
        wire::write_head(sink, MT_TSTR, utf8.len() as u64)?;
        wire::write_bytes(sink, utf8)
    }

    fn encode_simple(&self, sink: &mut dyn ByteSink, v: u8) -> Result<()> {
        if v < 20 {
            wire::write_head(sink, MT_SIMPLE, v as u64)
        } else if v <= 31 {
            Err(CborError::MalformedInput(
                "simple values 20..31 are reserved (20..23 for false/true/null/undefined, 24..31 unassigned)",
            ))
        } else {
            wire::write_literal_head(sink, MT_SIMPLE, PAYLOAD_ONE_BYTE)?;
            wire::write_bytes(sink, &[v])
        }
    }

    #[cfg(feature = "float")]
    fn encode_float(&self, sink: &mut dyn ByteSink, value: &Value) -> Result<()> {
        let as_f64 = match value {
            Value::F16(f) => f.to_f64(),
            Value::F32(f) => *f as f64,
            Value::F64(f) => *f,
            _ => unreachable!(),
        };

        if self.options.enc_style == EncodingStyle::Canonical {
            return self.encode_float_minimal(sink, as_f64);
        }

        // §4.2 "Float (non-canonical)": NaN/infinity are special-cased to the canonical half
        // forms even in regular mode — the width-selecting match below never sees them.
        if as_f64.is_nan() {
            return self.encode_f16_bits(sink, 0x7e00);
        }
        if as_f64.is_infinite() {
            return self.encode_f16_bits(sink, if as_f64 > 0.0 { 0x7c00 } else { 0xfc00 });
        }

        match value {
            Value::F16(f) => self.encode_f16_bits(sink, half::f16::from_f64(f.to_f64()).to_bits()),
            Value::F32(f) => self.encode_f32(sink, *f),
            Value::F64(f) => self.encode_f64(sink, *f),
            _ => unreachable!(),
        }
    }

    #[cfg(feature = "float")]
    fn encode_float_minimal(&self, sink: &mut dyn ByteSink, v: f64) -> Result<()> {
        if v.is_nan() {
            return self.encode_f16_bits(sink, 0x7e00);
        }
        if v.is_infinite() {
            return self.encode_f16_bits(sink, if v > 0.0 { 0x7c00 } else { 0xfc00 });
        }

        let as_f16 = half::f16::from_f64(v);
        if as_f16.to_f64() == v {
            return self.encode_f16_bits(sink, as_f16.to_bits());
        }
        let as_f32 = v as f32;
        if as_f32 as f64 == v {
            return self.encode_f32(sink, as_f32);
        }
        self.encode_f64(sink, v)
    }

    #[cfg(feature = "float")]
    fn encode_f16_bits(&self, sink: &mut dyn ByteSink, bits: u16) -> Result<()> {
        wire::write_literal_head(sink, MT_SIMPLE, simple::FLOAT16)?;
        wire::write_bytes(sink, &bits.to_be_bytes())
    }

    #[cfg(feature = "float")]
    fn encode_f32(&self, sink: &mut dyn ByteSink, v: f32) -> Result<()> {
        wire::write_literal_head(sink, MT_SIMPLE, simple::FLOAT32)?;
        wire::write_bytes(sink, &v.to_be_bytes())
    }

    #[cfg(feature = "float")]
    fn encode_f64(&self, sink: &mut dyn ByteSink, v: f64) -> Result<()> {
        wire::write_literal_head(sink, MT_SIMPLE, simple::FLOAT64)?;
        wire::write_bytes(sink, &v.to_be_bytes())
    }

    fn encode_map(&mut self, pairs: &[(Link, Link)], sink: &mut dyn ByteSink) -> Result<()> {
        if self.options.enc_style == EncodingStyle::Canonical {
            self.encode_map_canonical(pairs, sink)
        } else {
            wire::write_head(sink, MT_MAP, pairs.len() as u64)?;
            for (k, v) in pairs {
                self.encode_value(k, sink)?;
                self.encode_value(v, sink)?;
            }
            Ok(())
        }
    }

    /// Canonical map encoding (§4.2, "Map (canonical)"): each key is buffer-encoded, triples are
    /// sorted by key-bytes ascending, then heads and values stream out in sorted order.
    fn encode_map_canonical(&mut self, pairs: &[(Link, Link)], sink: &mut dyn ByteSink) -> Result<()> {
        let mut triples: Vec<(Vec<u8>, &Link, &Link)> = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            let mut scratch = Vec::new();
            self.encode_value(k, &mut scratch)?;
            triples.push((scratch, k, v));
        }
        triples.sort_by(|a, b| a.0.cmp(&b.0));

        wire::write_head(sink, MT_MAP, triples.len() as u64)?;
        for (key_bytes, _, v) in &triples {
            wire::write_bytes(sink, key_bytes)?;
            self.encode_value(v, sink)?;
        }
        Ok(())
    }

    fn encode_set(&mut self, items: &[Link], sink: &mut dyn ByteSink) -> Result<()> {
        wire::write_head(sink, MT_TAG, crate::constants::tag::SET)?;
        if self.options.enc_style == EncodingStyle::Canonical {
            let mut encoded: Vec<(Vec<u8>, &Link)> = Vec::with_capacity(items.len());
            for item in items {
                let mut scratch = Vec::new();
                self.encode_value(item, &mut scratch)?;
                encoded.push((scratch, item));
            }
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            wire::write_head(sink, MT_ARRAY, encoded.len() as u64)?;
            for (bytes, _) in &encoded {
                wire::write_bytes(sink, bytes)?;
            }
            Ok(())
        } else {
            wire::write_head(sink, MT_ARRAY, items.len() as u64)?;
            for item in items {
                self.encode_value(item, sink)?;
            }
            Ok(())
        }
    }
}

/// §4.2 "compute fractional seconds since epoch ... emit as integer if integral, else as float."
#[cfg(all(feature = "chrono_tags", feature = "float"))]
fn epoch_value(seconds: i64, nanos: u32) -> Value {
    if nanos == 0 {
        Value::int(seconds)
    } else {
        Value::F64(seconds as f64 + nanos as f64 / 1_000_000_000.0)
    }
}

/// Without the `float` feature there's no `Value::F64` to emit a fractional epoch through;
/// sub-second precision is dropped rather than pulling in float support for this alone.
#[cfg(all(feature = "chrono_tags", not(feature = "float")))]
fn epoch_value(seconds: i64, _nanos: u32) -> Value {
    Value::int(seconds)
}

/// Pre-scan the value graph from `root`, returning the identities of containers that are visited
/// more than once: either a genuine cycle (found again while still on the traversal stack) or a
/// plain DAG-style share (found again after having been fully visited elsewhere). Only these
/// identities are assigned a shared-index and wrapped in tag 28 during the real encode; a
/// container visited exactly once is written plainly (§8 scenario 4).
fn detect_shared(root: &Link) -> HashSet<usize> {
    let mut on_stack = HashSet::new();
    let mut visited = HashSet::new();
    let mut shared = HashSet::new();
    walk_for_sharing(root, &mut on_stack, &mut visited, &mut shared);
    shared
}

fn walk_for_sharing(
    link: &Link,
    on_stack: &mut HashSet<usize>,
    visited: &mut HashSet<usize>,
    shared: &mut HashSet<usize>,
) {
    let key = Rc::as_ptr(link) as usize;
    if on_stack.contains(&key) || visited.contains(&key) {
        shared.insert(key);
        return;
    }

    let children: Vec<Link> = match &*link.borrow() {
        Value::Array(items) | Value::Set(items) => items.clone(),
        Value::Map(pairs) => pairs.iter().flat_map(|(k, v)| [k.clone(), v.clone()]).collect(),
        Value::Tag(_, inner) => vec![inner.clone()],
        _ => return,
    };

    on_stack.insert(key);
    for child in &children {
        walk_for_sharing(child, on_stack, visited, shared);
    }
    on_stack.remove(&key);
    visited.insert(key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn encode_to_vec(v: Value, options: EncodeOptions) -> Vec<u8> {
        let mut encoder = Encoder::new(options);
        let mut out = Vec::new();
        encoder.encode(&v.link(), &mut out).unwrap();
        out
    }

    #[test]
    fn small_integers_use_minimal_heads() {
        assert_eq!(encode_to_vec(Value::int(0), EncodeOptions::default()), vec![0x00]);
        assert_eq!(encode_to_vec(Value::int(23), EncodeOptions::default()), vec![0x17]);
        assert_eq!(encode_to_vec(Value::int(24), EncodeOptions::default()), vec![0x18, 0x18]);
        assert_eq!(encode_to_vec(Value::int(-1), EncodeOptions::default()), vec![0x20]);
        assert_eq!(encode_to_vec(Value::int(-100), EncodeOptions::default()), vec![0x38, 0x63]);
    }

    #[test]
    fn array_of_small_ints() {
        let v = Value::array(vec![Value::int(1).link(), Value::int(2).link(), Value::int(3).link()]);
        assert_eq!(encode_to_vec(v, EncodeOptions::default()), vec![0x83, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn canonical_map_sorts_keys_by_encoded_bytes() {
        let pairs = vec![
            (Value::text("a").link(), Value::int(1).link()),
            (Value::text("b").link(), Value::int(2).link()),
            (Value::text("").link(), Value::int(3).link()),
        ];
        let v = Value::map(pairs);
        let options = EncodeOptions { enc_style: EncodingStyle::Canonical, ..EncodeOptions::default() };
        let out = encode_to_vec(v, options);
        assert_eq!(
            out,
            vec![0xA3, 0x60, 0x03, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02]
        );
    }

    #[test]
    fn shared_array_emits_body_once_and_reference_after() {
        let inner = Value::array(vec![]).link();
        let outer = Value::array(vec![inner.clone(), inner.clone()]);
        let options = EncodeOptions { value_sharing: true, ..EncodeOptions::default() };
        let out = encode_to_vec(outer, options);
        // outer array head (2 elems), tag 28 + empty array, tag 29 + index 0
        assert_eq!(out, vec![0x82, 0xd8, 0x1c, 0x80, 0xd8, 0x1d, 0x00]);
    }

    #[test]
    fn cycle_without_sharing_is_an_error() {
        let outer = Value::Array(vec![]).link();
        outer.borrow_mut().clone_from(&Value::Array(vec![outer.clone()]));
        let mut encoder = Encoder::new(EncodeOptions::default());
        let mut out = Vec::new();
        assert!(matches!(encoder.encode(&outer, &mut out), Err(CborError::CycleDetected)));
    }

    #[test]
    fn self_referential_array_with_sharing_roundtrips_structurally() {
        let outer = Value::Array(vec![]).link();
        outer.borrow_mut().clone_from(&Value::Array(vec![outer.clone()]));
        let options = EncodeOptions { value_sharing: true, ..EncodeOptions::default() };
        let mut encoder = Encoder::new(options);
        let mut out = Vec::new();
        encoder.encode(&outer, &mut out).unwrap();
        assert_eq!(out, vec![0xd8, 0x1c, 0x81, 0xd8, 0x1d, 0x00]);
    }
}

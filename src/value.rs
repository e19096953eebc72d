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
 * CBOR Abstract Syntax Tree
 *
 * The in-memory value domain that the Encoder serializes and the Decoder reconstructs. Every
 * container-typed node (Array, Map, Set) and every Tag payload is held behind a `Link` so that a
 * value graph can share or cycle back onto itself, matching the wire-level tag 28 / tag 29
 * sharing protocol.
 **************************************************************************************************/
use std::cell::RefCell;
use std::rc::Rc;

use num_bigint::BigInt;

#[cfg(feature = "float")]
use half::f16;

/// A shareable handle onto a `Value`. Encoder identity (for cycle/sharing detection) is the
/// pointer of the inner `RefCell`; the Decoder's shareables list is a `Vec<Link>` of these.
pub type Link = Rc<RefCell<Value>>;

/// The CBOR value domain (§3). Every value inhabits exactly one variant.
#[derive(Debug, Clone)]
pub enum Value {
    /// Arbitrary-precision integer. Sign plus magnitude determine major type 0 vs 1 on the wire.
    Int(BigInt),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Link>),
    /// Insertion-ordered key/value pairs. Canonical encoding sorts a scratch copy by key bytes.
    Map(Vec<(Link, Link)>),
    Set(Vec<Link>),
    Bool(bool),
    Null,
    Undefined,
    #[cfg(feature = "float")]
    F16(f16),
    #[cfg(feature = "float")]
    F32(f32),
    #[cfg(feature = "float")]
    F64(f64),
    /// Simple value outside {false, true, null, undefined} and outside the reserved 24..=31 range.
    Simple(u8),
    /// A semantic tag wrapping a single inner value (major type 6).
    Tag(u64, Link),
}

impl Value {
    pub fn link(self) -> Link {
        Rc::new(RefCell::new(self))
    }

    pub fn int<T: Into<BigInt>>(v: T) -> Value {
        Value::Int(v.into())
    }

    pub fn text<S: Into<String>>(v: S) -> Value {
        Value::Text(v.into())
    }

    pub fn bytes<B: Into<Vec<u8>>>(v: B) -> Value {
        Value::Bytes(v.into())
    }

    pub fn array<I: IntoIterator<Item = Link>>(items: I) -> Value {
        Value::Array(items.into_iter().collect())
    }

    pub fn map<I: IntoIterator<Item = (Link, Link)>>(pairs: I) -> Value {
        Value::Map(pairs.into_iter().collect())
    }

    pub fn set<I: IntoIterator<Item = Link>>(items: I) -> Value {
        Value::Set(items.into_iter().collect())
    }

    pub fn tag(t: u64, inner: Link) -> Value {
        Value::Tag(t, inner)
    }

    /// Shallow type-name used in error messages and `cbor_diag` output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bytes(_) => "bstr",
            Value::Text(_) => "tstr",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Undefined => "undefined",
            #[cfg(feature = "float")]
            Value::F16(_) | Value::F32(_) | Value::F64(_) => "float",
            Value::Simple(_) => "simple",
            Value::Tag(_, _) => "tag",
        }
    }

    pub fn as_map(&self) -> Option<&[(Link, Link)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Link]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// Structural equality. Floats compare bitwise except that all NaNs are considered equal to one
/// another (§8, "Roundtrip identity"); containers compare element-by-element in order (decode
/// preserves map insertion order, so an honest roundtrip is order-preserving too).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Array(a), Array(b)) => links_eq(a, b),
            (Map(a), Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ak, av), (bk, bv))| link_eq(ak, bk) && link_eq(av, bv))
            }
            (Set(a), Set(b)) => links_eq(a, b),
            (Bool(a), Bool(b)) => a == b,
            (Null, Null) => true,
            (Undefined, Undefined) => true,
            #[cfg(feature = "float")]
            (F16(a), F16(b)) => float_eq(a.to_f64(), b.to_f64()),
            #[cfg(feature = "float")]
            (F32(a), F32(b)) => float_eq(*a as f64, *b as f64),
            #[cfg(feature = "float")]
            (F64(a), F64(b)) => float_eq(*a, *b),
            (Simple(a), Simple(b)) => a == b,
            (Tag(ta, a), Tag(tb, b)) => ta == tb && link_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(feature = "float")]
fn float_eq(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a.to_bits() == b.to_bits()
    }
}

fn link_eq(a: &Link, b: &Link) -> bool {
    *a.borrow() == *b.borrow()
}

fn links_eq(a: &[Link], b: &[Link]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| link_eq(x, y))
}

/// "Maps compared as key/value sets" variant of equality used by the canonical-determinism
/// property test (§8): two maps are equal if they carry the same pairs regardless of order.
pub fn semantic_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Map(pa), Value::Map(pb)) => {
            if pa.len() != pb.len() {
                return false;
            }
            let mut remaining: Vec<bool> = vec![false; pb.len()];
            'outer: for (ak, av) in pa {
                for (i, (bk, bv)) in pb.iter().enumerate() {
                    if !remaining[i]
                        && semantic_eq(&ak.borrow(), &bk.borrow())
                        && semantic_eq(&av.borrow(), &bv.borrow())
                    {
                        remaining[i] = true;
                        continue 'outer;
                    }
                }
                return false;
            }
            true
        }
        (Value::Array(xa), Value::Array(xb)) | (Value::Set(xa), Value::Set(xb)) => {
            xa.len() == xb.len()
                && xa
                    .iter()
                    .zip(xb.iter())
                    .all(|(x, y)| semantic_eq(&x.borrow(), &y.borrow()))
        }
        (Value::Tag(ta, xa), Value::Tag(tb, xb)) => {
            ta == tb && semantic_eq(&xa.borrow(), &xb.borrow())
        }
        _ => a == b,
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::Int(BigInt::from(v))
                }
            }
        )*
    };
}
impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, isize, usize);

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

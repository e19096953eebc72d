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
 * Value sharing state (tags 28/29)
 *
 * The Encoder's sharing table and the Decoder's shareables list (§3, "Sharing state"). Kept as a
 * standalone module since both sides need the same placeholder-then-populate discipline and
 * neither belongs conceptually inside `encode.rs`/`decode.rs`'s per-type emission logic.
 **************************************************************************************************/
use std::collections::HashMap;

use crate::error::{CborError, Result};
use crate::value::Link;

/// Encoder-side sharing table: maps a value's identity (its `Rc` pointer) to the shared-index it
/// was assigned. Lives for one top-level `encode` call.
#[derive(Default)]
pub struct EncodeSharing {
    table: HashMap<usize, usize>,
    next_index: usize,
}

impl EncodeSharing {
    pub fn new() -> Self {
        EncodeSharing {
            table: HashMap::new(),
            next_index: 0,
        }
    }

    fn key(link: &Link) -> usize {
        std::rc::Rc::as_ptr(link) as usize
    }

    /// Look up `link`'s identity. Returns the assigned shared-index if already present.
    pub fn lookup(&self, link: &Link) -> Option<usize> {
        self.table.get(&Self::key(link)).copied()
    }

    /// Step 5: absent + sharing enabled. Allocates the next index and inserts the entry.
    pub fn enter_shared(&mut self, link: &Link) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.table.insert(Self::key(link), index);
        index
    }

    /// Step 6: absent + sharing disabled. Inserts a sentinel entry so a re-entrant reference to
    /// the same identity is detected as a cycle while this container's body is being encoded.
    pub fn enter_unshared(&mut self, link: &Link) {
        self.table.insert(Self::key(link), usize::MAX);
    }

    /// Step 6 continued: remove the sentinel entry once the container's body has been encoded
    /// without error, so sibling (non-cyclic) occurrences of the same value encode independently.
    pub fn exit_unshared(&mut self, link: &Link) {
        self.table.remove(&Self::key(link));
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Decoder-side shareables list: an ordered list of values, appended to whenever tag 28 is
/// opened. Each entry starts as a placeholder and is overwritten in place once its value is fully
/// constructed, so that a tag-29 reference decoded from *inside* the value's own body (a genuine
/// cycle) can still resolve to the right `Link`.
#[derive(Default)]
pub struct Shareables {
    slots: Vec<Link>,
    /// Tracks which slots have had `populate` called at least once. A slot that's only been
    /// `reserve`d is still the raw placeholder: §4.3's Shareables protocol requires `get` to
    /// reject a reference to one ("fail if it is still the placeholder").
    populated: Vec<bool>,
}

impl Shareables {
    pub fn new() -> Self {
        Shareables { slots: Vec::new(), populated: Vec::new() }
    }

    /// Reserve the next slot, installing `placeholder` immediately so in-progress recursive
    /// decodes can clone the `Link` before the real value is known.
    pub fn reserve(&mut self, placeholder: Link) -> usize {
        self.slots.push(placeholder);
        self.populated.push(false);
        self.slots.len() - 1
    }

    /// Overwrite the interior of slot `index` with `value`'s interior, once construction
    /// completes. The `Link` identity installed at `reserve` time is preserved, so any clone
    /// taken during construction still observes the final value.
    pub fn populate(&mut self, index: usize, value: crate::value::Value) {
        self.slots[index].replace(value);
        self.populated[index] = true;
    }

    /// Fails if `index` is out of range, or if the slot is still the raw, never-`populate`d
    /// placeholder (a self-reference to a value that can never finish constructing).
    pub fn get(&self, index: usize) -> Result<Link> {
        match (self.slots.get(index), self.populated.get(index)) {
            (Some(link), Some(true)) => Ok(link.clone()),
            _ => Err(CborError::UnresolvedSharedReference),
        }
    }
}

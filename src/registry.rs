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
 * Encoder handler registry (§4.2, "Handler selection")
 *
 * The built-in `Value` sum type already covers the core set {bytes, text, integer, float,
 * boolean, null, array, map, set, tag} via direct dispatch in `encode.rs`; this module is the
 * escape hatch for host types that convert to a `Value` through user-supplied logic rather than
 * construction of a `Value` directly.
 *
 * Three phases, mirroring the source system's handler lookup:
 *   1. (handled entirely by `encode.rs`'s direct match on `Value`'s variants.)
 *   2. Exact `TypeId` lookup in `encoders`.
 *   3. Subclass fall-through: deferred (named) entries are resolved lazily via a caller-provided
 *      loader, then tested with their predicate; first hit is memoized as a direct entry so the
 *      next value of the same concrete type hits phase 2.
 **************************************************************************************************/
use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::value::Value;

/// A handler converts some host type into a `Value`. Boxed so the registry can hold handlers for
/// heterogeneous host types in one map.
pub type Handler = Box<dyn Fn(&dyn Any) -> Option<Value>>;

/// A deferred registration: named by (module, name) so that resolving it doesn't force loading
/// the type's crate until a value is actually encountered that might match it.
struct Deferred {
    module: &'static str,
    name: &'static str,
    /// Tests whether `value` is an instance of (or subtype-compatible with) this deferred entry,
    /// once resolved. Subclass relationships in Rust are expressed as trait bounds rather than
    /// runtime inheritance, so "is a subtype of" here means "downcasts successfully".
    predicate: Box<dyn Fn(&dyn Any) -> bool>,
    handler: Handler,
}

/// Caller-supplied hook invoked the first time a deferred entry is consulted. Mirrors the
/// source's opaque "load named type" operation (spec.md §1, "module/package loading ... the core
/// invokes an opaque 'load named type' operation").
pub type Loader = Box<dyn Fn(&'static str, &'static str)>;

#[derive(Default)]
pub struct Registry {
    exact: HashMap<TypeId, Handler>,
    deferred: Vec<Deferred>,
    default_handler: Option<Handler>,
    loader: Option<Loader>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a handler directly under `T`'s `TypeId` (phase 2 entry).
    pub fn register<T: 'static>(&mut self, handler: impl Fn(&T) -> Option<Value> + 'static) {
        let boxed: Handler = Box::new(move |any: &dyn Any| any.downcast_ref::<T>().and_then(&handler));
        self.exact.insert(TypeId::of::<T>(), boxed);
    }

    /// Register a deferred entry named by (module, name); the loader runs once, on first
    /// consultation of this entry, not at registration time.
    pub fn register_deferred<T: 'static>(
        &mut self,
        module: &'static str,
        name: &'static str,
        handler: impl Fn(&T) -> Option<Value> + 'static,
    ) {
        let predicate = |any: &dyn Any| any.is::<T>();
        let wrapped_handler: Handler =
            Box::new(move |any: &dyn Any| any.downcast_ref::<T>().and_then(&handler));
        self.deferred.push(Deferred {
            module,
            name,
            predicate: Box::new(predicate),
            handler: wrapped_handler,
        });
    }

    pub fn set_default_handler(&mut self, handler: impl Fn(&dyn Any) -> Option<Value> + 'static) {
        self.default_handler = Some(Box::new(handler));
    }

    pub fn set_loader(&mut self, loader: impl Fn(&'static str, &'static str) + 'static) {
        self.loader = Some(Box::new(loader));
    }

    /// Run phases 2-4 of handler selection for `value`, whose concrete type is `T`.
    pub fn encode_via_registry<T: 'static>(&mut self, value: &T) -> Option<Value> {
        let type_id = TypeId::of::<T>();

        // Phase 2: exact lookup.
        if let Some(handler) = self.exact.get(&type_id) {
            if let Some(v) = handler(value) {
                return Some(v);
            }
        }

        // Phase 3: subclass fall-through over deferred entries, in insertion order.
        for i in 0..self.deferred.len() {
            if let Some(loader) = &self.loader {
                loader(self.deferred[i].module, self.deferred[i].name);
            }
            if (self.deferred[i].predicate)(value) {
                let result = (self.deferred[i].handler)(value);
                if result.is_some() {
                    // Memoize: move the entry's handler into `exact` so the next value of this
                    // exact runtime type hits phase 2 directly instead of re-walking `deferred`.
                    let entry = self.deferred.remove(i);
                    self.exact.insert(type_id, entry.handler);
                    return result;
                }
            }
        }

        // Phase 4: default handler.
        self.default_handler.as_ref().and_then(|h| h(value))
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.deferred.is_empty() && self.default_handler.is_none()
    }
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;

use crate::data_type::Value;

const DEFAULT_DEDUP_CAPACITY: usize = 4096;

/// Deduplicates [`Value`]s into a dense dictionary, assigning each distinct
/// value the next index in insertion order.
///
/// Values are keyed by their canonical byte form, so float `NaN`s with the
/// same bit pattern dedup while `0.0` and `-0.0` stay distinct entries.
#[derive(Debug, Default)]
pub struct ValueInterner {
    state: ahash::RandomState,

    /// Keys are indices into `values`; the hash of the corresponding value
    /// is recomputed on resize, so no per-entry hash is stored.
    dedup: HashMap<usize, (), ()>,

    values: Vec<Value>,

    /// Sum of the PLAIN-encoded sizes of the distinct values.
    encoded_size: usize,

    key_buf: Vec<u8>,
}

impl ValueInterner {
    pub fn new() -> Self {
        Self {
            state: Default::default(),
            dedup: HashMap::with_capacity_and_hasher(DEFAULT_DEDUP_CAPACITY, ()),
            values: Vec::with_capacity(DEFAULT_DEDUP_CAPACITY),
            encoded_size: 0,
            key_buf: Vec::new(),
        }
    }

    /// Interns `value`, returning its dictionary index.
    pub fn intern(&mut self, value: &Value) -> usize {
        self.key_buf.clear();
        value.write_key(&mut self.key_buf);
        let hash = self.state.hash_one(self.key_buf.as_slice());

        let values = &mut self.values;
        let entry = self
            .dedup
            .raw_entry_mut()
            .from_hash(hash, |index| values[*index].dict_eq(value));

        match entry {
            RawEntryMut::Occupied(entry) => *entry.key(),
            RawEntryMut::Vacant(entry) => {
                let index = values.len();
                values.push(value.clone());
                self.encoded_size += value.encoded_size();

                let state = &self.state;
                let values = &*values;
                *entry
                    .insert_with_hasher(hash, index, (), |index| {
                        let mut buf = Vec::new();
                        values[*index].write_key(&mut buf);
                        state.hash_one(buf.as_slice())
                    })
                    .0
            }
        }
    }

    /// Number of distinct values interned so far.
    pub fn num_entries(&self) -> usize {
        self.values.len()
    }

    /// Sum of the PLAIN-encoded sizes of the distinct values.
    pub fn encoded_size(&self) -> usize {
        self.encoded_size
    }

    /// The distinct values in insertion order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

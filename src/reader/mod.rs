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

//! Lazy per-column readers over one stripe.
//!
//! A reader binds the streams of its column once per stripe and then
//! defers every physical decode until a value is demanded, so that callers
//! filtering rows elsewhere can skip whole runs without paying for them.
//! Presence and data cursors stay aligned across arbitrary interleavings
//! of advance, materialize, skip and seek.

pub mod boolean;
pub mod byte;

use std::collections::HashMap;

use snafu::{ensure, OptionExt};

use crate::encoding::boolean::BooleanDecoder;
use crate::error::{self, Result};
use crate::proto::{stream::Kind, ColumnEncoding, RowIndex, RowIndexEntry};
use crate::stripe::StreamMap;

/// Physical decode capability of one concrete column type.
///
/// The lazy reader core is generic over this; the set of implementations
/// is the closed family of supported column types.
pub trait ValueDecoder: Sized {
    /// Primitive produced by one physical read.
    type Value: Copy;

    /// Value observed through [`LazyColumnReader::read_next`] with
    /// `read_stream` false before the first physical read.
    const INITIAL: Self::Value;

    /// Bind the column's encoded stream(s) for one stripe.
    fn bind(column_id: u32, streams: &StreamMap, encoding: &ColumnEncoding) -> Result<Self>;

    /// Decode exactly one physically stored value.
    fn read_one(&mut self) -> Result<Self::Value>;

    /// Advance past `count` physically stored values without decoding them.
    fn skip(&mut self, count: u64) -> Result<()>;

    /// Reposition to the start of a row group.
    fn seek(&mut self, row_group: usize) -> Result<()>;

    /// Consume this decoder's recorded positions from each row index
    /// entry, starting at slot `start`; returns the next unconsumed slot.
    fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize>;
}

/// Null tracking for one column: decodes the optional PRESENT stream and
/// holds the presence flag of the row currently being visited.
#[derive(Default)]
pub struct PresentTracker {
    decoder: Option<BooleanDecoder>,
    value_present: bool,
}

impl PresentTracker {
    fn start_stripe(&mut self, column_id: u32, streams: &StreamMap) {
        self.decoder = streams
            .get_opt(column_id, Kind::Present)
            .map(BooleanDecoder::new);
        // Columns without a PRESENT stream have a value in every row.
        self.value_present = self.decoder.is_none();
    }

    /// Decode the presence flag of the next row.
    pub fn advance(&mut self) -> Result<bool> {
        if let Some(decoder) = &mut self.decoder {
            self.value_present = decoder.next_bit()?;
        }
        Ok(self.value_present)
    }

    /// Whether the row currently being visited holds a value.
    pub fn value_present(&self) -> bool {
        self.value_present
    }

    fn seek(&mut self, row_group: usize) -> Result<()> {
        match &mut self.decoder {
            Some(decoder) => decoder.seek(row_group),
            None => Ok(()),
        }
    }

    fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        match &mut self.decoder {
            Some(decoder) => decoder.load_positions(entries, start),
            None => Ok(start),
        }
    }

    fn release(&mut self) {
        self.decoder = None;
        self.value_present = false;
    }
}

/// Reusable output slot for one decoded value.
///
/// Callers may hand the cell of the previous row back to the reader to be
/// overwritten in place of a fresh allocation. The reader never retains a
/// returned cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueCell<T> {
    value: T,
}

impl<T> ValueCell<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Lazily decodes one column of a stripe.
///
/// Lifecycle per stripe: [`start_stripe`](Self::start_stripe), then any
/// interleaving of seek, skip and read operations, then
/// [`release`](Self::release). A reader instance outlives stripes and is
/// rebound to each in turn.
pub struct LazyColumnReader<D: ValueDecoder> {
    column_id: u32,
    row_index_stride: u64,
    row_base_in_stripe: u64,
    /// Absolute row number the next presence advance will visit.
    row_cursor: u64,
    present: PresentTracker,
    decoder: Option<D>,
    latest: D::Value,
}

impl<D: ValueDecoder> LazyColumnReader<D> {
    /// `row_index_stride` is the number of rows per row group, 0 when the
    /// containing file carries no row index.
    pub fn new(column_id: u32, row_index_stride: u64) -> Self {
        Self {
            column_id,
            row_index_stride,
            row_base_in_stripe: 0,
            row_cursor: 0,
            present: PresentTracker::default(),
            decoder: None,
            latest: D::INITIAL,
        }
    }

    pub fn column_id(&self) -> u32 {
        self.column_id
    }

    /// Bind this column's streams for a new stripe, dropping any prior
    /// binding, and prime the decoder seek tables from the column's row
    /// index when one is available.
    pub fn start_stripe(
        &mut self,
        streams: &StreamMap,
        encodings: &[ColumnEncoding],
        indexes: &HashMap<u32, RowIndex>,
        row_base_in_stripe: u64,
    ) -> Result<()> {
        self.release();
        self.present.start_stripe(self.column_id, streams);
        let encoding =
            encodings
                .get(self.column_id as usize)
                .context(error::OutOfSpecSnafu {
                    msg: format!("no encoding for column {}", self.column_id),
                })?;
        self.decoder = Some(D::bind(self.column_id, streams, encoding)?);
        self.row_base_in_stripe = row_base_in_stripe;
        self.row_cursor = row_base_in_stripe;
        if let Some(index) = indexes.get(&self.column_id) {
            self.load_index_entries(&index.entry, 0)?;
        }
        Ok(())
    }

    fn decoder_mut(&mut self) -> Result<&mut D> {
        self.decoder.as_mut().context(error::InvalidInputSnafu {
            msg: "column reader is not bound to a stripe",
        })
    }

    /// Reposition presence and data cursors to the start of a row group
    /// without reading intervening values.
    pub fn seek(&mut self, row_group: usize) -> Result<()> {
        self.present.seek(row_group)?;
        self.decoder_mut()?.seek(row_group)?;
        self.row_cursor = self.row_base_in_stripe + row_group as u64 * self.row_index_stride;
        Ok(())
    }

    /// Consume this column's portion of a shared index entry sequence:
    /// presence positions first, then the data decoder's. Returns the slot
    /// where the next reader in the chain starts consuming.
    pub fn load_index_entries(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        let next = self.present.load_positions(entries, start)?;
        self.decoder_mut()?.load_positions(entries, next)
    }

    /// Advance the data decoder past `non_null_count` physically stored
    /// values without decoding them. The latest-read cache is untouched.
    pub fn skip_values(&mut self, non_null_count: u64) -> Result<()> {
        self.decoder_mut()?.skip(non_null_count)
    }

    /// Decode the presence flag for the next row, making it the current
    /// row.
    pub fn advance_row(&mut self) -> Result<bool> {
        let present = self.present.advance()?;
        self.row_cursor += 1;
        Ok(present)
    }

    /// Whether the current row holds a value.
    pub fn value_present(&self) -> bool {
        self.present.value_present()
    }

    /// The core laziness primitive. With `read_stream` false, returns the
    /// cached latest value without touching the decoder. With true,
    /// performs exactly one physical read and caches it; reading a row the
    /// presence flag marks absent is a caller contract violation and
    /// errors immediately.
    pub fn read_next(&mut self, read_stream: bool) -> Result<D::Value> {
        if !read_stream {
            return Ok(self.latest);
        }
        ensure!(
            self.present.value_present(),
            error::ValueNotPresentSnafu {
                column: self.column_id
            }
        );
        let value = self.decoder_mut()?.read_one()?;
        self.latest = value;
        Ok(value)
    }

    /// Materialize the current row: `None` for an absent row (no physical
    /// read), otherwise exactly one physical read, written into `previous`
    /// when supplied.
    pub fn materialize(
        &mut self,
        previous: Option<ValueCell<D::Value>>,
    ) -> Result<Option<ValueCell<D::Value>>> {
        if !self.present.value_present() {
            return Ok(None);
        }
        let value = self.read_next(true)?;
        Ok(Some(fill(previous, value)))
    }

    /// Wrap the latest-read cache without any physical read.
    pub fn materialize_latest(&self, previous: Option<ValueCell<D::Value>>) -> ValueCell<D::Value> {
        fill(previous, self.latest)
    }

    /// Position the reader on absolute row `row`, decoding its presence
    /// flag. Seeks to the containing row group when moving backwards or
    /// across a group boundary, then walks presence forward and bulk-skips
    /// the intervening non-null values. `row` must not have been visited
    /// yet unless a row index is loaded.
    pub fn seek_to_row(&mut self, row: u64) -> Result<bool> {
        ensure!(
            row >= self.row_base_in_stripe,
            error::InvalidInputSnafu {
                msg: format!("row {row} is before the bound stripe"),
            }
        );
        let stride = self.row_index_stride;
        let target_group = match stride {
            0 => 0,
            _ => ((row - self.row_base_in_stripe) / stride) as usize,
        };
        let cursor_group = match stride {
            0 => 0,
            _ => ((self.row_cursor - self.row_base_in_stripe) / stride) as usize,
        };
        if row < self.row_cursor || target_group != cursor_group {
            ensure!(
                stride != 0,
                error::InvalidInputSnafu {
                    msg: "cannot reposition backwards without a row index",
                }
            );
            self.seek(target_group)?;
        }
        let mut non_null = 0u64;
        while self.row_cursor < row {
            if self.present.advance()? {
                non_null += 1;
            }
            self.row_cursor += 1;
        }
        if non_null > 0 {
            self.decoder_mut()?.skip(non_null)?;
        }
        self.advance_row()
    }

    /// Release the stripe binding and any index tables it holds. Safe to
    /// call repeatedly and without a prior bind.
    pub fn release(&mut self) {
        self.present.release();
        self.decoder = None;
    }
}

fn fill<T>(previous: Option<ValueCell<T>>, value: T) -> ValueCell<T> {
    match previous {
        Some(mut cell) => {
            cell.set(value);
            cell
        }
        None => ValueCell::new(value),
    }
}

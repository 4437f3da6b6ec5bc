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

//! Decoders for the run length encoded streams of a stripe, driven one
//! value at a time with support for bulk skip and row-group repositioning.
//!
//! A row index entry records, for every decoding layer of a stream, the
//! state needed to resume at a row group boundary. Each layer consumes a
//! fixed number of position slots per entry, starting at a slot offset
//! shared across entries, and hands the next offset to the layer above it.

pub mod boolean;
pub mod byte;

use bytes::Bytes;
use snafu::OptionExt;

use crate::error::{self, Result};
use crate::proto::RowIndexEntry;

/// Collect slot `slot` of every entry's recorded positions.
pub(crate) fn entry_positions(entries: &[RowIndexEntry], slot: usize) -> Result<Vec<u64>> {
    entries
        .iter()
        .map(|entry| {
            entry.positions.get(slot).copied().with_context(|| {
                error::OutOfSpecSnafu {
                    msg: format!("row index entry is missing position slot {slot}"),
                }
            })
        })
        .collect()
}

/// Cursor over one stream's bytes with row-group repositioning.
///
/// Consumes one position slot per row index entry: the byte offset to
/// resume reading from.
pub(crate) struct StreamCursor {
    data: Bytes,
    pos: usize,
    positions: Vec<u64>,
}

impl StreamCursor {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            positions: vec![],
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self
            .data
            .get(self.pos)
            .copied()
            .context(error::UnexpectedEofSnafu)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn skip_bytes(&mut self, count: usize) -> Result<()> {
        if self.data.len() - self.pos < count {
            return error::UnexpectedEofSnafu.fail();
        }
        self.pos += count;
        Ok(())
    }

    pub fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        self.positions = entry_positions(entries, start)?;
        Ok(start + 1)
    }

    pub fn seek(&mut self, row_group: usize) -> Result<()> {
        let pos = *self
            .positions
            .get(row_group)
            .context(error::SeekOutOfRangeSnafu { row_group })? as usize;
        if pos > self.data.len() {
            return error::OutOfSpecSnafu {
                msg: format!("recorded stream position {pos} beyond stream end"),
            }
            .fail();
        }
        self.pos = pos;
        Ok(())
    }
}

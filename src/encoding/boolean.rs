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

use bytes::Bytes;
use snafu::OptionExt;

use super::byte::{ByteRleDecoder, ByteRleEncoder};
use super::entry_positions;
use crate::error::{self, Result};
use crate::proto::RowIndexEntry;

/// Bit-field decoder: one bit per value, MSB first, over Byte RLE bytes.
///
/// Consumes three position slots per row index entry: the Byte RLE pair,
/// then the count of bits of the boundary byte already consumed.
pub struct BooleanDecoder {
    bytes: ByteRleDecoder,
    /// Byte currently being unpacked, addressed MSB down by `bits_left`.
    current: u8,
    bits_left: usize,
    bit_offsets: Vec<u64>,
}

impl BooleanDecoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            bytes: ByteRleDecoder::new(data),
            current: 0,
            bits_left: 0,
            bit_offsets: vec![],
        }
    }

    /// Decode the next bit, pulling a fresh byte from the underlying run
    /// when the current one is exhausted.
    pub fn next_bit(&mut self) -> Result<bool> {
        if self.bits_left == 0 {
            self.current = self.bytes.read_one()?;
            self.bits_left = 8;
        }
        self.bits_left -= 1;
        Ok((self.current >> self.bits_left) & 1 == 1)
    }

    /// Advance past `count` bits without emitting them.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let buffered = count.min(self.bits_left as u64);
        self.bits_left -= buffered as usize;
        let mut left = count - buffered;

        self.bytes.skip(left / 8)?;
        left %= 8;
        for _ in 0..left {
            self.next_bit()?;
        }
        Ok(())
    }

    /// Reposition to the start of a row group recorded by `load_positions`.
    pub fn seek(&mut self, row_group: usize) -> Result<()> {
        self.bytes.seek(row_group)?;
        self.bits_left = 0;
        let bit_offset = self
            .bit_offsets
            .get(row_group)
            .copied()
            .context(error::SeekOutOfRangeSnafu { row_group })?;
        for _ in 0..bit_offset {
            self.next_bit()?;
        }
        Ok(())
    }

    pub fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        let start = self.bytes.load_positions(entries, start)?;
        self.bit_offsets = entry_positions(entries, start)?;
        Ok(start + 1)
    }
}

/// Packs bits MSB first into bytes which are then Byte RLE encoded.
pub struct BooleanEncoder {
    bytes: ByteRleEncoder,
    /// Bits accumulated toward the next whole byte, newest lowest.
    current: u8,
    bits_used: usize,
}

impl BooleanEncoder {
    pub fn new() -> Self {
        Self {
            bytes: ByteRleEncoder::new(),
            current: 0,
            bits_used: 0,
        }
    }

    pub fn append(&mut self, value: bool) {
        self.current = self.current << 1 | value as u8;
        self.bits_used += 1;
        if self.bits_used == 8 {
            self.bytes.write_one(self.current);
            self.current = 0;
            self.bits_used = 0;
        }
    }

    /// Record the resume state for a row group boundary: the Byte RLE pair,
    /// then bits of the boundary byte already appended.
    pub fn record_position(&self, positions: &mut Vec<u64>) {
        self.bytes.record_position(positions);
        positions.push(self.bits_used as u64);
    }

    /// Produce the encoded stream bytes, zero padding any trailing partial
    /// byte, and reset internal state.
    pub fn finish(&mut self) -> Bytes {
        if self.bits_used > 0 {
            self.bytes.write_one(self.current << (8 - self.bits_used));
            self.current = 0;
            self.bits_used = 0;
        }
        self.bytes.take_inner()
    }
}

impl Default for BooleanEncoder {
    fn default() -> Self {
        Self::new()
    }
}

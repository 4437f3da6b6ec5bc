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

use bytes::{BufMut, Bytes, BytesMut};
use snafu::OptionExt;

use super::{entry_positions, StreamCursor};
use crate::error::{self, Result};
use crate::proto::RowIndexEntry;

const MIN_REPEAT_LENGTH: usize = 3;
const MAX_REPEAT_LENGTH: usize = 130;
const MAX_LITERAL_LENGTH: usize = 128;

/// Byte RLE decoder driven one value at a time.
///
/// The stream alternates single-byte headers and their payload: a header
/// below 0x80 marks a run of `header + 3` copies of the byte that follows,
/// anything else marks `256 - header` literal bytes. Nothing is buffered;
/// a literal byte is read from the stream at the moment it is demanded.
///
/// Consumes two position slots per row index entry: the stream byte offset
/// of the sequence containing the boundary, and the count of values of
/// that sequence already consumed at the boundary.
pub struct ByteRleDecoder {
    input: StreamCursor,
    /// Values not yet consumed from the current sequence.
    remaining: usize,
    /// Repeated value of the current sequence, `None` inside literals.
    run_value: Option<u8>,
    sequence_offsets: Vec<u64>,
}

impl ByteRleDecoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            input: StreamCursor::new(data),
            remaining: 0,
            run_value: None,
            sequence_offsets: vec![],
        }
    }

    fn next_sequence(&mut self) -> Result<()> {
        let header = self.input.read_u8()?;
        if header < 0x80 {
            self.remaining = header as usize + MIN_REPEAT_LENGTH;
            self.run_value = Some(self.input.read_u8()?);
        } else {
            self.remaining = 0x100 - header as usize;
            self.run_value = None;
        }
        Ok(())
    }

    pub fn read_one(&mut self) -> Result<u8> {
        if self.remaining == 0 {
            self.next_sequence()?;
        }
        self.remaining -= 1;
        match self.run_value {
            Some(value) => Ok(value),
            None => self.input.read_u8(),
        }
    }

    /// Advance past `count` values without emitting them. Skipped runs
    /// cost nothing; skipped literal bytes are stepped over unread.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let mut left = count as usize;
        while left > 0 {
            if self.remaining == 0 {
                self.next_sequence()?;
            }
            let taken = left.min(self.remaining);
            if self.run_value.is_none() {
                self.input.skip_bytes(taken)?;
            }
            self.remaining -= taken;
            left -= taken;
        }
        Ok(())
    }

    /// Reposition to the start of a row group recorded by `load_positions`.
    pub fn seek(&mut self, row_group: usize) -> Result<()> {
        self.input.seek(row_group)?;
        self.remaining = 0;
        self.run_value = None;
        let consumed = self
            .sequence_offsets
            .get(row_group)
            .copied()
            .context(error::SeekOutOfRangeSnafu { row_group })?;
        self.skip(consumed)
    }

    pub fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        let start = self.input.load_positions(entries, start)?;
        self.sequence_offsets = entry_positions(entries, start)?;
        Ok(start + 1)
    }
}

/// Incrementally encode bytes as runs and literal lists.
///
/// Values collect in a pending buffer while the encoder watches the
/// stretch of equal values at its tail. Once three trailing values match,
/// everything before them is committed as literals and the buffer carries
/// the run until it breaks or reaches the 130 value cap; a buffer that
/// fills to 128 values without a maturing tail is committed as literals
/// wholesale.
pub struct ByteRleEncoder {
    writer: BytesMut,
    /// Values awaiting commitment to an output sequence.
    pending: Vec<u8>,
    /// Length of the stretch of equal values at the tail of `pending`.
    tail_run: usize,
}

impl ByteRleEncoder {
    pub fn new() -> Self {
        Self {
            writer: BytesMut::new(),
            pending: Vec::with_capacity(MAX_REPEAT_LENGTH),
            tail_run: 0,
        }
    }

    pub fn write_one(&mut self, value: u8) {
        // Once the tail matures, pending holds nothing but the run.
        if self.tail_run >= MIN_REPEAT_LENGTH && self.pending.last() != Some(&value) {
            self.commit_run();
        }
        if self.pending.last() == Some(&value) {
            self.tail_run += 1;
        } else {
            self.tail_run = 1;
        }
        self.pending.push(value);

        if self.tail_run == MIN_REPEAT_LENGTH && self.pending.len() > self.tail_run {
            let literals = self.pending.len() - self.tail_run;
            self.commit_literals(literals);
        } else if self.tail_run == MAX_REPEAT_LENGTH {
            self.commit_run();
        } else if self.pending.len() == MAX_LITERAL_LENGTH && self.tail_run < MIN_REPEAT_LENGTH {
            self.commit_literals(MAX_LITERAL_LENGTH);
        }
    }

    pub fn write_slice(&mut self, values: &[u8]) {
        for &value in values {
            self.write_one(value);
        }
    }

    /// Record the resume state for a row group boundary: bytes already
    /// committed, then values still pending in the uncommitted sequence.
    pub fn record_position(&self, positions: &mut Vec<u64>) {
        positions.push(self.writer.len() as u64);
        positions.push(self.pending.len() as u64);
    }

    /// Headers [0, 127] encode run lengths [3, 130].
    fn commit_run(&mut self) {
        self.writer
            .put_u8((self.pending.len() - MIN_REPEAT_LENGTH) as u8);
        self.writer.put_u8(self.pending[0]);
        self.pending.clear();
        self.tail_run = 0;
    }

    /// Headers [0xff, 0x80] encode literal counts [1, 128].
    fn commit_literals(&mut self, count: usize) {
        self.writer.put_u8((count as u8).wrapping_neg());
        self.writer.put_slice(&self.pending[..count]);
        self.pending.drain(..count);
        if self.pending.is_empty() {
            self.tail_run = 0;
        }
    }

    /// Take the encoded bytes, replacing them with an empty buffer.
    pub fn take_inner(&mut self) -> Bytes {
        if self.tail_run >= MIN_REPEAT_LENGTH {
            self.commit_run();
        } else if !self.pending.is_empty() {
            self.commit_literals(self.pending.len());
        }
        std::mem::take(&mut self.writer).into()
    }
}

impl Default for ByteRleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn decode_all(data: &'static [u8], len: usize) -> Vec<u8> {
        let mut decoder = ByteRleDecoder::new(Bytes::from_static(data));
        (0..len).map(|_| decoder.read_one().unwrap()).collect()
    }

    #[test]
    fn read_one_runs_and_literals() {
        assert_eq!(decode_all(&[0x61, 0x00], 100), vec![0; 100]);
        assert_eq!(decode_all(&[0x01, 0x01], 4), vec![1; 4]);
        assert_eq!(decode_all(&[0xfe, 0x44, 0x45], 2), vec![0x44, 0x45]);
    }

    #[test]
    fn read_past_end_is_eof() {
        let mut decoder = ByteRleDecoder::new(Bytes::from_static(&[0x01, 0x07]));
        for _ in 0..4 {
            decoder.read_one().unwrap();
        }
        assert!(decoder.read_one().is_err());
    }

    #[test]
    fn skip_within_and_across_runs() {
        // 100 zeros, then literals [0x44, 0x45]
        let data = Bytes::from_static(&[0x61, 0x00, 0xfe, 0x44, 0x45]);

        let mut decoder = ByteRleDecoder::new(data.clone());
        decoder.skip(99).unwrap();
        assert_eq!(decoder.read_one().unwrap(), 0);
        assert_eq!(decoder.read_one().unwrap(), 0x44);

        let mut decoder = ByteRleDecoder::new(data);
        decoder.skip(101).unwrap();
        assert_eq!(decoder.read_one().unwrap(), 0x45);
    }

    #[test]
    fn seek_restores_recorded_state() {
        // 100 zeros, then literals [0x44, 0x45]
        let data = Bytes::from_static(&[0x61, 0x00, 0xfe, 0x44, 0x45]);
        let entries = vec![
            RowIndexEntry {
                positions: vec![0, 0],
            },
            // 50 values into the zero run
            RowIndexEntry {
                positions: vec![0, 50],
            },
            // Start of the literal sequence
            RowIndexEntry {
                positions: vec![2, 0],
            },
        ];

        let mut decoder = ByteRleDecoder::new(data);
        assert_eq!(decoder.load_positions(&entries, 0).unwrap(), 2);

        decoder.seek(2).unwrap();
        assert_eq!(decoder.read_one().unwrap(), 0x44);

        decoder.seek(1).unwrap();
        decoder.skip(49).unwrap();
        assert_eq!(decoder.read_one().unwrap(), 0);
        assert_eq!(decoder.read_one().unwrap(), 0x44);

        assert!(decoder.seek(3).is_err());
    }

    #[test]
    fn encoder_positions_are_seekable() {
        let mut encoder = ByteRleEncoder::new();
        let values: Vec<u8> = (0..400u32).map(|i| (i / 7) as u8).collect();

        let mut entries = vec![];
        for (i, &value) in values.iter().enumerate() {
            if i % 100 == 0 {
                let mut positions = vec![];
                encoder.record_position(&mut positions);
                entries.push(RowIndexEntry { positions });
            }
            encoder.write_one(value);
        }
        let data = encoder.take_inner();

        let mut decoder = ByteRleDecoder::new(data);
        decoder.load_positions(&entries, 0).unwrap();
        for group in (0..4).rev() {
            decoder.seek(group).unwrap();
            assert_eq!(decoder.read_one().unwrap(), values[group * 100]);
            assert_eq!(decoder.read_one().unwrap(), values[group * 100 + 1]);
        }
    }

    #[test]
    fn encoder_splits_literals_before_a_maturing_run() {
        let mut encoder = ByteRleEncoder::new();
        encoder.write_slice(&[9, 7, 5, 5, 5, 5]);
        let data = encoder.take_inner();
        // Two literals, then a run of four
        assert_eq!(data.as_ref(), &[0xfe, 9, 7, 0x01, 5]);
    }

    fn roundtrip_helper(values: &[u8]) -> Vec<u8> {
        let mut encoder = ByteRleEncoder::new();
        encoder.write_slice(values);
        let mut decoder = ByteRleDecoder::new(encoder.take_inner());
        (0..values.len())
            .map(|_| decoder.read_one().unwrap())
            .collect()
    }

    #[derive(Debug, Clone)]
    enum ByteSequence {
        Run(u8, usize),
        Literals(Vec<u8>),
    }

    fn byte_sequence_strategy() -> impl Strategy<Value = ByteSequence> {
        // We limit the max length of the sequences to 140 to try get more interleaving
        prop_oneof![
            (any::<u8>(), 1..140_usize).prop_map(|(a, b)| ByteSequence::Run(a, b)),
            prop::collection::vec(any::<u8>(), 1..140).prop_map(ByteSequence::Literals)
        ]
    }

    fn generate_bytes_from_sequences(sequences: Vec<ByteSequence>) -> Vec<u8> {
        let mut bytes = vec![];
        for sequence in sequences {
            match sequence {
                ByteSequence::Run(value, length) => {
                    bytes.extend(std::iter::repeat(value).take(length))
                }
                ByteSequence::Literals(literals) => bytes.extend(literals),
            }
        }
        bytes
    }

    proptest! {
        #[test]
        fn roundtrip_byte_rle_biased(
            sequences in prop::collection::vec(byte_sequence_strategy(), 1..50)
        ) {
            // Intentionally introduce run sequences to not be entirely random literals
            let values = generate_bytes_from_sequences(sequences);
            prop_assert_eq!(roundtrip_helper(&values), values);
        }

        #[test]
        fn skip_then_read_matches_full_decode(
            sequences in prop::collection::vec(byte_sequence_strategy(), 1..20),
            skip_fraction in 0.0f64..1.0
        ) {
            let values = generate_bytes_from_sequences(sequences);
            prop_assume!(values.len() > 1);
            let skipped = (values.len() as f64 * skip_fraction) as usize % (values.len() - 1);

            let mut encoder = ByteRleEncoder::new();
            encoder.write_slice(&values);
            let mut decoder = ByteRleDecoder::new(encoder.take_inner());
            decoder.skip(skipped as u64).unwrap();
            prop_assert_eq!(decoder.read_one().unwrap(), values[skipped]);
        }
    }
}

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

use snafu::{ensure, OptionExt};

use super::ValueDecoder;
use crate::encoding::byte::ByteRleDecoder;
use crate::error::{self, Result};
use crate::proto::{column_encoding, stream::Kind, ColumnEncoding, RowIndexEntry};
use crate::stripe::StreamMap;

/// Lazily decodes a byte (tinyint) column.
pub type LazyByteReader = super::LazyColumnReader<ByteValueDecoder>;

/// DATA stream of a byte column: Byte RLE, one value per non-null row.
pub struct ByteValueDecoder {
    decoder: ByteRleDecoder,
}

impl ValueDecoder for ByteValueDecoder {
    type Value = i8;

    const INITIAL: i8 = 0;

    fn bind(column_id: u32, streams: &StreamMap, encoding: &ColumnEncoding) -> Result<Self> {
        ensure!(
            encoding.kind() == column_encoding::Kind::Direct,
            error::OutOfSpecSnafu {
                msg: format!("byte column {column_id} must be direct encoded"),
            }
        );
        let data = streams
            .get_opt(column_id, Kind::Data)
            .context(error::StreamBindingSnafu {
                column: column_id,
                kind: Kind::Data,
            })?;
        Ok(Self {
            decoder: ByteRleDecoder::new(data),
        })
    }

    fn read_one(&mut self) -> Result<i8> {
        Ok(self.decoder.read_one()? as i8)
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        self.decoder.skip(count)
    }

    fn seek(&mut self, row_group: usize) -> Result<()> {
        self.decoder.seek(row_group)
    }

    fn load_positions(&mut self, entries: &[RowIndexEntry], start: usize) -> Result<usize> {
        self.decoder.load_positions(entries, start)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::encoding::boolean::BooleanEncoder;
    use crate::encoding::byte::ByteRleEncoder;
    use crate::reader::ValueCell;

    const COLUMN: u32 = 2;

    fn stripe(present: Option<&[bool]>, values: &[i8]) -> StreamMap {
        let mut streams = StreamMap::new();
        if let Some(present) = present {
            let mut encoder = BooleanEncoder::new();
            for &value in present {
                encoder.append(value);
            }
            streams.insert(COLUMN, Kind::Present, encoder.finish());
        }
        let mut encoder = ByteRleEncoder::new();
        for &value in values {
            encoder.write_one(value as u8);
        }
        streams.insert(COLUMN, Kind::Data, encoder.take_inner());
        streams
    }

    fn bind(streams: &StreamMap) -> LazyByteReader {
        let mut reader = LazyByteReader::new(COLUMN, 0);
        let encodings = vec![ColumnEncoding::default(); 3];
        reader
            .start_stripe(streams, &encodings, &HashMap::new(), 0)
            .unwrap();
        reader
    }

    #[test]
    fn scan_with_nulls_and_negative_values() {
        let present = [true, false, true, true, false, true];
        let values = [-128i8, -1, 0, 127];
        let streams = stripe(Some(&present), &values);
        let mut reader = bind(&streams);

        let mut out = vec![];
        for _ in 0..present.len() {
            reader.advance_row().unwrap();
            out.push(reader.materialize(None).unwrap().map(ValueCell::into_inner));
        }
        assert_eq!(
            out,
            vec![Some(-128), None, Some(-1), Some(0), None, Some(127)]
        );
        reader.release();
    }

    #[test]
    fn cache_defaults_to_zero_and_follows_reads() {
        let streams = stripe(None, &[42, 7]);
        let mut reader = bind(&streams);

        assert_eq!(reader.read_next(false).unwrap(), 0);
        reader.advance_row().unwrap();
        assert_eq!(reader.read_next(true).unwrap(), 42);
        assert_eq!(reader.read_next(false).unwrap(), 42);
        assert_eq!(*reader.materialize_latest(None).value(), 42);
    }

    #[test]
    fn skip_values_fast_forwards_the_run() {
        let values: Vec<i8> = (0..100).map(|i| (i % 10) as i8).collect();
        let streams = stripe(None, &values);
        let mut reader = bind(&streams);

        reader.skip_values(57).unwrap();
        reader.advance_row().unwrap();
        assert_eq!(reader.read_next(true).unwrap(), values[57]);
    }
}

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
use crate::encoding::boolean::BooleanDecoder;
use crate::error::{self, Result};
use crate::proto::{column_encoding, stream::Kind, ColumnEncoding, RowIndexEntry};
use crate::stripe::StreamMap;

/// Lazily decodes a bit-packed boolean column.
pub type LazyBooleanReader = super::LazyColumnReader<BooleanValueDecoder>;

/// DATA stream of a boolean column: one bit per non-null row.
pub struct BooleanValueDecoder {
    decoder: BooleanDecoder,
}

impl ValueDecoder for BooleanValueDecoder {
    type Value = bool;

    const INITIAL: bool = true;

    fn bind(column_id: u32, streams: &StreamMap, encoding: &ColumnEncoding) -> Result<Self> {
        ensure!(
            encoding.kind() == column_encoding::Kind::Direct,
            error::OutOfSpecSnafu {
                msg: format!("boolean column {column_id} must be direct encoded"),
            }
        );
        let data = streams
            .get_opt(column_id, Kind::Data)
            .context(error::StreamBindingSnafu {
                column: column_id,
                kind: Kind::Data,
            })?;
        Ok(Self {
            decoder: BooleanDecoder::new(data),
        })
    }

    fn read_one(&mut self) -> Result<bool> {
        self.decoder.next_bit()
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

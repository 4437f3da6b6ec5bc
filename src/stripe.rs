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

use std::collections::HashMap;

use bytes::Bytes;
use prost::Message;
use snafu::ResultExt;

use crate::error::{self, Result};
use crate::proto::{stream::Kind, RowIndex, StripeFooter};

/// Byte ranges of one stripe's streams, keyed by (column id, stream kind).
///
/// Each range is handed out already decompressed; decoders slice and read
/// it without further I/O. Resolution happens once per stripe and readers
/// hold the resolved ranges until the next stripe is bound.
#[derive(Debug, Default, Clone)]
pub struct StreamMap {
    inner: HashMap<(u32, Kind), Bytes>,
}

impl StreamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice a stripe's contiguous index and data sections into per-stream
    /// byte ranges by walking the footer's stream list in file order.
    pub fn from_footer(stripe: Bytes, footer: &StripeFooter) -> Result<Self> {
        let mut inner = HashMap::new();
        let mut offset = 0usize;
        for stream in &footer.streams {
            let length = stream.length() as usize;
            let end = offset.checked_add(length).filter(|end| *end <= stripe.len());
            let end = match end {
                Some(end) => end,
                None => {
                    return error::OutOfSpecSnafu {
                        msg: format!(
                            "stream {:?} of column {} overruns the stripe",
                            stream.kind(),
                            stream.column()
                        ),
                    }
                    .fail()
                }
            };
            inner.insert((stream.column(), stream.kind()), stripe.slice(offset..end));
            offset = end;
        }
        Ok(Self { inner })
    }

    pub fn insert(&mut self, column: u32, kind: Kind, data: Bytes) {
        self.inner.insert((column, kind), data);
    }

    pub fn get_opt(&self, column: u32, kind: Kind) -> Option<Bytes> {
        self.inner.get(&(column, kind)).cloned()
    }

    /// Decode the ROW_INDEX stream of every column carrying one.
    pub fn decode_row_indexes(&self) -> Result<HashMap<u32, RowIndex>> {
        self.inner
            .iter()
            .filter(|((_, kind), _)| *kind == Kind::RowIndex)
            .map(|((column, _), data)| {
                let index = RowIndex::decode(data.clone()).context(error::DecodeProtoSnafu)?;
                Ok((*column, index))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::proto::{RowIndexEntry, Stream};

    fn stream(column: u32, kind: Kind, length: u64) -> Stream {
        Stream {
            kind: Some(kind as i32),
            column: Some(column),
            length: Some(length),
        }
    }

    #[test]
    fn from_footer_slices_in_file_order() {
        let stripe = Bytes::from_static(&[1, 2, 3, 4, 5, 6]);
        let footer = StripeFooter {
            streams: vec![
                stream(1, Kind::RowIndex, 1),
                stream(1, Kind::Present, 2),
                stream(1, Kind::Data, 3),
            ],
            columns: vec![],
        };

        let streams = StreamMap::from_footer(stripe, &footer).unwrap();
        assert_eq!(
            streams.get_opt(1, Kind::RowIndex),
            Some(Bytes::from_static(&[1]))
        );
        assert_eq!(
            streams.get_opt(1, Kind::Present),
            Some(Bytes::from_static(&[2, 3]))
        );
        assert_eq!(
            streams.get_opt(1, Kind::Data),
            Some(Bytes::from_static(&[4, 5, 6]))
        );
        assert_eq!(streams.get_opt(2, Kind::Data), None);
    }

    #[test]
    fn from_footer_rejects_overrunning_stream() {
        let stripe = Bytes::from_static(&[0, 0]);
        let footer = StripeFooter {
            streams: vec![stream(1, Kind::Data, 3)],
            columns: vec![],
        };
        let err = StreamMap::from_footer(stripe, &footer).unwrap_err();
        assert!(err.to_string().contains("overruns"));
    }

    #[test]
    fn decode_row_indexes_per_column() {
        let index = RowIndex {
            entry: vec![
                RowIndexEntry {
                    positions: vec![0, 0, 0],
                },
                RowIndexEntry {
                    positions: vec![2, 1, 4],
                },
            ],
        };
        let mut streams = StreamMap::new();
        streams.insert(3, Kind::RowIndex, index.encode_to_vec().into());
        streams.insert(3, Kind::Data, Bytes::from_static(&[0xff, 0x80]));

        let decoded = streams.decode_row_indexes().unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[&3], index);
    }

    #[test]
    fn decode_row_indexes_surfaces_corruption() {
        let mut streams = StreamMap::new();
        // Truncated varint, not a valid message.
        streams.insert(1, Kind::RowIndex, Bytes::from_static(&[0x0a, 0xff]));
        assert!(streams.decode_row_indexes().is_err());
    }
}

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

//! Lazy, seekable per-column readers for ORC-style stripe data.
//!
//! A stripe stores rows column major, each column as one or more run
//! length encoded streams. The readers here materialize values one row at
//! a time, on demand: a row that is filtered out elsewhere never pays for
//! a physical decode. Each reader keeps its presence and data cursors
//! aligned across any interleaving of advance, materialize, bulk skip and
//! row-group seek, the latter driven by the stripe's row index.
//!
//! # Example usage
//!
//! ```
//! use std::collections::HashMap;
//!
//! use orc_lazy::encoding::boolean::BooleanEncoder;
//! use orc_lazy::proto::{stream::Kind, ColumnEncoding};
//! use orc_lazy::{LazyBooleanReader, StreamMap};
//!
//! # fn main() -> orc_lazy::Result<()> {
//! let mut encoder = BooleanEncoder::new();
//! for value in [true, false, true] {
//!     encoder.append(value);
//! }
//!
//! let mut streams = StreamMap::new();
//! streams.insert(1, Kind::Data, encoder.finish());
//! let encodings = vec![ColumnEncoding::default(); 2];
//!
//! let mut reader = LazyBooleanReader::new(1, 10_000);
//! reader.start_stripe(&streams, &encodings, &HashMap::new(), 0)?;
//!
//! let mut rows = Vec::new();
//! for _ in 0..3 {
//!     reader.advance_row()?;
//!     rows.push(reader.materialize(None)?.map(|cell| cell.into_inner()));
//! }
//! assert_eq!(rows, vec![Some(true), Some(false), Some(true)]);
//! reader.release();
//! # Ok(())
//! # }
//! ```

pub mod encoding;
pub mod error;
pub mod proto;
pub mod reader;
pub mod stripe;

pub use error::{OrcError, Result};
pub use reader::boolean::LazyBooleanReader;
pub use reader::byte::LazyByteReader;
pub use reader::{LazyColumnReader, PresentTracker, ValueCell, ValueDecoder};
pub use stripe::StreamMap;

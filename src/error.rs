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

use snafu::prelude::*;
use snafu::Location;

use crate::proto::stream::Kind;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OrcError {
    #[snafu(display("Unexpected end of stream"))]
    UnexpectedEof {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Out of spec, message: {}", msg))]
    OutOfSpec {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid input, message: {}", msg))]
    InvalidInput {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Required {:?} stream missing for column {}", kind, column))]
    StreamBinding {
        column: u32,
        kind: Kind,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Cannot materialize column {}, no value present at current row", column))]
    ValueNotPresent {
        column: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Row group {} outside the loaded row index", row_group))]
    SeekOutOfRange {
        row_group: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to decode proto, source: {}", source))]
    DecodeProto {
        #[snafu(implicit)]
        location: Location,
        source: prost::DecodeError,
    },
}

pub type Result<T> = std::result::Result<T, OrcError>;

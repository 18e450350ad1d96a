// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Partition strategies and the layout planner.

mod function;
mod layout;
mod record;
mod strategy;
mod value;

pub use function::{PartitionFunction, Partitioner, TimeUnit};
pub use layout::{LayoutPath, NULL_VALUE, PartitionKey, decode_value, encode_value};
pub use record::Record;
pub use strategy::{FieldPartitioner, PartitionStrategy, PartitionStrategyBuilder};
pub use value::{KeyType, KeyValue};

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod commands;
pub mod common;

pub use commands::{
    CreateOptions, SchemaSource, create_command, delete_command, list_command, partitions_command,
    show_command,
};
pub use common::{RepoContext, parse_partition_spec};

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod create;
pub mod delete;
pub mod list;
pub mod partitions;
pub mod show;

pub use create::{CreateOptions, SchemaSource, create_command};
pub use delete::delete_command;
pub use list::list_command;
pub use partitions::partitions_command;
pub use show::show_command;

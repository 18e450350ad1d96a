// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::RepoContext;
use anyhow::{Context, Result};

/// List the leaf partitions of a dataset with their data file counts
pub async fn partitions_command<F>(ctx: &RepoContext, name: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let repo = ctx.open()?;
    let dataset = repo
        .load(name)
        .await
        .with_context(|| format!("Failed to load dataset {name}"))?;
    let strategy = dataset
        .descriptor()
        .partition_strategy()
        .with_context(|| format!("Dataset {name} is not partitioned"))?;

    for key in dataset.partitions().await? {
        let path = strategy.path_for_key(&key)?;
        let files = dataset.data_files(&key).await?;
        handler(&format!("{path}\t{} files", files.len()));
    }
    Ok(())
}

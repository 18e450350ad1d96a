// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::RepoContext;
use anyhow::{Result, bail};

pub async fn delete_command<F>(ctx: &RepoContext, name: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let repo = ctx.open()?;
    if !repo.delete(name).await? {
        bail!("Dataset {name} does not exist in {}", repo.location());
    }
    handler(&format!("Deleted {name}"));
    Ok(())
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::RepoContext;
use anyhow::Result;

/// List the datasets in a repository, one name per line
pub async fn list_command<F>(ctx: &RepoContext, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let repo = ctx.open()?;
    for name in repo.list().await? {
        handler(&name);
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::print_stdout)]

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cmd::{
    CreateOptions, RepoContext, SchemaSource, create_command, delete_command, list_command, partitions_command,
    show_command,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "dsrepo")]
struct Cli {
    /// YAML configuration file, applied over DSREPO_CONF
    #[arg(long, global = true)]
    conf: Option<PathBuf>,

    /// Repository URI, e.g. repo:file:warehouse or repo:hdfs://namenode:8020/data
    repository: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the datasets in the repository
    List,
    /// Show a dataset's descriptor
    Show {
        name: String,
    },
    /// Create a dataset
    Create(CreateArgs),
    /// Delete a dataset and its data
    Delete {
        name: String,
    },
    /// List a dataset's partitions
    Partitions {
        name: String,
    },
}

#[derive(Args)]
struct CreateArgs {
    name: String,

    /// Schema file or URL (Arrow schema JSON)
    #[arg(long, required_unless_present = "schema_from", conflicts_with = "schema_from")]
    schema: Option<String>,

    /// Take the schema from an existing Parquet or Arrow IPC file
    #[arg(long)]
    schema_from: Option<PathBuf>,

    /// Storage format (avro, parquet)
    #[arg(long)]
    format: Option<String>,

    /// Partition field as function:source:name[:arg]; repeat in order
    #[arg(long = "partition")]
    partitions: Vec<String>,

    /// Data location instead of <repository>/<name>
    #[arg(long)]
    location: Option<String>,
}

impl CreateArgs {
    fn options(&self) -> CreateOptions {
        let schema = match (&self.schema, &self.schema_from) {
            (_, Some(path)) => SchemaSource::DataFile(path.clone()),
            (Some(arg), None) => SchemaSource::from_arg(arg),
            // clap requires one of the two
            (None, None) => SchemaSource::File(PathBuf::new()),
        };
        CreateOptions {
            schema,
            format: self.format.clone(),
            partitions: self.partitions.clone(),
            location: self.location.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let ctx = RepoContext::from_args(&cli.repository, cli.conf.clone())?;
    let print = |line: &str| println!("{line}");

    match &cli.command {
        Commands::List => list_command(&ctx, print).await,
        Commands::Show { name } => show_command(&ctx, name, |text| print!("{text}")).await,
        Commands::Create(args) => create_command(&ctx, &args.name, &args.options(), print).await,
        Commands::Delete { name } => delete_command(&ctx, name, print).await,
        Commands::Partitions { name } => partitions_command(&ctx, name, print).await,
    }
}

//! docstore inspection tool
//!
//! Decodes headers, dumps reconstructed state, snapshots and compacts
//! database files.

use std::fs::File;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use docstore::{
    catalog, snapshot, AccessMode, Backend, DocStoreError, FrameStorage, LineStorage, Result,
    Storage, StorageConfig,
};
use tracing_subscriber::{fmt, EnvFilter};

/// docstore inspector
#[derive(Parser, Debug)]
#[command(name = "docstore-inspect")]
#[command(about = "Inspect and maintain docstore database files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the catalog header of a frame file
    Header {
        /// Database file
        file: PathBuf,
    },

    /// Print the reconstructed state as JSON
    Dump {
        #[command(flatten)]
        target: Target,
    },

    /// Write the current state to `<file>.0`
    Snapshot {
        #[command(flatten)]
        target: Target,
    },

    /// Rewrite the log in place with one record per table
    Compact {
        #[command(flatten)]
        target: Target,

        /// Keep the old log as `<file>.bak`
        #[arg(long)]
        archive: bool,
    },
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Database file
    file: PathBuf,

    /// On-disk layout
    #[arg(short, long, value_enum, default_value = "line")]
    backend: Kind,

    /// Table name (frame backend)
    #[arg(short, long, default_value = "_default")]
    table: String,

    /// Pretty-print indent
    #[arg(long)]
    indent: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Frame,
    Line,
    Json,
}

impl Target {
    fn config(&self, mode: AccessMode, archive: bool) -> StorageConfig {
        let backend = match self.backend {
            Kind::Frame => Backend::Frame {
                table: self.table.clone(),
            },
            Kind::Line => Backend::Line { tables: Vec::new() },
            Kind::Json => Backend::Json,
        };

        let mut builder = StorageConfig::builder()
            .path(&self.file)
            .backend(backend)
            .access_mode(mode)
            .archive_on_compact(archive);
        if let Some(indent) = self.indent {
            builder = builder.json_indent(indent);
        }
        builder.build()
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,docstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Header { file } => {
            let catalog = catalog::read_from(&mut File::open(&file)?)?;
            println!("version: {}", catalog.version());
            println!("tables ({}):", catalog.len());
            for name in catalog.names() {
                println!("  {}", name);
            }
            println!("header bytes used: {}", catalog.encoded_len());
        }

        Commands::Dump { target } => {
            let mut storage = target.config(AccessMode::ReadOnly, false).open()?;
            match storage.read()? {
                Some(state) => {
                    let json = serde_json::to_string_pretty(&state)
                        .map_err(|e| DocStoreError::Serialization(e.to_string()))?;
                    println!("{}", json);
                }
                None => println!("(empty)"),
            }
            storage.close()?;
        }

        Commands::Snapshot { target } => {
            let mut storage = target.config(AccessMode::ReadOnly, false).open()?;
            match snapshot::compact(storage.as_mut())? {
                Some(path) => tracing::info!("Snapshot written to {}", path.display()),
                None => tracing::info!("Nothing to snapshot"),
            }
            storage.close()?;
        }

        Commands::Compact { target, archive } => {
            let config = target.config(AccessMode::ReadWrite, archive);
            match target.backend {
                Kind::Frame => {
                    let mut storage = FrameStorage::open(&config, &target.table)?;
                    storage.compact_in_place()?;
                    storage.close()?;
                }
                Kind::Line => {
                    let mut storage = LineStorage::open::<&str>(&config, &[])?;
                    storage.compact_in_place()?;
                    storage.close()?;
                }
                Kind::Json => {
                    return Err(DocStoreError::Unsupported(
                        "json files are rewritten on every write",
                    ))
                }
            }
            tracing::info!("Compacted {}", target.file.display());
        }
    }

    Ok(())
}

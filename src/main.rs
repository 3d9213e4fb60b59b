use std::io::Write;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datans::config::Config;
use datans::models::Node;
use datans::render;
use datans::resolve::{Module, Resolver, VFS_MARKER};
use datans::store::PackageStore;

#[derive(Parser)]
#[command(name = "datans")]
#[command(about = "Browse on-disk data packages by dotted name")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List store root directories, in search order
    Roots,
    /// List owners, or the packages of one owner
    Ls {
        /// Owner to list packages for
        owner: Option<String>,
    },
    /// Show the tree below a name, e.g. `acme.demo` or `acme.demo.meta`
    Show {
        /// Name relative to the root prefix
        path: String,

        /// Resolve in virtual file-system mode
        #[arg(long)]
        vfs: bool,
    },
    /// Write the data of a table or file to stdout
    ///
    /// Blobs are written as stored: gzip, bzip2 and HDF5 tables are checked
    /// for their format signature but not decoded.
    Cat {
        /// Name of a table or file, e.g. `acme.demo.prices`
        path: String,
    },
}

/// Initialize tracing with output to stderr; stdout carries command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "datans=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load();
    let resolver = Resolver::from_config(&config).context("Failed to set up resolver")?;

    match cli.command {
        Commands::Roots => {
            for root in resolver.store().store_roots()? {
                println!("{}", root.display());
            }
        }
        Commands::Ls { owner: None } => {
            for owner in resolver.store().owners()? {
                println!("{}", owner);
            }
        }
        Commands::Ls { owner: Some(owner) } => {
            for package in resolver.store().packages(&owner)? {
                println!("{}.{}", owner, package);
            }
        }
        Commands::Show { path, vfs } => {
            let fullname = if vfs {
                format!("{}.{}{}", resolver.root(), VFS_MARKER, path)
            } else {
                format!("{}.{}", resolver.root(), path)
            };
            let module = resolver
                .import(&fullname)?
                .ok_or_else(|| anyhow::anyhow!("Nothing found at {}", path))?;

            match module {
                Module::Package(package) => print!("{}", render::render_tree(&package)),
                Module::Namespace(namespace) => {
                    let owner = path.trim_start_matches(VFS_MARKER);
                    println!("{} ({})", owner, namespace.location.display());
                    for package in resolver.store().packages(owner)? {
                        println!("  {}.{}", owner, package);
                    }
                }
                Module::Member(member) => {
                    let node = member
                        .node()
                        .ok_or_else(|| anyhow::anyhow!("Nothing found at {}", path))?;
                    print!("{}", render::render_node(&member.path().join("."), node));
                    if let Some(data) = node.as_data() {
                        for blob in data.data_paths() {
                            println!("  {}", blob.display());
                        }
                    }
                }
            }
        }
        Commands::Cat { path } => {
            let fullname = format!("{}.{}", resolver.root(), path);
            let module = resolver
                .import(&fullname)?
                .ok_or_else(|| anyhow::anyhow!("Nothing found at {}", path))?;
            let Some(Node::Data(data)) = module.as_member().and_then(|m| m.node()) else {
                anyhow::bail!("{} is not a table or file", path);
            };

            let mut file = data
                .open(resolver.io())
                .with_context(|| format!("Failed to open data for {}", path))?;
            let mut stdout = std::io::stdout().lock();
            std::io::copy(&mut file, &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cluster_version_resolver::cluster::config_file::ClusterConfig;
use cluster_version_resolver::cluster::validator::ClusterValidator;
use cluster_version_resolver::config::{ResolverConfig, log_path};
use cluster_version_resolver::logging;
use cluster_version_resolver::version::service::{VersionCatalog, VersionService};
use cluster_version_resolver::version::types::ResolutionRequest;

#[derive(Parser)]
#[command(name = "cluster-version-resolver")]
#[command(version, about = "Resolve managed-cluster versions against the versions a control plane supports")]
struct Cli {
    /// Write log lines as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Channel considered when picking the latest version
    #[arg(long, global = true)]
    channel: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported versions for a cluster type
    List {
        cluster_type: String,
        /// Ignore cached versions
        #[arg(long)]
        refresh: bool,
    },
    /// Resolve a requested version (absent, "latest" or explicit)
    Resolve {
        cluster_type: String,
        version: Option<String>,
        /// Replace unsupported versions with the latest instead of failing
        #[arg(long)]
        auto_discover: bool,
    },
    /// Check every cluster in a YAML configuration file
    Validate {
        path: PathBuf,
        #[arg(long)]
        auto_discover: bool,
        /// Rewrite the file with the resolved versions. Key order within each
        /// entry is kept, but YAML comments are not preserved.
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(&log_path(), cli.json_logs)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ResolverConfig::from_env();
    if let Some(channel) = cli.channel {
        config.channel = channel;
    }
    let service = VersionService::from_config(&config);

    match cli.command {
        Command::List {
            cluster_type,
            refresh,
        } => {
            let supported = service.fetch_versions(&cluster_type, refresh).await?;
            let latest = service.policy().latest(&supported).ok();

            for record in &supported.records {
                let marker = match latest {
                    Some(l) if l.identifier() == record.identifier() => " (latest)",
                    _ if !record.available() => " (unavailable)",
                    _ => "",
                };
                println!("{}\t{}{}", record.identifier(), record.channel(), marker);
            }
        }
        Command::Resolve {
            cluster_type,
            version,
            auto_discover,
        } => {
            let request = ResolutionRequest::new(version.as_deref(), &cluster_type, auto_discover);
            let outcome = service.resolve(&request).await?;

            if let Some(warning) = &outcome.warning {
                eprintln!("warning: {}", warning);
            }
            println!("{}", outcome.resolved_version);
        }
        Command::Validate {
            path,
            auto_discover,
            write,
        } => {
            let mut document = ClusterConfig::load(&path)?;
            let report = ClusterValidator::new(&service, auto_discover)
                .validate(&document.clusters)
                .await?;

            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            for change in &report.changes {
                println!("{}", change);
            }

            if write && report.has_changes() {
                document.clusters = report.clusters;
                document.save(&path)?;
                println!("Updated {}", path.display());
            }
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xmss_hashsig::{
    BenchmarkMetrics, BenchmarkReport, KeyManager, ManagerConfig, SchemeConfig, Winternitz,
    XmssScheme,
};

#[derive(Parser)]
#[command(name = "xmss-bench")]
#[command(about = "Stateful XMSS signature benchmark and key rotation driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Time key generation, signing and verification
    Benchmark {
        /// Number of signatures to produce (at most 2^height)
        #[arg(short, long, default_value = "10")]
        signatures: usize,

        /// Tree height (2^height = signatures per key)
        #[arg(short, long, default_value = "10")]
        tree_height: u32,

        /// Winternitz parameter (4 or 16)
        #[arg(short, long, default_value = "16")]
        winternitz: u32,

        /// Also run with tree caching disabled (rebuild per signature)
        #[arg(long)]
        compare_uncached: bool,

        /// Output file for benchmark results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drive a key manager through rotations and print every root
    Rotate {
        /// Number of signatures to produce
        #[arg(short, long, default_value = "40")]
        signatures: usize,

        /// Tree height for each managed tree
        #[arg(short, long, default_value = "4")]
        tree_height: u32,

        /// JSON manager configuration; overrides --tree-height
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Benchmark {
            signatures,
            tree_height,
            winternitz,
            compare_uncached,
            output,
        } => {
            run_benchmark(signatures, tree_height, winternitz, compare_uncached, output)?;
        }
        Commands::Rotate {
            signatures,
            tree_height,
            config,
        } => {
            run_rotation(signatures, tree_height, config)?;
        }
    }

    Ok(())
}

fn run_benchmark(
    num_signatures: usize,
    tree_height: u32,
    winternitz: u32,
    compare_uncached: bool,
    output_file: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let config = SchemeConfig::new(tree_height, Winternitz::try_from(winternitz)?);
    let mut configs = vec![config.clone()];
    if compare_uncached {
        configs.push(SchemeConfig {
            cache_trees: false,
            ..config
        });
    }

    let mut report = BenchmarkReport::new();
    for config in configs {
        info!(
            "Benchmarking h={} w={} cache={} with {} signatures",
            config.height, winternitz, config.cache_trees, num_signatures
        );
        let scheme = XmssScheme::new(config)?;
        let metrics = BenchmarkMetrics::collect(&scheme, num_signatures).map_err(|e| {
            error!("Benchmark run failed: {}", e);
            e
        })?;
        report.add_metrics(metrics);
    }

    println!("{}", report.summary());

    if let Some(path) = output_file {
        report.save_json(&path)?;
        info!("Results saved to {}", path.display());
    }

    Ok(())
}

fn run_rotation(
    num_signatures: usize,
    tree_height: u32,
    config_file: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let config = match config_file {
        Some(path) => serde_json::from_str::<ManagerConfig>(&fs::read_to_string(path)?)?,
        None => ManagerConfig::with_height(tree_height),
    };
    let manager = KeyManager::new(config)?;

    for i in 0..num_signatures {
        let message = format!("rotation message {}", i);
        let signature = manager.sign(message.as_bytes())?;
        if manager.needs_rotation() {
            info!(
                "Signature {} used leaf {}; {} left in active tree",
                i,
                signature.leaf_index,
                manager.remaining_signatures()
            );
        }
    }

    println!("Trees generated: {}", manager.tree_count());
    for (i, key) in manager.all_public_keys().iter().enumerate() {
        let root: String = key.root.iter().map(|b| format!("{:02x}", b)).collect();
        println!("  tree {} (h={}): {}", i, key.height, root);
    }

    Ok(())
}

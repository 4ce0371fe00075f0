use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use colgraph::graph::{Aggregation, EdgeList, GraphLoader, Orientation, RelationshipProjection};
use colgraph::memory::{estimate_graph, estimate_louvain};
use colgraph::{Louvain, LouvainConfig, PropertyMapping};

#[derive(Parser)]
#[command(name = "colgraph")]
#[command(about = "Compressed graph loading and Louvain clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run Louvain on an edge list and print the dendrogram as JSON
    Louvain {
        /// Edge list file (`source target [weight]` per line)
        edges: PathBuf,

        /// JSON file with Louvain settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of levels (overrides the config file)
        #[arg(long)]
        max_level: Option<usize>,

        /// Local-move iterations per level (overrides the config file)
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Worker threads (overrides the config file)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Modularity resolution (overrides the config file)
        #[arg(long)]
        resolution: Option<f64>,

        /// Stop once a level merges nothing
        #[arg(long, default_value_t = false)]
        early_stop: bool,

        /// Weight column name; without it every edge weighs 1
        #[arg(long)]
        weight: Option<String>,

        /// Weight used for rows without a weight cell
        #[arg(long, default_value_t = 1.0)]
        default_weight: f64,

        /// Parallel edge policy: NONE, SUM, MIN, MAX or SINGLE
        #[arg(long, default_value = "SUM")]
        aggregation: Aggregation,

        /// Load each edge in its given direction only
        #[arg(long, default_value_t = false)]
        directed: bool,

        /// Write JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print memory estimates for a graph of the given size
    Estimate {
        /// Node count
        #[arg(long)]
        nodes: u64,

        /// Stored relationship count
        #[arg(long)]
        relationships: u64,

        /// Worker threads
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Louvain levels
        #[arg(long, default_value_t = 10)]
        max_level: usize,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    node_count: u64,
    relationship_count: u64,
    levels: usize,
    cancelled: bool,
    modularities: Vec<f64>,
    nodes: Vec<NodeRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeRow {
    node_id: u64,
    community_id: Option<u64>,
    intermediate_community_ids: Vec<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Louvain {
            edges,
            config,
            max_level,
            max_iterations,
            concurrency,
            resolution,
            early_stop,
            weight,
            default_weight,
            aggregation,
            directed,
            output,
        } => {
            let mut settings = match config {
                Some(path) => {
                    let json = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    LouvainConfig::from_json(&json)
                        .with_context(|| format!("invalid config {}", path.display()))?
                }
                None => LouvainConfig::default(),
            };
            if let Some(value) = max_level {
                settings.max_level = value;
            }
            if let Some(value) = max_iterations {
                settings.max_iterations = value;
            }
            if let Some(value) = concurrency {
                settings.concurrency = value;
            }
            if let Some(value) = resolution {
                settings.resolution = value;
            }
            settings.early_stop |= early_stop;
            settings.validate()?;

            let mapping = weight.map(|name| PropertyMapping::of("weight", name, default_weight));
            let orientation = if directed {
                Orientation::Natural
            } else {
                Orientation::Undirected
            };
            let report = run_louvain(&edges, settings, mapping, aggregation, orientation)?;

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => writeln!(io::stdout().lock(), "{json}")?,
            }
        }
        Commands::Estimate {
            nodes,
            relationships,
            concurrency,
            max_level,
        } => {
            if concurrency == 0 {
                bail!("concurrency must be > 0");
            }
            let graph = estimate_graph(nodes, relationships, concurrency, true);
            let louvain = estimate_louvain(nodes, relationships, concurrency, max_level);
            let json = serde_json::json!({ "graph": graph, "louvain": louvain });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

fn run_louvain(
    path: &Path,
    config: LouvainConfig,
    weight: Option<PropertyMapping>,
    aggregation: Aggregation,
    orientation: Orientation,
) -> Result<Report> {
    let start = Instant::now();
    let list = EdgeList::read(path, weight.as_ref())
        .with_context(|| format!("failed to read edge list {}", path.display()))?;
    tracing::info!(
        nodes = list.node_count(),
        edges = list.edges.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "parsed edge list"
    );

    let mut projection = RelationshipProjection::new(orientation, aggregation);
    if let Some(mapping) = list.weight.clone() {
        projection = projection.with_weight(mapping);
    }
    let start = Instant::now();
    let graph = GraphLoader::new(projection)
        .concurrency(config.concurrency)
        .batch_size(config.batch_size)
        .load(list.nodes.iter().copied(), &list.edges)
        .context("failed to load graph")?;
    tracing::info!(
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        bytes = graph.size_of(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded graph"
    );

    let result = Louvain::new(config).compute(&graph).context("louvain failed")?;
    let nodes = graph
        .nodes()
        .map(|node| {
            let intermediate: Vec<u64> = result
                .dendrogram()
                .iter()
                .map(|level| level.get(node))
                .collect();
            NodeRow {
                node_id: graph.to_original_node_id(node),
                community_id: intermediate.last().copied(),
                intermediate_community_ids: intermediate,
            }
        })
        .collect();

    Ok(Report {
        node_count: graph.node_count(),
        relationship_count: graph.relationship_count(),
        levels: result.levels(),
        cancelled: result.cancelled(),
        modularities: result.modularities().to_vec(),
        nodes,
    })
}

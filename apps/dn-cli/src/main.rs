use clap::{Args, Parser, Subcommand};
use dn_core::NodeId;
use dn_graph::{
    GaugeDictionary, GraphError, Network, check_network, filter_to_calibrate, flatten_network,
    gauge_basin, get_downstream_network, get_order_node, get_remainder_network, get_subgraph,
    get_upstream_network, order_gauges, simplify_network, sort_node, split_basins,
};
use dn_records::{
    RecordError, RecordFormat, RecordTable, WorkflowConfig, load_config, load_gauges,
    load_network, load_valid_network, save_network, serialize_table,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network has {count} topology defect(s)")]
    InvalidNetwork { count: usize },

    #[error("No gauge dictionary given (use --gauges or set `gauges` in the config)")]
    MissingGauges,

    #[error("Failed to create directory: {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "dn-cli")]
#[command(about = "drainet - drainage network topology tool", long_about = None)]
struct Cli {
    /// Workflow configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Record format preset (csv, tsv, geoframe); overrides the config
    #[arg(long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Output {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check outlets, cycles and reachability
    Validate {
        /// Network record table
        network: PathBuf,
    },
    /// Extract the sub-basin draining through a node
    Upstream {
        network: PathBuf,
        node: String,
        #[command(flatten)]
        out: Output,
    },
    /// Print the path from a node to the outlet
    Downstream { network: PathBuf, node: String },
    /// Remove the sub-basin draining through a node
    Remainder {
        network: PathBuf,
        node: String,
        #[command(flatten)]
        out: Output,
    },
    /// Extract the subgraph induced by a set of nodes
    Subgraph {
        network: PathBuf,
        #[arg(required = true)]
        nodes: Vec<String>,
        #[command(flatten)]
        out: Output,
    },
    /// Print node ids in topological order (outlet last)
    Sort { network: PathBuf },
    /// Print Horton-Strahler stream order per node
    Order {
        network: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Collapse pass-through chains
    Simplify {
        network: PathBuf,
        #[command(flatten)]
        out: Output,
    },
    /// Make every sub-basin an independent outlet
    Flatten {
        network: PathBuf,
        #[command(flatten)]
        out: Output,
    },
    /// Write one network per outlet
    Split {
        network: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Extract the upstream basin of every gauge and label nodes
    Calibrate {
        network: PathBuf,
        #[arg(long)]
        gauges: Option<PathBuf>,
        /// Directory receiving one table per gauge
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Extract the basin of one gauge
    GaugeBasin {
        network: PathBuf,
        gauge: String,
        #[arg(long)]
        gauges: Option<PathBuf>,
        /// Drop everything upstream of inner gauges
        #[arg(long)]
        prune_inner: bool,
        #[command(flatten)]
        out: Output,
    },
    /// Print gauge ids in topological order of their nodes
    GaugeOrder {
        network: PathBuf,
        #[arg(long)]
        gauges: Option<PathBuf>,
    },
    /// Rewrite a network in another record format
    Convert {
        network: PathBuf,
        /// Target format preset
        #[arg(long)]
        to: String,
        /// Keep only the node and downstream id columns
        #[arg(long)]
        ids_only: bool,
        #[command(flatten)]
        out: Output,
    },
}

struct Context {
    config: WorkflowConfig,
}

impl Context {
    fn load(cli: &Cli) -> CliResult<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => WorkflowConfig::default(),
        };
        if let Some(name) = &cli.format {
            config.format = RecordFormat::preset(name)?;
        }
        Ok(Self { config })
    }

    /// Network that passed validation; traversals and simplification need one.
    fn network(&self, path: &Path) -> CliResult<Network> {
        Ok(load_valid_network(path, &self.config.format)?)
    }

    /// Network as built from the records, defects included.
    fn raw_network(&self, path: &Path) -> CliResult<Network> {
        Ok(load_network(path, &self.config.format)?)
    }

    fn gauges(&self, path: Option<&Path>) -> CliResult<GaugeDictionary> {
        let path = path
            .or(self.config.gauges.as_deref())
            .ok_or(CliError::MissingGauges)?;
        Ok(load_gauges(path)?)
    }

    fn emit(&self, network: &Network, out: &Output) -> CliResult<()> {
        self.emit_as(&RecordTable::from_network(network), &self.config.format, out)
    }

    fn emit_as(&self, table: &RecordTable, format: &RecordFormat, out: &Output) -> CliResult<()> {
        match &out.output {
            Some(path) => {
                dn_records::save_table(path, table, format)?;
                info!(path = %path.display(), records = table.records.len(), "written");
            }
            None => print!("{}", serialize_table(table, format)?),
        }
        Ok(())
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::load(&cli)?;

    match &cli.command {
        Commands::Validate { network } => cmd_validate(&ctx, network),
        Commands::Upstream { network, node, out } => {
            let net = ctx.network(network)?;
            ctx.emit(&get_upstream_network(&net, &NodeId::from(node.as_str()))?, out)
        }
        Commands::Downstream { network, node } => {
            let net = ctx.network(network)?;
            for n in get_downstream_network(&net, &NodeId::from(node.as_str()))? {
                println!("{}", n.id);
            }
            Ok(())
        }
        Commands::Remainder { network, node, out } => {
            let net = ctx.network(network)?;
            ctx.emit(&get_remainder_network(&net, &NodeId::from(node.as_str()))?, out)
        }
        Commands::Subgraph {
            network,
            nodes,
            out,
        } => {
            let net = ctx.network(network)?;
            let ids: Vec<NodeId> = nodes.iter().map(|n| NodeId::from(n.as_str())).collect();
            ctx.emit(&get_subgraph(&net, &ids)?, out)
        }
        Commands::Sort { network } => {
            for id in cmd_sort(&ctx, network)? {
                println!("{id}");
            }
            Ok(())
        }
        Commands::Order { network, json } => cmd_order(&ctx, network, *json),
        Commands::Simplify { network, out } => {
            let net = ctx.network(network)?;
            ctx.emit(&simplify_network(&net, &ctx.config.aggregation)?, out)
        }
        Commands::Flatten { network, out } => {
            ctx.emit(&flatten_network(&ctx.raw_network(network)?), out)
        }
        Commands::Split { network, out_dir } => cmd_split(&ctx, network, out_dir),
        Commands::Calibrate {
            network,
            gauges,
            out_dir,
            json,
        } => cmd_calibrate(&ctx, network, gauges.as_deref(), out_dir.as_deref(), *json),
        Commands::GaugeBasin {
            network,
            gauge,
            gauges,
            prune_inner,
            out,
        } => {
            let net = ctx.network(network)?;
            let dict = ctx.gauges(gauges.as_deref())?;
            let basin = gauge_basin(&net, &dict, gauge, *prune_inner)?;
            ctx.emit(&basin.network, out)
        }
        Commands::GaugeOrder { network, gauges } => {
            let net = ctx.network(network)?;
            let dict = ctx.gauges(gauges.as_deref())?;
            for gauge in order_gauges(&net, &dict)? {
                println!("{gauge}");
            }
            Ok(())
        }
        Commands::Convert {
            network,
            to,
            ids_only,
            out,
        } => {
            let table = RecordTable::from_network(&ctx.raw_network(network)?);
            let table = if *ids_only { table.ids_only() } else { table };
            ctx.emit_as(&table, &RecordFormat::preset(to)?, out)
        }
    }
}

fn cmd_validate(ctx: &Context, network: &Path) -> CliResult<()> {
    println!("Validating network: {}", network.display());
    let net = ctx.raw_network(network)?;
    let report = check_network(&net);
    if report.is_valid() {
        println!("✓ Network is valid ({} nodes)", net.len());
        return Ok(());
    }
    for finding in report.findings() {
        println!("  ✗ {finding}");
    }
    Err(CliError::InvalidNetwork {
        count: report.findings().len(),
    })
}

fn cmd_sort(ctx: &Context, network: &Path) -> CliResult<Vec<NodeId>> {
    Ok(sort_node(&ctx.network(network)?))
}

fn cmd_order(ctx: &Context, network: &Path, json: bool) -> CliResult<()> {
    let net = ctx.network(network)?;
    let orders = get_order_node(&net);
    if json {
        let by_id: BTreeMap<&str, u32> = orders.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        println!("{}", serde_json::to_string_pretty(&by_id)?);
    } else {
        for id in sort_node(&net) {
            if let Some(o) = orders.get(&id) {
                println!("{id}\t{o}");
            }
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> CliResult<()> {
    std::fs::create_dir_all(path).map_err(|e| CliError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

fn cmd_split(ctx: &Context, network: &Path, out_dir: &Path) -> CliResult<()> {
    let net = ctx.raw_network(network)?;
    create_dir(out_dir)?;
    for basin in split_basins(&net) {
        if let Some(outlet) = basin.outlet() {
            let path = out_dir.join(format!("basin_{outlet}.txt"));
            save_network(&path, &basin, &ctx.config.format)?;
            println!("{} ({} nodes)", path.display(), basin.len());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CalibrationSummary<'a> {
    basins: Vec<BasinSummary<'a>>,
    uncalibrated: Vec<&'a NodeId>,
}

#[derive(Serialize)]
struct BasinSummary<'a> {
    gauge: &'a str,
    node: &'a NodeId,
    nodes: Vec<&'a NodeId>,
}

fn cmd_calibrate(
    ctx: &Context,
    network: &Path,
    gauges: Option<&Path>,
    out_dir: Option<&Path>,
    json: bool,
) -> CliResult<()> {
    let net = ctx.network(network)?;
    let dict = ctx.gauges(gauges)?;
    let set = filter_to_calibrate(&net, &dict)?;

    if let Some(dir) = out_dir {
        create_dir(dir)?;
        for basin in &set.basins {
            let path = dir.join(format!("{}.txt", basin.gauge.id));
            save_network(&path, &basin.network, &ctx.config.format)?;
        }
    }

    if json {
        let summary = CalibrationSummary {
            basins: set
                .basins
                .iter()
                .map(|b| BasinSummary {
                    gauge: &b.gauge.id,
                    node: &b.gauge.node,
                    nodes: b.network.ids().collect(),
                })
                .collect(),
            uncalibrated: set.uncalibrated.iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for basin in &set.basins {
            println!(
                "  {} at {} ({} nodes)",
                basin.gauge.id,
                basin.gauge.node,
                basin.network.len()
            );
        }
        if !set.uncalibrated.is_empty() {
            let ids: Vec<&str> = set.uncalibrated.iter().map(NodeId::as_str).collect();
            println!("Not calibrated: {}", ids.join(", "));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["dn-cli", "sort", "net.txt", "--format", "geoframe"]).unwrap();
        assert_eq!(cli.format.as_deref(), Some("geoframe"));
        let ctx = Context::load(&cli).unwrap();
        assert_eq!(ctx.config.format, RecordFormat::geoframe());
    }

    #[test]
    fn sort_refuses_cyclic_network() {
        let dir = std::env::temp_dir().join("dn_cli_cyclic");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cyc.csv");
        std::fs::write(&path, "node_id,downstream_id\nA,B\nB,C\nC,A\nD,\n").unwrap();

        let ctx = Context {
            config: WorkflowConfig::default(),
        };
        assert!(matches!(
            cmd_sort(&ctx, &path),
            Err(CliError::Records(RecordError::Graph(GraphError::InvalidTopology { .. })))
        ));
        assert!(matches!(
            cmd_order(&ctx, &path, false),
            Err(CliError::Records(RecordError::Graph(GraphError::InvalidTopology { .. })))
        ));
        assert_eq!(ctx.raw_network(&path).unwrap().len(), 4);
    }

    #[test]
    fn sort_of_valid_network_ends_at_outlet() {
        let dir = std::env::temp_dir().join("dn_cli_sort");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("basin.csv");
        std::fs::write(&path, "node_id,downstream_id\n1,2\n2,3\n3,\n4,3\n").unwrap();

        let ctx = Context {
            config: WorkflowConfig::default(),
        };
        let ids: Vec<String> = cmd_sort(&ctx, &path).unwrap().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "3"]);
    }

    #[test]
    fn missing_gauges_is_reported() {
        let ctx = Context {
            config: WorkflowConfig::default(),
        };
        assert!(matches!(ctx.gauges(None), Err(CliError::MissingGauges)));
    }
}

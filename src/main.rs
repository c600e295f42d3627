//! Depdy CLI - dependency graphs for CI pipeline definitions

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use depdy::graph::GraphBuild;
use depdy::Repository;

#[derive(Parser)]
#[command(name = "depdy")]
#[command(about = "Depdy - dependency graphs for GitHub Actions workflows and actions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph of a repository checkout
    Graph {
        /// Path to the repository root
        path: PathBuf,

        /// Budget in seconds for historical version-store lookups
        #[arg(short, long)]
        deadline_secs: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: Format,
    },

    /// Scan a tree and report what classified and parsed
    Scan {
        /// Path to the repository root
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// DOT digraph text for graphviz
    Dot,
    /// Plain node and edge listing
    List,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Graph {
            path,
            deadline_secs,
            format,
        } => {
            let repository = Repository::open(&path)?;
            let build = repository.build_graph(deadline_secs.map(Duration::from_secs))?;
            report_warnings(&build);
            match format {
                Format::Dot => print!("{}", build.graph.to_dot()),
                Format::List => print_list(&build),
            }
        }
        Commands::Scan { path } => {
            let repository = Repository::open(&path)?;
            for workflow in repository.workflows() {
                println!("workflow {} ({})", workflow.meta.key(), workflow.path);
            }
            for action in repository.actions() {
                println!("action   {} ({})", action.meta.key(), action.path);
            }
            for warning in repository.scan_warnings() {
                eprintln!("warning: {warning}");
            }
        }
    }
    Ok(())
}

fn report_warnings(build: &GraphBuild) {
    for warning in &build.warnings {
        eprintln!("warning: {warning}");
    }
}

fn print_list(build: &GraphBuild) {
    for node in build.graph.nodes() {
        println!("node {}", node.meta.key());
    }
    for edge in build.graph.edges() {
        let from = build
            .graph
            .node(edge.from)
            .map(|n| n.meta.key())
            .unwrap_or_default();
        match &edge.target {
            depdy::EdgeTarget::Bound(to) => {
                let to = build
                    .graph
                    .node(*to)
                    .map(|n| n.meta.key())
                    .unwrap_or_default();
                println!("edge {from} -> {to} [{}]", edge.origin);
            }
            depdy::EdgeTarget::Unresolved { reference, reason } => {
                println!("edge {from} -> {reference} [unresolved: {reason}] [{}]", edge.origin);
            }
        }
    }
}

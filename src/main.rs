use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nested_set::query::QueryOptions;
use nested_set::store::{Field, Sort};
use nested_set::{
    forest_label, Group, MemoryStore, NestedSet, NestedSetConfig, Node, NodeId, NodeStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nested-set", about = "Build and inspect nested-set encodings of parent-pointer forests")]
struct Cli {
    /// Log rebuild and shift activity (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild a forest and print every interval.
    Rebuild {
        /// Forest file (`<id>\t<parent>\t<group>` per line, `-` when absent).
        forest: PathBuf,
        /// First left boundary.
        #[arg(long, default_value_t = 1)]
        start_left: i64,
        /// Only rebuild this group (default: the global forest).
        #[arg(long)]
        group: Option<String>,
    },
    /// Rebuild every group and verify the encoding invariants.
    Check {
        /// Forest file.
        forest: PathBuf,
    },
    /// Show the tree neighbourhood of one node.
    Tree {
        /// Forest file.
        forest: PathBuf,
        /// Node to inspect.
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Rebuild {
            forest,
            start_left,
            group,
        } => run_rebuild(&forest, start_left, group.map(Group::new))?,
        Commands::Check { forest } => run_check(&forest)?,
        Commands::Tree { forest, id } => run_tree(&forest, &NodeId::from(id))?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_rebuild(path: &Path, start_left: i64, group: Option<Group>) -> Result<()> {
    let store = read_forest(path)?;
    let config = NestedSetConfig::default().with_start_left(start_left);
    let mut tree = NestedSet::new(store, config);

    let roots = tree
        .rebuild_forest(group.as_ref())
        .with_context(|| format!("rebuild of forest {} failed", forest_label(group.as_ref())))?;
    if roots.is_empty() {
        println!("No roots in forest {}.", forest_label(group.as_ref()));
        return Ok(());
    }

    for node in tree.store().nodes() {
        if node.group == group && !node.is_encoded() {
            println!("{}\tunreachable from any root", node.id);
        }
    }
    let mut encoded: Vec<&Node> = tree
        .store()
        .nodes()
        .filter(|n| n.group == group && n.is_encoded())
        .collect();
    let sort = Sort::ascending(Field::Left);
    encoded.sort_by(|a, b| sort.compare(a, b));
    for node in encoded {
        print_node(node);
    }

    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let store = read_forest(path)?;
    let groups: BTreeSet<Option<Group>> = store.nodes().map(|n| n.group.clone()).collect();
    let mut tree = NestedSet::new(store, NestedSetConfig::default());

    let mut failed = false;
    for group in &groups {
        let label = forest_label(group.as_ref());
        tree.rebuild_forest(group.as_ref())
            .with_context(|| format!("rebuild of forest {} failed", label))?;

        let violations = tree.check(group.as_ref())?;
        let snapshot = tree.snapshot(group.as_ref())?;
        if violations.is_empty() {
            println!(
                "{}\tok\tnodes={}\tfingerprint={}",
                label,
                snapshot.len(),
                snapshot.fingerprint().to_hex()
            );
        } else {
            failed = true;
            for violation in violations {
                println!("{}\t{}", label, violation);
            }
        }
    }

    if failed {
        bail!("encoding invariants violated");
    }
    Ok(())
}

fn run_tree(path: &Path, id: &NodeId) -> Result<()> {
    let store = read_forest(path)?;
    let mut tree = NestedSet::new(store, NestedSetConfig::default());

    let node = tree.get(id)?;
    tree.rebuild_forest(node.group.as_ref())
        .context("rebuild failed")?;
    let node = tree.get(id)?;

    let query = tree.query();
    let options = QueryOptions::default().sorted_by(Sort::ascending(Field::Left));
    let names = |nodes: Vec<Node>| {
        nodes
            .iter()
            .map(|n| n.id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    print_node(&node);
    match query.parent(&node)? {
        Some(parent) => println!("parent\t{}", parent.id),
        None => println!("parent\t-"),
    }
    println!("ancestors\t{}", names(query.ancestors(&node, &options)?));
    println!("children\t{}", names(query.children(&node, &options)?));
    println!("descendants\t{}", names(query.descendants(&node, &options)?));
    println!("siblings\t{}", names(query.siblings(&node, &options)?));
    match query.level(&node)? {
        Some(level) => println!("level\t{}", level),
        None => println!("level\tunencoded"),
    }

    Ok(())
}

fn read_forest(path: &Path) -> Result<MemoryStore> {
    let file =
        File::open(path).with_context(|| format!("failed to open forest file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut store = MemoryStore::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t').map(str::trim);
        let id = fields
            .next()
            .filter(|f| !f.is_empty() && *f != "-")
            .ok_or_else(|| anyhow::anyhow!("missing id on line {}", line_no + 1))?;
        let parent = fields.next().filter(|f| !f.is_empty() && *f != "-");
        let group = fields.next().filter(|f| !f.is_empty() && *f != "-");

        let mut node = match parent {
            Some(parent) => Node::child(id, parent),
            None => Node::root(id),
        };
        if let Some(group) = group {
            node = node.in_group(group);
        }
        store
            .insert(node)
            .with_context(|| format!("invalid record on line {}", line_no + 1))?;
    }

    Ok(store)
}

fn print_node(node: &Node) {
    match (node.interval(), node.depth) {
        (Some(interval), Some(depth)) => {
            println!("{}\t{}\tdepth={}", node.id, interval, depth)
        }
        (Some(interval), None) => println!("{}\t{}", node.id, interval),
        (None, _) => println!("{}\tunencoded", node.id),
    }
}

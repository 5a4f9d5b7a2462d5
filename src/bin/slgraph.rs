//! `slgraph`, command-line inspector and conversion tool.
//!
//! A thin client over the public `slgraph` API, mirroring the original
//! project's `test`/`load_edgelist`/`convert` tools: build a graph from an
//! edge list, dump degrees and neighbours, or compact one file into
//! another.

use clap::{Parser, Subcommand};
use slgraph::{Graph, GraphOptions, VERSION_1, VERSION_2};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Inspect and build slgraph files.
#[derive(Parser, Debug)]
#[command(name = "slgraph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty graph file.
    Create {
        path: PathBuf,
        /// Build a directed (v2) graph instead of undirected (v1).
        #[arg(long)]
        directed: bool,
    },

    /// Load a "u v" edge-list text file into a new graph file.
    LoadEdgelist {
        input: PathBuf,
        output: PathBuf,
        /// Add edges undirected instead of the default directed.
        #[arg(long)]
        undirected: bool,
    },

    /// Print node counts, degrees, and neighbours.
    Inspect { path: PathBuf },

    /// Compact `src` into a freshly packed `dst`.
    Convert { src: PathBuf, dst: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Create { path, directed } => create(&path, directed),
        Commands::LoadEdgelist {
            input,
            output,
            undirected,
        } => load_edgelist(&input, &output, undirected),
        Commands::Inspect { path } => inspect(&path),
        Commands::Convert { src, dst } => convert(&src, &dst),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn create(path: &std::path::Path, directed: bool) -> anyhow::Result<()> {
    let version = if directed { VERSION_2 } else { VERSION_1 };
    let g = Graph::create(path, version, &GraphOptions::default())?;
    g.close()?;
    println!("created {} (version {})", path.display(), version);
    Ok(())
}

/// Single-pass load: remaps sparse/large input ids to a compact 0..N-1
/// range with a `HashMap` while reading, buffering the remapped edge list
/// in memory, then replays it against a freshly sized graph once the full
/// file has been read.
fn load_edgelist(input: &std::path::Path, output: &std::path::Path, undirected: bool) -> anyhow::Result<()> {
    let version = if undirected { VERSION_1 } else { VERSION_2 };
    let file = std::fs::File::open(input)?;
    let mut ids: HashMap<u64, u64> = HashMap::new();
    let mut edges = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(u), Some(v)) = (parts.next(), parts.next()) else {
            continue;
        };
        let (Ok(u), Ok(v)) = (u.parse::<u64>(), v.parse::<u64>()) else {
            continue;
        };
        let next_id = ids.len() as u64;
        let su = *ids.entry(u).or_insert(next_id);
        let next_id = ids.len() as u64;
        let sv = *ids.entry(v).or_insert(next_id);
        edges.push((su, sv));
    }

    let mut g = Graph::create(output, version, &GraphOptions::default())?;
    g.nodelist_expand(ids.len() as u64)?;
    for _ in 0..ids.len() {
        g.add_node()?;
    }
    for (u, v) in edges {
        if undirected {
            g.add_edge(u, v)?;
        } else {
            g.add_directed_edge(u, v)?;
        }
    }
    println!(
        "loaded {} nodes, {} edges into {}",
        g.nodes(),
        g.edges(),
        output.display()
    );
    g.close()?;
    Ok(())
}

fn inspect(path: &std::path::Path) -> anyhow::Result<()> {
    let g = Graph::open(path, true, &GraphOptions::default())?;
    println!(
        "version {}, nodes {}, edges {}",
        g.version(),
        g.nodes(),
        g.edges()
    );
    for n in 0..g.nodes() {
        if g.version() == VERSION_1 {
            let degree = g.degree(n);
            print!("node {n}: degree {degree}, neighbours [");
            for i in 0..degree {
                if i > 0 {
                    print!(", ");
                }
                print!("{}", g.neighbour(n, i));
            }
            println!("]");
        } else {
            let out_degree = g.out_degree(n);
            let in_degree = g.in_degree(n);
            print!("node {n}: out-degree {out_degree}, in-degree {in_degree}, out [");
            for i in 0..out_degree {
                if i > 0 {
                    print!(", ");
                }
                print!("{}", g.out_neighbour(n, i));
            }
            print!("], in [");
            for i in 0..in_degree {
                if i > 0 {
                    print!(", ");
                }
                print!("{}", g.in_neighbour(n, i));
            }
            println!("]");
        }
    }
    Ok(())
}

fn convert(src: &std::path::Path, dst: &std::path::Path) -> anyhow::Result<()> {
    let src_graph = Graph::open(src, true, &GraphOptions::default())?;
    let dst_graph = slgraph::copy(dst, &src_graph, &GraphOptions::default())?;
    println!(
        "compacted {} ({} nodes, {} edges) into {}",
        src.display(),
        dst_graph.nodes(),
        dst_graph.edges(),
        dst.display()
    );
    dst_graph.close()?;
    Ok(())
}

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canopy::config::Config;
use canopy::models::{extract_image_url, sorted_by_name};
use canopy::session::{TaxonomySession, UrlState};
use canopy::tree::TreeNode;
use canopy::{ExportCache, TaxonomyApiClient, TaxonomyService};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Inspect taxonomy graphs: list them or dump a materialized tree")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available graphs, alphabetized by name
    List,
    /// Fetch a graph's export and print its materialized tree
    Tree {
        /// Graph to load
        #[arg(long)]
        graph_id: i64,

        /// Node id to select and report the path of
        #[arg(long)]
        node: Option<String>,

        /// Filter the tree by a name substring before printing
        #[arg(long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canopy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Using taxonomy API at {}", config.api.base_url);

    let api = TaxonomyApiClient::new(&config.api)?;
    let service = TaxonomyService::new(api, ExportCache::new());
    let session = TaxonomySession::new(service);

    match args.command {
        Command::List => {
            let graphs = session.initialize(&UrlState::default()).await?;
            for graph in sorted_by_name(graphs) {
                println!("{:>8}  {}", graph.graph_id, graph.name);
            }
        }
        Command::Tree {
            graph_id,
            node,
            query,
        } => {
            let url = UrlState {
                graph_id: Some(graph_id),
                node_id: node.clone(),
            };
            session.initialize(&url).await?;

            if session.selected_graph_id().is_none() {
                anyhow::bail!("Graph {graph_id} is not in the graph list");
            }

            session.with_tree(|tree| {
                if let Some(tree) = tree {
                    print_tree(tree, 0);
                }
            });

            if let Some(node_id) = node {
                match session.with_tree(|tree| tree.and_then(|t| t.path_to(&node_id))) {
                    Some(path) => println!("\npath to {}: {}", node_id, path.join(" > ")),
                    None => println!("\nnode {node_id} not found in tree"),
                }
            }

            if let Some(query) = query {
                match session.apply_filter(&query) {
                    Some(view) => {
                        let mut matches: Vec<&String> = view.matches.iter().collect();
                        matches.sort();
                        println!("\n{} match(es) for '{}':", matches.len(), query);
                        for id in matches {
                            println!("  {id}");
                        }
                    }
                    None => println!("\nno tree loaded, nothing to filter"),
                }
            }
        }
    }

    Ok(())
}

fn print_tree(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match extract_image_url(node.record.metadata.as_deref()) {
        Some(image_url) => println!("{}{} [{}] ({})", indent, node.record.name, node.id, image_url),
        None => println!("{}{} [{}]", indent, node.record.name, node.id),
    }
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use streetmap::StreetMap;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] streetmap::osm::Error);

#[derive(Debug, thiserror::Error)]
#[error("no routable node near ({0}, {1})")]
struct NoNodeError(f64, f64);

#[derive(Debug, thiserror::Error)]
#[error("no route between {0} and {1}: {2}")]
struct NoRouteError(i64, i64, streetmap::SolverOutcome);

#[derive(Parser)]
struct Cli {
    /// The path to the OSM file (plain, gzip or bzip2 compressed XML)
    osm_file: PathBuf,

    /// Increase logging verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the id and position of the routable node closest to a point
    Closest {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Print names of all locations starting with a prefix
    Search { prefix: String },

    /// Print all locations with the given name
    Locate { name: String },

    /// Print the shortest route between two points as GeoJSON
    Route {
        /// Latitude of the start point
        #[arg(allow_negative_numbers = true)]
        start_lat: f64,

        /// Longitude of the start point
        #[arg(allow_negative_numbers = true)]
        start_lon: f64,

        /// Latitude of the end point
        #[arg(allow_negative_numbers = true)]
        end_lat: f64,

        /// Longitude of the end point
        #[arg(allow_negative_numbers = true)]
        end_lon: f64,

        /// Maximum route search time, in seconds
        #[arg(long, default_value_t = streetmap::DEFAULT_TIMEOUT.as_secs_f64())]
        timeout: f64,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let map = StreetMap::new(load_graph(&cli.osm_file)?);

    match cli.command {
        Command::Closest { lat, lon } => {
            let id = closest(&map, lat, lon)?;
            print_node(&map, id);
        }

        Command::Search { prefix } => {
            for name in map.search_by_prefix(&prefix) {
                println!("{}", name);
            }
        }

        Command::Locate { name } => {
            for loc in map.search_exact(&name) {
                println!("{}\t{}\t{}\t{}", loc.id, loc.lat, loc.lon, loc.name);
            }
        }

        Command::Route {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            timeout,
        } => {
            let timeout = Duration::try_from_secs_f64(timeout)?;
            let start = closest(&map, start_lat, start_lon)?;
            let end = closest(&map, end_lat, end_lon)?;

            let route = map.route(start, end, timeout);
            log::info!(
                "{} after exploring {} states in {:?}, weight {:.3} km",
                route.outcome,
                route.states_explored,
                route.exploration_time,
                route.weight,
            );
            if !route.is_solved() {
                return Err(NoRouteError(start, end, route.outcome).into());
            }

            print_route(&map, &route.path);
        }
    }

    Ok(())
}

fn closest<P: streetmap::Projection>(
    map: &StreetMap<P>,
    lat: f64,
    lon: f64,
) -> Result<i64, NoNodeError> {
    map.closest(lon, lat).ok_or(NoNodeError(lat, lon))
}

fn print_node<P: streetmap::Projection>(map: &StreetMap<P>, id: i64) {
    if let Some(node) = map.graph().get_node(id) {
        println!(
            "{}\t{}\t{}\t{}",
            node.id,
            node.lat,
            node.lon,
            node.name.as_deref().unwrap_or(""),
        );
    }
}

fn print_route<P: streetmap::Projection>(map: &StreetMap<P>, route: &[i64]) {
    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{}},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut nodes = route
        .iter()
        .filter_map(|&node_id| map.graph().get_node(node_id))
        .peekable();
    while let Some(node) = nodes.next() {
        let suffix = if nodes.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", node.lon, node.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");
}

fn load_graph<P: AsRef<Path>>(path: P) -> Result<streetmap::Graph, GraphLoadError> {
    let mut g = streetmap::Graph::default();
    let options = streetmap::osm::Options {
        file_format: streetmap::osm::FileFormat::Unknown,
        ..Default::default()
    };
    match streetmap::osm::add_features_from_file(&mut g, &options, path.as_ref()) {
        Ok(()) => Ok(g),
        Err(e) => Err(GraphLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

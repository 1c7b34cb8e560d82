//! Atrium CLI - universal atrial coordinates from the command line.
//!
//! Usage: atrium <COMMAND> [OPTIONS]
//!
//! Run `atrium --help` for available commands.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use atrium::algo::Progress;
use atrium::config::RunConfig;
use atrium::construct::UacConstructor;
use atrium::io;
use atrium::mesh::{mesh_boundary_vertices, HalfEdgeMesh, TagAssociation};
use atrium::schema::Schema;
use atrium::workflow::Workflow;

#[derive(Parser)]
#[command(name = "atrium")]
#[command(author, version, about = "Universal atrial coordinates CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full coordinate pipeline described by a run configuration
    Run {
        /// Run configuration file (TOML)
        config: PathBuf,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Check a schema and workflow for consistency
    Validate {
        /// Schema file (bundled left-atrium schema when omitted)
        schema: Option<PathBuf>,

        /// Workflow file (bundled left-atrium workflow when omitted)
        workflow: Option<PathBuf>,
    },

    /// Display mesh and tag information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Tag scalar to summarize
        #[arg(short, long)]
        tags: Option<String>,

        /// Read the tag scalar from the face element instead of the vertex element
        #[arg(long)]
        face_tags: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> atrium::error::Result<()> {
    match cli.command {
        Commands::Run {
            config,
            output,
            sequential,
            quiet,
        } => cmd_run(&config, output, sequential, quiet),
        Commands::Validate { schema, workflow } => cmd_validate(schema.as_deref(), workflow.as_deref()),
        Commands::Info {
            input,
            tags,
            face_tags,
        } => {
            let association = if face_tags {
                TagAssociation::Face
            } else {
                TagAssociation::Vertex
            };
            cmd_info(&input, tags.as_deref(), association)
        }
    }
}

/// Create a progress reporter that overwrites one status line on stderr.
fn create_progress() -> Progress {
    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }
        let percent = (current * 100 + total / 2) / total;
        let bar_width = 30;
        let filled = (percent.min(100) * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        // Pad so a shorter message fully overwrites the previous one
        eprint!("\r[{}{}] {:3}% {:<48}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_run(config_path: &Path, output: Option<PathBuf>, sequential: bool, quiet: bool) -> atrium::error::Result<()> {
    let mut config = RunConfig::load(config_path)?;
    if let Some(output) = output {
        config.output = output;
    }
    if sequential {
        config.harmonic = config.harmonic.with_parallel(false);
        config.routing = config.routing.with_parallel(false);
    }

    let schema = config.load_schema()?;
    let workflow = config.load_workflow()?;
    workflow.validate(&schema)?;
    config.check_feature_tags(&schema)?;

    let mesh = io::load_tagged(&config.mesh, &config.tags.scalar, config.tags.association)?;
    println!(
        "Loaded {}: {} vertices, {} faces",
        config.mesh.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );

    let progress = if quiet { Progress::none() } else { create_progress() };
    let mut constructor = UacConstructor::new(&mesh, &schema)
        .with_feature_tags(config.feature_tags.clone())
        .with_harmonic_options(config.harmonic.clone())
        .with_route_options(config.routing.clone())
        .with_progress(progress);

    let start = Instant::now();
    constructor.construct_segmentation(&workflow)?;
    let segmented = start.elapsed();
    constructor.construct_uacs()?;
    let elapsed = start.elapsed();

    println!(
        "Constructed {} artifacts in {:.2?} (segmentation {:.2?})",
        constructor.store().num_produced(),
        elapsed,
        segmented
    );

    let written = io::save_results(&mesh, constructor.store(), &config.output)?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_validate(schema: Option<&Path>, workflow: Option<&Path>) -> atrium::error::Result<()> {
    let schema = match schema {
        Some(path) => Schema::load(path)?,
        None => Schema::left_atrium()?,
    };
    let workflow = match workflow {
        Some(path) => Workflow::load(path)?,
        None => Workflow::left_atrium()?,
    };
    schema.validate()?;
    workflow.validate(&schema)?;

    println!("Schema: {}", schema.origin().display());
    println!("Workflow: {} steps", workflow.steps.len());
    let names: Vec<&str> = schema.feature_tag_names().into_iter().collect();
    println!("Feature tags: {}", names.join(", "));
    println!("OK");
    Ok(())
}

fn cmd_info(input: &Path, tags: Option<&str>, association: TagAssociation) -> atrium::error::Result<()> {
    let mesh: HalfEdgeMesh = match tags {
        Some(name) => io::load_tagged(input, name, association)?,
        None => io::load(input)?,
    };

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let boundary = mesh_boundary_vertices(&mesh);
    if boundary.is_empty() {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary.len());
    }

    if let Some(tags) = mesh.tags() {
        let mut histogram: BTreeMap<i32, usize> = BTreeMap::new();
        for &t in tags.values() {
            *histogram.entry(t).or_default() += 1;
        }
        println!("\nTags ({} {} values):", tags.len(), association_name(tags.association()));
        for (tag, count) in histogram {
            println!("  {:>6}: {}", tag, count);
        }
    }

    Ok(())
}

fn association_name(association: TagAssociation) -> &'static str {
    match association {
        TagAssociation::Vertex => "vertex",
        TagAssociation::Face => "face",
    }
}

//! boardsmith - command-line front end for the layout engine
//!
//! Builds, inspects and edits layout files without a canvas.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use boardsmith_core::{ElementId, ElementKind, EngineConfig, Point2D};
use boardsmith_engine::Engine;

#[derive(Parser)]
#[command(name = "boardsmith")]
#[command(about = "PCB layout geometry and routing tool", long_about = None)]
struct Cli {
    /// Engine settings (JSON); omitted fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a small demo layout
    Demo {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Summarise a layout file
    Info {
        file: PathBuf,
    },
    /// Route a trace between two pads or holes
    Route {
        file: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Output file (overwrites the input when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Move a pad or hole; attached traces are re-routed
    Move {
        file: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        z: f64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective engine settings
    Config,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo { out } => {
            let engine = build_demo(config)?;
            write_layout(&engine, out.as_deref())?;
        }
        Commands::Info { file } => {
            let engine = open_layout(config, &file)?;
            show_info(&engine);
        }
        Commands::Route { file, from, to, out } => {
            let mut engine = open_layout(config, &file)?;
            let from = ElementId::new(from);
            let to = ElementId::new(to);
            match engine.connect(&from, &to)? {
                Some(id) => println!("routed {}", id),
                None => println!("{} and {} share a grid point, nothing routed", from, to),
            }
            write_layout(&engine, Some(out.as_deref().unwrap_or(&file)))?;
        }
        Commands::Move { file, id, x, z, out } => {
            let mut engine = open_layout(config, &file)?;
            let id = ElementId::new(id);
            if !engine.move_element(&id, Point2D::new(x, z))? {
                println!("{} already on that grid point", id);
            }
            write_layout(&engine, Some(out.as_deref().unwrap_or(&file)))?;
        }
        Commands::Config => println!("{}", config.to_json()?),
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = EngineConfig::from_json(&json)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn open_layout(config: EngineConfig, path: &Path) -> Result<Engine> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading layout {}", path.display()))?;
    let mut engine = Engine::new(config)?;
    engine
        .load_layout(&json)
        .with_context(|| format!("loading layout {}", path.display()))?;
    Ok(engine)
}

fn write_layout(engine: &Engine, path: Option<&Path>) -> Result<()> {
    let json = engine.export_layout()?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("layout written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Two pads and a through-hole, wired pad-to-hole and pad-to-pad.
fn build_demo(config: EngineConfig) -> Result<Engine> {
    let mut engine = Engine::new(config)?;
    let a = engine.add_pad_at(-20.0, -10.0)?;
    let b = engine.add_pad_at(20.0, 15.0)?;
    let via = engine.add_hole_at(-20.0, 20.0)?;
    engine.connect(&a, &via)?;
    engine.connect(&a, &b)?;
    Ok(engine)
}

fn show_info(engine: &Engine) {
    let board = engine.config().board;
    println!(
        "Board:   {} x {} x {} mm",
        board.width, board.height, board.thickness
    );
    for kind in [ElementKind::Pad, ElementKind::Hole, ElementKind::Trace] {
        println!("{:<8} {}", format!("{}s:", kind), engine.registry().count_of(kind));
    }

    let length: f64 = engine
        .elements()
        .filter_map(|e| e.trace())
        .map(|t| t.path.length())
        .sum();
    println!("Copper:  {:.2} mm of trace", length);
    println!("Mesh:    {} triangles", engine.render_frame(0.0).triangle_count());
}

//! Chain analysis tool
//!
//! This binary loads a renderer chain manifest, plans the texture roles of every stage
//! and prints the result as a table or as JSON.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use vid_chain::{analysis, manifest::ChainManifest};
use vid_render::LoadAction;

/// Load action of the first render pass
#[derive(Debug, Clone, Copy, ValueEnum)]
enum InitialLoad {
    Clear,
    Load,
}

#[derive(Parser)]
#[command(version, about = "Plans a renderer chain manifest and dumps the texture roles of every stage")]
struct Args {
    /// Path to the YAML chain manifest
    manifest: PathBuf,

    /// Load action of the first render pass
    #[arg(long, value_enum, default_value = "clear")]
    initial_load: InitialLoad,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();

    let manifest = match ChainManifest::from_file(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Error loading manifest '{}': {e}", args.manifest.display());
            process::exit(1);
        }
    };

    let initial_load_action = match args.initial_load {
        InitialLoad::Clear => LoadAction::Clear,
        InitialLoad::Load => LoadAction::Load,
    };

    let stages = match analysis::analyze(&manifest, initial_load_action) {
        Ok(stages) => stages,
        Err(e) => {
            eprintln!("Error analyzing manifest '{}': {e}", args.manifest.display());
            process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&stages) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing analysis: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{} ({})", manifest.name, manifest.id);
        if let Some(description) = &manifest.description {
            println!("{description}");
        }
        println!();
        print!("{}", analysis::format_table(&stages));
        if !analysis::uses_helper(&stages) {
            println!();
            println!("The helper texture is never used and need not be allocated.");
        }
    }
}

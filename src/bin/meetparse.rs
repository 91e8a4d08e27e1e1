//! meetparse CLI - layout-authoring tools for swim-meet report layouts
//!
//! Validates layout definitions and probes a single context against a text
//! file. Full report scanning and record-tree assembly belong to the external
//! driver, not this tool.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;

use meetparse::LayoutLibrary;

#[derive(Parser)]
#[command(name = "meetparse")]
#[command(version, about = "Layout validation and probing for swim-meet result reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate layout definitions without matching anything
    Validate {
        /// Directory containing layout YAML files
        #[arg(short, long, default_value = "layouts")]
        layouts: PathBuf,

        /// Validate only this layout (default: all layouts in the directory)
        name: Option<String>,
    },

    /// Slide one context across a text file and print each match as JSON
    Probe {
        /// Directory containing layout YAML files
        #[arg(short, long, default_value = "layouts")]
        layouts: PathBuf,

        /// Layout name
        #[arg(long)]
        layout: String,

        /// Context name within the layout
        #[arg(long)]
        context: String,

        /// Text file with the extracted report lines
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Validate { layouts, name } => validate(&layouts, name.as_deref()),
        Commands::Probe {
            layouts,
            layout,
            context,
            file,
        } => probe(&layouts, &layout, &context, &file),
    };
    process::exit(exit_code);
}

fn validate(layouts_dir: &PathBuf, name: Option<&str>) -> i32 {
    let library = LayoutLibrary::new(layouts_dir);

    let names = match name {
        Some(one) => vec![one.to_string()],
        None => match library.layout_names() {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("{}", e);
                return 1;
            }
        },
    };

    if names.is_empty() {
        tracing::warn!("No layout definitions found in {}", layouts_dir.display());
        return 1;
    }

    let mut failures = 0;
    for layout_name in &names {
        match library.load(layout_name) {
            Ok(layout) => {
                tracing::info!(
                    "Layout '{}' OK ({} contexts)",
                    layout.name(),
                    layout.len()
                );
            }
            Err(e) => {
                tracing::error!("Layout '{}' invalid: {}", layout_name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        tracing::error!("{}/{} layouts failed validation", failures, names.len());
        1
    } else {
        0
    }
}

fn probe(layouts_dir: &PathBuf, layout_name: &str, context_name: &str, file: &PathBuf) -> i32 {
    let library = LayoutLibrary::new(layouts_dir);
    let mut layout = match library.load(layout_name) {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!("{}", e);
            return 1;
        }
    };

    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", file.display(), e);
            return 1;
        }
    };
    let lines: Vec<&str> = contents.lines().collect();

    let matcher = match layout.context_mut(context_name) {
        Some(matcher) => matcher,
        None => {
            tracing::error!(
                "Layout '{}' has no context '{}'",
                layout_name,
                context_name
            );
            return 1;
        }
    };

    let mut matches = 0;
    for start in 0..lines.len() {
        if matcher.valid(&lines, start) {
            // valid() just returned true, so the result is present
            if let Some(result) = matcher.match_result() {
                let mut json = result.to_json();
                json["line"] = serde_json::json!(start);
                println!("{}", json);
                matches += 1;
            }
        }
    }

    tracing::info!(
        "{} match(es) for context '{}' over {} lines",
        matches,
        context_name,
        lines.len()
    );
    0
}

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::app_config::IndexKind;

#[derive(Parser)]
#[command(author, version, about = "Emergency bell finder", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Bell dataset (JSON or CSV), overrides the config")]
    dataset: Option<PathBuf>,

    #[arg(short, long, help = "Gazetteer JSON used by place search")]
    gazetteer: Option<PathBuf>,

    #[arg(long, value_enum)]
    index: Option<IndexKind>,

    #[arg(long, help = "Grid cell size in degrees for the grid index")]
    grid_cell_deg: Option<f64>,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, help = "Print results as JSON", default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Nearest bell to a point
    Nearest {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Bells within a radius of a point
    Within {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(short, long)]
        radius: Option<f64>,
        #[arg(short = 'f', long, default_value = "all")]
        category: String,
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Dataset statistics
    Stats,
    /// Look up a place and show bells around it
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Write bells within a radius to a timestamped CSV
    Export {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(short, long)]
        radius: Option<f64>,
        #[arg(short = 'f', long, default_value = "all")]
        category: String,
        #[arg(short, long, default_value = "exports")]
        output_dir: PathBuf,
    },
    /// Nearest bell for every point in a CSV with lat,lng columns
    Batch {
        points: PathBuf,
        #[arg(short, long, help = "Output CSV; results go to stdout when omitted")]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Replay map events read line by line from stdin or a script
    Session {
        #[arg(short, long)]
        script: Option<PathBuf>,
        #[arg(long, num_args = 2, value_names = ["LAT", "LNG"], allow_negative_numbers = true,
              help = "Device location reported on start")]
        location: Option<Vec<f64>>,
    },
}

impl Args {
    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn dataset(&self) -> Option<&Path> {
        self.dataset.as_deref()
    }

    pub fn gazetteer(&self) -> Option<&Path> {
        self.gazetteer.as_deref()
    }

    pub fn index(&self) -> Option<IndexKind> {
        self.index
    }

    pub fn grid_cell_deg(&self) -> Option<f64> {
        self.grid_cell_deg
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

use std::path::PathBuf;

use clap::Parser;
use winsync_common::{Metadata, Shape};

/// winsync: keeps every open window aware of every other one.
#[derive(Parser, Debug)]
#[command(name = "winsync", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Wipe the shared window list and exit.
    #[arg(long)]
    pub clear: bool,

    /// Run without a window, following a scripted path.
    #[arg(long)]
    pub headless: bool,

    /// Directory for the file store, overriding the config.
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Metadata entry attached to this window (repeatable).
    #[arg(long = "metadata", value_name = "KEY=VALUE", value_parser = parse_metadata_entry)]
    pub metadata: Vec<(String, String)>,

    /// Starting shape for headless runs.
    #[arg(long, value_name = "X,Y,W,H", value_parser = parse_shape)]
    pub shape: Option<Shape>,

    /// Stop a headless run after this many frames.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Args {
    /// Collect `--metadata` entries into a JSON object. Values that parse as
    /// JSON (numbers, booleans, quoted strings) keep their type; anything
    /// else is stored as a plain string.
    pub fn metadata(&self) -> Metadata {
        self.metadata
            .iter()
            .map(|(key, value)| {
                let value = serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
                (key.clone(), value)
            })
            .collect()
    }
}

fn parse_metadata_entry(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("metadata key must not be empty".into());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_shape(s: &str) -> Result<Shape, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid shape '{s}': {e}"))?;
    match parts[..] {
        [x, y, w, h] if w >= 0.0 && h >= 0.0 => Ok(Shape::new(x, y, w, h)),
        [_, _, _, _] => Err(format!("shape '{s}' has a negative size")),
        _ => Err(format!("expected X,Y,W,H, got '{s}'")),
    }
}

pub fn parse() -> Args {
    Args::parse()
}

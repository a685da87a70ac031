use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

use chunkfmt::ChunkFileSpec;

#[derive(Parser)]
#[command(name = "chunkfmt")]
#[command(about = "Inspect chunked binary containers (IFF, RIFF, PNG, ...)")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lists the well known and configured formats
    Formats,

    /// Shows the textual and binary descriptor of a format
    Describe {
        /// Format name or a descriptor like `:t4s4<d+`
        format: String,
    },

    /// Lists the chunks of a container without reading the payloads
    List {
        /// Format name or descriptor, otherwise the configured default
        #[arg(short, long)]
        format: Option<String>,

        file: PathBuf,
    },

    /// Writes the payload of one chunk out
    Extract {
        /// Format name or descriptor, otherwise the configured default
        #[arg(short, long)]
        format: Option<String>,

        file: PathBuf,

        /// Position of the chunk in the container
        #[arg(short, long)]
        index: usize,

        /// Output file, stdout otherwise
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config")]
    Read(#[from] io::Error),

    #[error("Invalid config")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("No format given and no default configured")]
    NoFormat,
}

// Configuration
#[derive(Deserialize, Debug, Default)]
pub struct Config {
    /// Format used when a command doesn't name one
    pub default: Option<String>,

    #[serde(default)]
    pub formats: HashMap<String, ChunkFileSpec>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)?;
        Config::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Configured names win over well known ones, anything else is parsed as a descriptor.
    pub fn resolve(&self, name: &str) -> Result<ChunkFileSpec, ConfigError> {
        if let Some(spec) = self.formats.get(name) {
            return Ok(spec.clone());
        }
        if let Some(spec) = ChunkFileSpec::well_known(name) {
            return Ok(spec);
        }
        ChunkFileSpec::parse(name).map_err(|_| ConfigError::UnknownFormat(name.to_string()))
    }

    pub fn pick(&self, name: Option<&str>) -> Result<ChunkFileSpec, ConfigError> {
        match name.or(self.default.as_deref()) {
            Some(name) => self.resolve(name),
            None => Err(ConfigError::NoFormat),
        }
    }
}

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::process;

use clap::Parser;
use log::{debug, warn};

use chunkfmt::{ChunkSpec, FieldType, Header, WELL_KNOWN};

mod cli;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::Config;

type BoxError = Box<dyn std::error::Error>;

fn main() {
    env_logger::init();

    // Parse the cli
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), BoxError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    debug!("config: {:?}", config);

    match cli.command {
        Commands::Formats => {
            for name in WELL_KNOWN {
                let spec = config.resolve(name)?;
                println!("{:<12} {}", name, spec);
            }
            let mut names: Vec<_> = config.formats.keys().collect();
            names.sort();
            for name in names {
                println!("{:<12} {} (configured)", name, config.formats[name]);
            }
        }

        Commands::Describe { format } => {
            let spec = config.resolve(&format)?;
            println!("text:   {}", spec);
            println!("binary: {}", hex::encode(spec.to_bytes()));
            println!(
                "file header:  {} bytes",
                spec.file_spec().byte_count()
            );
            println!(
                "chunk header: {} bytes{}",
                spec.chunk_spec().header_byte_count(),
                if spec.chunk_spec().even_padded() { ", even padded" } else { "" }
            );
        }

        Commands::List { format, file } => {
            let spec = config.pick(format.as_deref())?;
            let mut reader = BufReader::new(File::open(&file)?);
            let index = spec.read_chunk_headers(&mut reader)?;

            println!("{}", render(spec.file_spec(), &index.header));
            for (i, entry) in index.entries.iter().enumerate() {
                println!(
                    "{:>4} @{:<8} {:>8}B  {}",
                    i,
                    entry.offset,
                    entry.length,
                    render(spec.chunk_spec(), &entry.header)
                );
            }
        }

        Commands::Extract {
            format,
            file,
            index,
            output,
        } => {
            let spec = config.pick(format.as_deref())?;
            let mut reader = BufReader::new(File::open(&file)?);
            let container = spec.read_chunk_file(&mut reader)?;

            let chunk = match container.get(index) {
                Some(chunk) => chunk,
                None => {
                    warn!("{} only has {} chunks", file.display(), container.len());
                    return Err(format!("no chunk at index {}", index).into());
                }
            };

            match output {
                Some(path) => fs::write(path, &chunk.data)?,
                None => io::stdout().lock().write_all(&chunk.data)?,
            }
        }
    }

    Ok(())
}

// One line per header, type tags shown as text
fn render(spec: &ChunkSpec, header: &Header) -> String {
    header
        .iter()
        .map(|(typ, value)| match (typ, spec.get_field(typ)) {
            (FieldType::CharType, Some(field)) => {
                format!("{}='{}'", typ.letter(), String::from_utf8_lossy(&field.tag_bytes(value)))
            }
            _ => format!("{}={}", typ.letter(), value),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Copyright 2023 Viktor Reusch
//
// This file is part of ais_kml.
//
// ais_kml is free software: you can redistribute it and/or modify it under the
// terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// ais_kml is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with ais_kml. If not, see <https://www.gnu.org/licenses/>.

//! This is the command-line interface of the AIS-to-KML converter.
//!
//! Scheme and host are taken from the CGI environment, so the binary can be
//! served directly by a web server with `--http-header`.

use std::{
    fs::File,
    io::{self, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use ais_kml::{load_tracks, write_network_links, write_tracks, TimeContext, UrlPrefix};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

mod config;

/// Convert AIS position feeds to KML for Google Earth
#[derive(Parser, Debug)]
#[command(name = "ais_kml", version, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Scheme of the request, used for absolute URLs
    #[arg(long, env = "REQUEST_SCHEME", global = true)]
    scheme: Option<String>,

    /// Host of the request, used for absolute URLs
    #[arg(long, env = "HTTP_HOST", global = true)]
    host: Option<String>,

    /// Prepend an HTTP Content-Type header to the output
    #[arg(long, global = true)]
    http_header: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one track per vessel of a position feed
    Tracks {
        /// Position feed with one JSON record per line (default: from config)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Write network links to the configured data products
    Links,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Conversion failed with: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => Default::default(),
    };
    let prefix = UrlPrefix::resolve(
        args.scheme.as_deref(),
        args.host.as_deref(),
        &config.default_prefix,
    );
    log::debug!("using URL prefix {}", prefix.as_str());

    // The document is complete before anything is written.
    let mut document = vec![];
    match &args.command {
        Command::Tracks { input } => {
            let input = input.as_ref().unwrap_or(&config.input);
            let tracks = load_tracks(input, &config.known_vessels, &TimeContext::local());
            write_tracks(&tracks, &prefix, &config.style, &mut document)?;
        }
        Command::Links => {
            write_network_links(
                &config.links.title,
                &prefix,
                &config.links.links,
                &mut document,
            )?;
        }
    }

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        ),
        None => Box::new(stdout().lock()),
    };
    emit(&mut sink, args.http_header, &document).context("Failed to write output")?;

    Ok(())
}

/// Write `document`, optionally preceded by an HTTP header.
fn emit(sink: &mut impl Write, http_header: bool, document: &[u8]) -> io::Result<()> {
    if http_header {
        write!(sink, "Content-Type: application/xml\r\n\r\n")?;
    }
    sink.write_all(document)?;
    sink.flush()
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .parse_env(Env::default())
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

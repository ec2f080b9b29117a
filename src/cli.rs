use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mediashelf",
    about = "Self-hosted media library — `mediashelf /path/to/media` and browse it",
    long_about = None,
    version,
    arg_required_else_help = true,
)]
pub struct Args {
    /// Library root directory containing videos, books, and subtitle sidecars
    pub root: PathBuf,

    /// HTTP port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind the HTTP listener to [default: 127.0.0.1]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite catalog file (":memory:" keeps the catalog in RAM) [default: <data dir>/mediashelf/mediashelf.db]
    #[arg(short, long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Path to TOML config file (overrides default search: ./mediashelf.toml, ~/.config/mediashelf/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the catalog sweep of the whole library at startup
    #[arg(long)]
    pub no_scan: bool,
}

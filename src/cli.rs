use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the map files
    pub dir: PathBuf,
    /// Map name, i.e. the shared prefix of `<name>.tiles.txt` etc.
    pub name: String,
    /// TOML file with decoder options
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Drop lines that reference missing tiles or items instead of failing
    #[arg(long)]
    pub lenient: bool,
    /// Write the decoded map as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
    /// Re-encode the map into this directory
    #[arg(long)]
    pub reencode: Option<PathBuf>,
}

use clap::Parser;
use log::LevelFilter;

use chordkv::cli::Cli;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new().with_level(LevelFilter::Info).init().unwrap();
    chordkv::run(cli).await
}

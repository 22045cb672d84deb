use clap::Parser;

/// Command-line surface for a single node process.
#[derive(Debug, Parser)]
#[command(name = "chordkv", about = "A Chord-ring replicated key-value node")]
pub struct Cli {
    #[arg(long)]
    pub host: String,

    #[arg(long)]
    pub port: u16,

    /// `host:port` of an existing node to join. Absent starts a new ring.
    #[arg(long)]
    pub bootstrap: Option<String>,
}

impl Cli {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

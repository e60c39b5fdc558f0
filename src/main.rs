use anyhow::Result;
use mergepulse::cli::Cli;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.execute()
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

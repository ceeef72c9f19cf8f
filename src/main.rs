use ase::{CapabilityRegistry, Settings, cli::Cli, error, run};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("ASE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = Settings::load(&cli)?;
    debug!(
        documents = settings.run.documents.len(),
        contents = settings.run.include_contents,
        segmentize = settings.run.segmentize,
        tokenize = settings.run.tokenize,
        cache_dir = ?settings.run.cache_dir,
        "configuration loaded"
    );

    let registry = CapabilityRegistry::builtin();
    let caps = registry.resolve_all(&settings.selectors)?;
    for (kind, name) in registry.resolved() {
        debug!(%kind, %name, "using implementation");
    }

    run::run(caps, &settings.run, &settings.search)?;
    Ok(())
}

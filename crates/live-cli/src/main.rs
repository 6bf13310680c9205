use tracing::error;
use tracing_subscriber::EnvFilter;

use live::Args;

const DEFAULT_LOG_FILTER: &str =
    "live=debug,live_engine=debug,live_transport=debug,live_provisioning=debug";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", live::USAGE);
            return;
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, live::USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = live::run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

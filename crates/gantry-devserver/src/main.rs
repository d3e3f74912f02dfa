use clap::Parser;
use gantry_devserver::DevProject;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "gantry-devserver", about = "Gantry development bundle server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8081)]
    port: u16,

    /// Host clients should use to reach this server.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Scope key to advertise in the manifest.
    #[arg(long)]
    scope_key: String,

    /// Path to the bundle file to serve.
    bundle: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let bundle = fs::read(&cli.bundle).expect("failed to read bundle file");
    let base_url = format!("http://{}:{}", cli.host, cli.port);
    info!("starting gantry-devserver on {base_url}");
    info!("serving {} ({} bytes)", cli.bundle.display(), bundle.len());

    let project = Arc::new(
        DevProject::new(&cli.scope_key, &base_url, bundle).with_project_root(
            cli.bundle
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ),
    );

    let addr = format!("0.0.0.0:{}", cli.port);
    let server = tiny_http::Server::http(&addr).expect("failed to bind HTTP server");
    gantry_devserver::run_server(&server, &project);
}

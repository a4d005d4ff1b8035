use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use selectel_webhook::{
    AppState, SharedState, api,
    secrets::{KubeClientConfig, SERVICE_ACCOUNT_DIR},
    solver::{SelectelSolver, Solver},
    validation::CredentialsValidator,
};
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// API group the webhook is registered under (e.g. acme.example.com)
    #[arg(long, env = "GROUP_NAME", value_name = "GROUP")]
    group_name: String,
    /// Listen address for the HTTP(S) server
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:8443")]
    listen: SocketAddr,
    /// PEM certificate chain; enables HTTPS together with the private key
    #[arg(long, value_name = "PATH", requires = "tls_private_key_file")]
    tls_cert_file: Option<PathBuf>,
    /// PEM private key matching --tls-cert-file
    #[arg(long, value_name = "PATH", requires = "tls_cert_file")]
    tls_private_key_file: Option<PathBuf>,
    /// Kubernetes API server URL (defaults to the in-cluster service)
    #[arg(long, value_name = "URL", requires = "kube_token_file")]
    kube_api_server: Option<String>,
    /// Bearer token file for --kube-api-server
    #[arg(long, value_name = "PATH")]
    kube_token_file: Option<PathBuf>,
    /// CA bundle for --kube-api-server
    #[arg(long, value_name = "PATH")]
    kube_ca_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.group_name.trim().is_empty() {
        bail!("GROUP_NAME must be specified");
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let state = init_shared_state(&cli, stop_rx).await?;
    let app = api::create_router(state);

    match (&cli.tls_cert_file, &cli.tls_private_key_file) {
        (Some(cert), Some(key)) => serve_tls(app, cli.listen, cert, key, stop_tx).await,
        _ => serve_plain(app, cli.listen, stop_tx).await,
    }
}

async fn init_shared_state(cli: &Cli, stop: watch::Receiver<bool>) -> Result<SharedState> {
    let kube = kube_client_config(cli)?;
    let validator = Arc::new(CredentialsValidator::new());

    let selectel = Arc::new(SelectelSolver::new(validator));
    selectel
        .initialize(&kube, stop)
        .await
        .context("failed to initialize selectel solver")?;

    Ok(Arc::new(AppState {
        group_name: cli.group_name.clone(),
        solvers: vec![selectel as Arc<dyn Solver>],
    }))
}

fn kube_client_config(cli: &Cli) -> Result<KubeClientConfig> {
    let config = match (&cli.kube_api_server, &cli.kube_token_file) {
        (Some(server), Some(token_file)) => {
            KubeClientConfig::from_files(server, token_file, cli.kube_ca_file.as_deref())
        }
        _ => KubeClientConfig::in_cluster(),
    };
    config.with_context(|| {
        format!("failed to load kubernetes client config (service account dir {SERVICE_ACCOUNT_DIR})")
    })
}

async fn serve_plain(app: Router, addr: SocketAddr, stop: watch::Sender<bool>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(stop))
        .await
        .context("server exited with error")?;

    Ok(())
}

async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    cert: &Path,
    key: &Path,
    stop: watch::Sender<bool>,
) -> Result<()> {
    // both reqwest and axum-server pull in rustls; pick the provider explicitly
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .context("failed to load TLS certificates")?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal(stop).await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("listening on https://{addr}");

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("server exited with error")?;

    Ok(())
}

async fn shutdown_signal(stop: watch::Sender<bool>) {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {err}");
    }
    info!("shutdown signal received");
    stop.send_replace(true);
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{
        controller::Action,
        reflector,
        watcher::{watcher, Config},
        Controller, WatchStreamExt,
    },
    Api, Client, ResourceExt,
};
use labely::{
    constants::{DEFAULT_PROTECTED_PREFIXES, ERROR_REQUEUE_SECS, RESYNC_INTERVAL_SECS},
    context::{parse_protected_prefixes, Context},
    crd::CustomLabel,
    metrics,
    reconcilers::{customlabels_to_retrigger, reconcile_customlabel},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// Namespace Label Operator for Kubernetes
#[derive(Debug, Parser)]
#[command(name = "labely", version, about)]
struct Args {
    /// Comma-separated substrings; a label key containing one is never
    /// managed, regardless of ownership state
    #[arg(long, env = "PROTECTED_PREFIXES", default_value = DEFAULT_PROTECTED_PREFIXES)]
    protected_prefixes: String,

    /// Bind address for the health and metrics endpoints
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    http_addr: SocketAddr,
}

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("labely-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging with custom format
    // Format: timestamp file:line LEVEL message
    //
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Example: RUST_LOG=debug cargo run
    //
    // Respects RUST_LOG_FORMAT environment variable for output format
    // Example: RUST_LOG_FORMAT=json cargo run
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Labely Namespace Label Operator");

    let protected_prefixes = parse_protected_prefixes(&args.protected_prefixes);
    info!("Protected prefixes: {:?}", protected_prefixes);

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    // Reflector store of all CustomLabels, used by the namespace watch
    // mapper for in-memory lookups.
    let (reader, writer) = reflector::store::<CustomLabel>();
    let customlabels = Api::<CustomLabel>::all(client.clone());
    let reflector_stream = reflector(writer, watcher(customlabels, Config::default()))
        .applied_objects()
        .boxed();
    tokio::spawn(async move {
        reflector_stream
            .for_each(|result| {
                if let Err(e) = result {
                    warn!("CustomLabel reflector error: {}", e);
                }
                futures::future::ready(())
            })
            .await;
    });

    let ctx = Arc::new(Context {
        client,
        customlabels: reader,
        protected_prefixes,
    });

    // The controller should never exit - if it does, log it and exit the
    // main process so the pod restarts.
    tokio::select! {
        result = run_customlabel_controller(ctx.clone()) => {
            error!("CRITICAL: CustomLabel controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("CustomLabel controller exited unexpectedly without error")
        }
        result = run_http_server(args.http_addr) => {
            error!("CRITICAL: HTTP server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HTTP server exited unexpectedly without error")
        }
    }
}

/// Run the `CustomLabel` controller.
///
/// Watches `CustomLabel` objects cluster-wide and namespaces for drift: a
/// namespace change re-triggers only the `CustomLabel`s whose desired keys
/// differ from the live label map.
async fn run_customlabel_controller(ctx: Arc<Context>) -> Result<()> {
    info!("Starting CustomLabel controller");

    let api = Api::<CustomLabel>::all(ctx.client.clone());
    let namespaces = Api::<Namespace>::all(ctx.client.clone());
    let store = ctx.customlabels.clone();

    Controller::new(api, Config::default())
        .watches(namespaces, Config::default(), move |ns: Namespace| {
            let known = store.state();
            customlabels_to_retrigger(&ns, known.iter().map(AsRef::as_ref))
        })
        .shutdown_on_signal()
        .run(reconcile_customlabel_wrapper, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    debug!(name = %obj.name, "CustomLabel reconciled successfully");
                }
                Err(e) => {
                    warn!(error = %e, "CustomLabel controller error");
                }
            }
        })
        .await;

    Ok(())
}

/// Reconcile wrapper for `CustomLabel`
async fn reconcile_customlabel_wrapper(
    customlabel: Arc<CustomLabel>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_customlabel(ctx, (*customlabel).clone()).await {
        Ok(()) => {
            info!(
                "Successfully reconciled CustomLabel: {}",
                customlabel.name_any()
            );
            metrics::record_reconciliation_success(start.elapsed());
            Ok(Action::requeue(Duration::from_secs(RESYNC_INTERVAL_SECS)))
        }
        Err(e) => {
            error!("Failed to reconcile CustomLabel: {}", e);
            metrics::record_reconciliation_error(start.elapsed());
            Err(e.into())
        }
    }
}

/// Error policy for the controller; the retry backoff lives here, never in
/// the reconciler.
fn error_policy(
    _resource: Arc<CustomLabel>,
    _err: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}

/// Serve `/healthz`, `/readyz` and `/metrics`.
async fn run_http_server(addr: SocketAddr) -> Result<()> {
    info!("Starting HTTP server on {}", addr);

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }))
        .route("/metrics", get(metrics_handler));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

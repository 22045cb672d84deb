pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod election;
pub mod error;
pub mod flood;
pub mod kv;
pub mod maintainer;
pub mod metrics;
pub mod node;
pub mod rpc;
pub mod types;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use log::{info, warn};

use cli::Cli;
use node::ChordNode;
use rpc::HttpPeerClient;

/// Process entry point: builds node state, attempts to join a bootstrap
/// ring (best-effort), spawns the maintenance loops, and serves the HTTP
/// API until the process is terminated.
pub async fn run(cli: Cli) -> std::io::Result<()> {
    let addr = cli.addr();
    let node = Arc::new(ChordNode::new(addr.clone(), Box::new(HttpPeerClient::new())));

    if let Some(bootstrap) = &cli.bootstrap {
        if node.join(bootstrap).await {
            info!("joined ring via bootstrap {bootstrap}");
        } else {
            warn!("bootstrap {bootstrap} unreachable, starting a standalone ring");
        }
    }

    let (_stop_tx, _maintenance_handles) = maintainer::spawn(node.clone());

    info!("serving {addr}");
    HttpServer::new(move || App::new().app_data(web::Data::new(node.clone())).configure(api::configure))
        .bind(&addr)?
        .run()
        .await
}

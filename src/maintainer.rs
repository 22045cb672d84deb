use std::sync::Arc;

use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{ANTI_ENTROPY_INTERVAL, FIX_FINGERS_INTERVAL, HEARTBEAT_INTERVAL, STABILIZE_INTERVAL};
use crate::node::ChordNode;

/// Spawns the four periodic maintenance loops as independent tasks on the
/// runtime, each with its own interval and a shared stop signal polled
/// between ticks. Returns their join handles and the sender used to
/// request shutdown.
pub fn spawn(node: Arc<ChordNode>) -> (watch::Sender<bool>, Vec<JoinHandle<()>>) {
    let (stop_tx, stop_rx) = watch::channel(false);

    let handles = vec![
        spawn_loop("stabilize", node.clone(), STABILIZE_INTERVAL, stop_rx.clone(), |n| {
            Box::pin(async move { n.stabilize_once().await })
        }),
        spawn_loop("fix_fingers", node.clone(), FIX_FINGERS_INTERVAL, stop_rx.clone(), |n| {
            Box::pin(async move { n.fix_fingers_tick().await })
        }),
        spawn_loop("heartbeat", node.clone(), HEARTBEAT_INTERVAL, stop_rx.clone(), |n| {
            Box::pin(async move { n.heartbeat_tick().await })
        }),
        spawn_loop("anti_entropy", node, ANTI_ENTROPY_INTERVAL, stop_rx, |n| {
            Box::pin(async move { n.anti_entropy_tick().await })
        }),
    ];

    (stop_tx, handles)
}

fn spawn_loop<F>(
    name: &'static str,
    node: Arc<ChordNode>,
    interval: std::time::Duration,
    mut stop_rx: watch::Receiver<bool>,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<ChordNode>) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    tick(node.clone()).await;
                    debug!("{name} tick complete");
                }
                _ = stop_rx.changed() => {
                    if *stop_rx.borrow() {
                        debug!("{name} loop stopping");
                        return;
                    }
                }
            }
        }
    })
}

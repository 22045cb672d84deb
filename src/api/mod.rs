pub mod flood;
pub mod kv;
pub mod metrics;
pub mod ring;

use actix_web::web::ServiceConfig;

/// Binds every endpoint of the external interface onto an actix-web app.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(ring::ping)
        .service(ring::get_predecessor)
        .service(ring::notify)
        .service(ring::get_successor)
        .service(ring::get_successor_list)
        .service(ring::find_successor)
        .service(ring::closest_preceding_or_self)
        .service(kv::put)
        .service(kv::get)
        .service(kv::replica_put)
        .service(kv::replica_get)
        .service(kv::replica_get_local)
        .service(kv::replica_sync)
        .service(flood::g_start_query)
        .service(flood::g_query)
        .service(metrics::metrics);
}

use std::sync::Arc;

use actix_web::{post, web, HttpResponse, Responder};
use log::debug;

use crate::kv::Version;
use crate::node::ChordNode;
use crate::rpc::dto::*;

#[post("/put")]
pub async fn put(node: web::Data<Arc<ChordNode>>, body: web::Json<PutRequest>) -> impl Responder {
    debug!("put {}", body.key);
    let writer_id = body.writer_id.clone().unwrap_or_default();
    let ts = node.handle_put(&body.key, &body.value, body.ts, &writer_id).await;
    HttpResponse::Ok().json(PutResponse { ok: true, ts })
}

#[post("/get")]
pub async fn get(node: web::Data<Arc<ChordNode>>, body: web::Json<GetRequest>) -> impl Responder {
    debug!("get {}", body.key);
    match node.handle_get(&body.key).await {
        Some(v) => HttpResponse::Ok().json(GetResponse::hit(v.value, v.ts, v.writer_id)),
        None => HttpResponse::Ok().json(GetResponse::miss()),
    }
}

#[post("/replica_put")]
pub async fn replica_put(node: web::Data<Arc<ChordNode>>, body: web::Json<ReplicaPutRequest>) -> impl Responder {
    debug!("replica_put {}", body.key);
    let version = Version::new(body.value.clone(), body.ts, body.writer_id.clone());
    node.replica_put_received(&body.key, version);
    HttpResponse::Ok().json(OkResponse::ok())
}

#[post("/replica_get")]
pub async fn replica_get(node: web::Data<Arc<ChordNode>>, body: web::Json<GetRequest>) -> impl Responder {
    match node.replica_get_local(&body.key) {
        Some(v) => HttpResponse::Ok().json(GetResponse::hit(v.value, v.ts, v.writer_id)),
        None => HttpResponse::Ok().json(GetResponse::miss()),
    }
}

/// Identical to `/replica_get`: a second, explicitly "local-only" name for
/// the same local-store read, kept as its own route for callers that
/// address replicas by this name.
#[post("/replica_get_local")]
pub async fn replica_get_local(node: web::Data<Arc<ChordNode>>, body: web::Json<GetRequest>) -> impl Responder {
    match node.replica_get_local(&body.key) {
        Some(v) => HttpResponse::Ok().json(GetResponse::hit(v.value, v.ts, v.writer_id)),
        None => HttpResponse::Ok().json(GetResponse::miss()),
    }
}

#[post("/replica_sync")]
pub async fn replica_sync(node: web::Data<Arc<ChordNode>>, body: web::Json<ReplicaSyncRequest>) -> impl Responder {
    let incoming = body
        .into_inner()
        .kv
        .into_iter()
        .map(|(k, (value, ts, writer_id))| (k, Version::new(value, ts, writer_id)))
        .collect();
    node.replica_sync_received(incoming);
    HttpResponse::Ok().json(OkResponse::ok())
}

use std::sync::Arc;

use actix_web::{get, web, HttpResponse, Responder};

use crate::node::ChordNode;

#[get("/metrics")]
pub async fn metrics(node: web::Data<Arc<ChordNode>>) -> impl Responder {
    HttpResponse::Ok().json(node.metrics_snapshot())
}

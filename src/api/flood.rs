use std::sync::Arc;

use actix_web::{post, web, HttpResponse, Responder};

use crate::node::ChordNode;
use crate::rpc::dto::{GQueryRequest, GStartQueryRequest};

#[post("/g_start_query")]
pub async fn g_start_query(node: web::Data<Arc<ChordNode>>, body: web::Json<GStartQueryRequest>) -> impl Responder {
    let result = node.start_query(&body.key, body.ttl).await;
    HttpResponse::Ok().json(result)
}

#[post("/g_query")]
pub async fn g_query(node: web::Data<Arc<ChordNode>>, body: web::Json<GQueryRequest>) -> impl Responder {
    let body = body.into_inner();
    let result = node.query_received(body.msg_id, &body.key, body.ttl, body.origin).await;
    HttpResponse::Ok().json(result)
}

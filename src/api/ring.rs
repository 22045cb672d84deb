use std::sync::Arc;

use actix_web::{post, web, HttpResponse, Responder};

use crate::node::ChordNode;
use crate::rpc::dto::*;

#[post("/ping")]
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().json(OkResponse::ok())
}

#[post("/get_predecessor")]
pub async fn get_predecessor(node: web::Data<Arc<ChordNode>>) -> impl Responder {
    HttpResponse::Ok().json(GetPredecessorResponse {
        predecessor: node.get_predecessor(),
    })
}

#[post("/notify")]
pub async fn notify(node: web::Data<Arc<ChordNode>>, body: web::Json<NotifyRequest>) -> impl Responder {
    node.notify_received(&body.node);
    HttpResponse::Ok().json(OkResponse::ok())
}

#[post("/get_successor")]
pub async fn get_successor(node: web::Data<Arc<ChordNode>>) -> impl Responder {
    HttpResponse::Ok().json(GetSuccessorResponse {
        successor: node.get_successor(),
    })
}

#[post("/get_successor_list")]
pub async fn get_successor_list(node: web::Data<Arc<ChordNode>>) -> impl Responder {
    HttpResponse::Ok().json(GetSuccessorListResponse {
        successor_list: node.get_successor_list(),
    })
}

#[post("/find_successor")]
pub async fn find_successor(node: web::Data<Arc<ChordNode>>, body: web::Json<FindSuccessorRequest>) -> impl Responder {
    let found = node.find_successor(body.id).await;
    HttpResponse::Ok().json(FindSuccessorResponse { node: found })
}

#[post("/closest_preceding_or_self")]
pub async fn closest_preceding_or_self(
    node: web::Data<Arc<ChordNode>>,
    body: web::Json<ClosestPrecedingRequest>,
) -> impl Responder {
    let found = node.closest_preceding_or_self(body.id);
    HttpResponse::Ok().json(ClosestPrecedingResponse { node: found })
}

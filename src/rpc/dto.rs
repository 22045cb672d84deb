use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Address, HashPos, NodeRef};

/// `NodeRef` is already a plain `{id, addr}` struct; reuse it directly as
/// the wire schema rather than introducing a parallel DTO type. `B = 32`
/// fits comfortably inside JSON's exact-integer range, so ids travel as
/// plain numbers rather than falling back to decimal strings.
pub type NodeRefDto = NodeRef;

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        OkResponse { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetPredecessorResponse {
    pub predecessor: Option<NodeRefDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub node: NodeRefDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetSuccessorResponse {
    pub successor: NodeRefDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetSuccessorListResponse {
    pub successor_list: Vec<NodeRefDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindSuccessorRequest {
    pub id: HashPos,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FindSuccessorResponse {
    pub node: NodeRefDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClosestPrecedingRequest {
    pub id: HashPos,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClosestPrecedingResponse {
    pub node: NodeRefDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ts: Option<u64>,
    #[serde(default)]
    pub writer_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    pub ts: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRequest {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GetResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_id: Option<String>,
}

impl GetResponse {
    pub fn miss() -> Self {
        GetResponse::default()
    }

    pub fn hit(value: String, ts: u64, writer_id: String) -> Self {
        GetResponse {
            found: true,
            value: Some(value),
            ts: Some(ts),
            writer_id: Some(writer_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaPutRequest {
    pub key: String,
    pub value: String,
    pub ts: u64,
    pub writer_id: String,
}

/// `{ key: [value, ts, writer_id] }` — a 3-tuple serializes as a JSON array
/// by default, matching the wire shape exactly.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaSyncRequest {
    pub kv: HashMap<String, (String, u64, String)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GStartQueryRequest {
    pub key: String,
    #[serde(default)]
    pub ttl: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GQueryRequest {
    #[serde(default)]
    pub msg_id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub origin: Option<Address>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FloodMatch {
    pub addr: Address,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FloodStats {
    pub forwarded: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FloodResult {
    pub matches: Vec<FloodMatch>,
    pub stats: FloodStats,
}

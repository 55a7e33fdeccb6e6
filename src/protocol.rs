//! Request and response bodies for the HTTP surface.
//!
//! Every response carries `success`; failures render through
//! [`crate::error::ApiError`] with `success: false` and an `error` string.

use crate::types::{PlayerId, RoomEvent, RoomKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomBody {
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    pub room_key: Option<String>,
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitBody {
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
    pub room_key: Option<String>,
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDataBody {
    pub room_key: Option<String>,
    pub player_id: Option<String>,
    pub typed: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuery {
    pub room_key: Option<String>,
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub success: bool,
    pub room_key: RoomKey,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub success: bool,
    pub player_id: PlayerId,
    pub room_key: RoomKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

/// Resolution of a long-poll request: the event that fired plus its
/// event-specific payload.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub event: RoomEvent,
    pub data: UpdateData,
}

/// `TEST_END` and `PLAYERS_UPDATE` share the roster shape; `TEST_START`
/// and `WORDS_UPDATE` share the challenge-text shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UpdateData {
    Players { players: Vec<PlayerSummary> },
    Chars { chars: String },
}

/// One roster entry, in room insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub id: PlayerId,
    pub wpm: f64,
    pub acc: f64,
}

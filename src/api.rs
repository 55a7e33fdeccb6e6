//! HTTP endpoints for the room/player surface.
//!
//! All request-level validation happens here; handlers short-circuit with
//! [`ApiError`] before touching any state.

use axum::{
    extract::{Query, State},
    Json,
};
use tokio::sync::broadcast::error::RecvError;

use crate::error::ApiError;
use crate::protocol::*;
use crate::state::AppState;
use crate::types::RoomEvent;

/// Create a new room and its first player.
///
/// POST /api/post/createRoom
pub async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomBody>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    tracing::debug!("createRoom endpoint called");

    let player_name = body
        .player_name
        .ok_or_else(|| ApiError::Validation("No player name provided.".to_string()))?;

    let room_key = state.create_room().await;
    let player_id = state.create_player(&player_name, &room_key).await?;

    Ok(Json(CreateRoomResponse {
        success: true,
        room_key,
        player_id,
    }))
}

/// Add a player to an existing room.
///
/// POST /api/post/join
pub async fn join(
    State(state): State<AppState>,
    Json(body): Json<JoinBody>,
) -> Result<Json<JoinResponse>, ApiError> {
    tracing::debug!("join endpoint called");

    let (Some(room_key), Some(player_name)) = (body.room_key, body.player_name) else {
        return Err(ApiError::Validation("Invalid parameters provided.".to_string()));
    };

    let player_id = state.create_player(&player_name, &room_key).await?;

    Ok(Json(JoinResponse {
        success: true,
        player_id,
        room_key,
    }))
}

/// Remove a player from its room and registry. Succeeds even when the
/// player is already gone.
///
/// POST /api/post/exit
pub async fn exit(
    State(state): State<AppState>,
    Json(body): Json<ExitBody>,
) -> Result<Json<OkResponse>, ApiError> {
    tracing::debug!("exit endpoint called");

    let player_id = body
        .player_id
        .ok_or_else(|| ApiError::Validation("No player ID provided.".to_string()))?;

    state.delete_player(&player_id).await;

    Ok(Json(OkResponse { success: true }))
}

/// Start a test in a room. Host only.
///
/// POST /api/post/start
pub async fn start(
    State(state): State<AppState>,
    Json(body): Json<StartBody>,
) -> Result<Json<OkResponse>, ApiError> {
    tracing::debug!("start endpoint called");

    let (Some(room_key), Some(player_id)) = (body.room_key, body.player_id) else {
        return Err(ApiError::Validation("Invalid parameters provided.".to_string()));
    };

    state.start_test(&room_key, &player_id).await?;

    Ok(Json(OkResponse { success: true }))
}

/// Record a player's typed progress for the running test.
///
/// POST /api/post/testData
pub async fn test_data(
    State(state): State<AppState>,
    Json(body): Json<TestDataBody>,
) -> Result<Json<OkResponse>, ApiError> {
    tracing::debug!("testData endpoint called");

    let (Some(_room_key), Some(player_id), Some(typed)) =
        (body.room_key, body.player_id, body.typed)
    else {
        return Err(ApiError::Validation("Invalid parameters provided.".to_string()));
    };

    state.submit_typed(&player_id, typed).await?;

    Ok(Json(OkResponse { success: true }))
}

/// Long-poll for the next event in a room. The response suspends until an
/// event fires, then carries the event tag and its payload.
///
/// GET /api/get/update
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
) -> Result<Json<UpdateResponse>, ApiError> {
    tracing::debug!("update endpoint called");

    // playerId is required but only roomKey selects the subscription.
    let (Some(room_key), Some(_player_id)) = (query.room_key, query.player_id) else {
        return Err(ApiError::Validation("Invalid parameters provided.".to_string()));
    };

    let mut events = state.subscribe(&room_key).await?;

    tracing::debug!("Waiting for event in room {}", room_key);
    let event = loop {
        match events.recv().await {
            Ok(event) => break event,
            // Fell behind the channel buffer; the next recv catches up.
            Err(RecvError::Lagged(_)) => continue,
            // Room was deleted while we were waiting.
            Err(RecvError::Closed) => {
                return Err(ApiError::NotFound("Room not found.".to_string()))
            }
        }
    };
    tracing::debug!("Event {:?} fired in room {}", event, room_key);

    let data = match event {
        RoomEvent::TestEnd | RoomEvent::PlayersUpdate => UpdateData::Players {
            players: state.player_summaries(&room_key).await?,
        },
        RoomEvent::TestStart | RoomEvent::WordsUpdate => UpdateData::Chars {
            chars: state.room_chars(&room_key).await?,
        },
    };

    Ok(Json(UpdateResponse {
        success: true,
        event,
        data,
    }))
}

use super::AppState;
use crate::error::ApiError;
use crate::types::{PlayerId, RoomEvent, RoomKey};
use crate::words::WORDS_PER_TEXT;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

/// How long a test runs before the server ends it.
pub const TEST_DURATION: Duration = Duration::from_millis(30_000);

/// Capacity of the per-room event channel. Subscribers take a single event
/// and detach, so the buffer only has to absorb short bursts.
const EVENT_CAPACITY: usize = 16;

/// One race session: ordered players, current host, challenge text, test
/// timing, and the event channel long-poll requests subscribe to.
///
/// Endpoint-level preconditions (host checks, "already running") live in
/// the request layer, not here.
pub struct Room {
    room_key: RoomKey,
    /// Insertion order determines player number.
    players: Vec<PlayerId>,
    host: Option<PlayerId>,
    /// Challenge text players type against.
    chars: String,
    /// Set while a test is running.
    test_started_at: Option<Instant>,
    events: broadcast::Sender<RoomEvent>,
    /// Abort handle of the scheduled test-end task, if a test is running.
    /// Nothing in the request surface cancels it; the timer fires
    /// unconditionally 30s after start unless the test is ended early.
    end_timer: Option<AbortHandle>,
}

impl Room {
    pub fn new(room_key: RoomKey, chars: String) -> Self {
        tracing::debug!("Creating room {}", room_key);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            room_key,
            players: Vec::new(),
            host: None,
            chars,
            test_started_at: None,
            events,
            end_timer: None,
        }
    }

    pub fn room_key(&self) -> &str {
        &self.room_key
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn chars(&self) -> &str {
        &self.chars
    }

    pub fn test_running(&self) -> bool {
        self.test_started_at.is_some()
    }

    /// Time since the current test started, `None` when idle.
    pub fn time_elapsed(&self) -> Option<Duration> {
        self.test_started_at.map(|started| started.elapsed())
    }

    /// Register a long-poll subscriber. The receiver is the subscription
    /// handle: dropping it after the first received event is the detach.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    /// Link a player to the room. The first player to enter becomes host.
    /// Duplicate adds are a no-op and fire nothing.
    pub fn add_player(&mut self, player_id: PlayerId) {
        if self.players.iter().any(|id| *id == player_id) {
            return;
        }

        tracing::debug!("Linking player {} to room {}", player_id, self.room_key);
        self.players.push(player_id.clone());

        if self.players.len() == 1 {
            tracing::info!(
                "Making player {} host of room {}",
                player_id,
                self.room_key
            );
            self.host = Some(player_id);
        }

        self.notify(RoomEvent::PlayersUpdate);
    }

    /// Unlink a player from the room, best-effort. When the host leaves,
    /// a remaining player is promoted uniformly at random.
    pub fn remove_player(&mut self, player_id: &str) {
        let Some(i) = self.players.iter().position(|id| id == player_id) else {
            tracing::warn!("Player {} not linked to room {}", player_id, self.room_key);
            return;
        };
        self.players.remove(i);

        if self.host.as_deref() == Some(player_id) {
            if self.players.is_empty() {
                tracing::info!("Removing host from room {}", self.room_key);
                self.host = None;
            } else {
                let mut rng = rand::rng();
                let next = self.players[rng.random_range(0..self.players.len())].clone();
                tracing::info!("Passing host of room {} to player {}", self.room_key, next);
                self.host = Some(next);
            }
        }

        self.notify(RoomEvent::PlayersUpdate);
    }

    /// Replace the challenge text with a freshly generated one.
    pub fn generate_more_words(&mut self, chars: String) {
        self.chars = chars;
        self.notify(RoomEvent::WordsUpdate);
    }

    pub(crate) fn begin_test(&mut self, end_timer: AbortHandle) {
        self.test_started_at = Some(Instant::now());
        self.end_timer = Some(end_timer);
        self.notify(RoomEvent::TestStart);
    }

    pub(crate) fn finish_test(&mut self) {
        tracing::info!("Ending test in room {}", self.room_key);
        self.test_started_at = None;
        if let Some(timer) = self.end_timer.take() {
            // No-op when the timer task itself got us here; past its sleep
            // it has no await left to cancel at.
            timer.abort();
        }
        self.notify(RoomEvent::TestEnd);
    }

    /// Wake every current subscriber with `event`. Send errors just mean
    /// nobody is long-polling right now.
    fn notify(&self, event: RoomEvent) {
        tracing::debug!("Firing {:?} in room {}", event, self.room_key);
        let _ = self.events.send(event);
    }
}

impl AppState {
    /// Allocate a room with a fresh key and challenge text.
    pub async fn create_room(&self) -> RoomKey {
        let mut rooms = self.rooms.write().await;
        let room_key = super::generate_id(&rooms);
        tracing::info!("Created room {}", room_key);

        let chars = self.words.random_text(WORDS_PER_TEXT);
        rooms.insert(room_key.clone(), Room::new(room_key.clone(), chars));
        room_key
    }

    /// Subscribe to the next event in a room.
    pub async fn subscribe(
        &self,
        room_key: &str,
    ) -> Result<broadcast::Receiver<RoomEvent>, ApiError> {
        let rooms = self.rooms.read().await;
        let room = rooms
            .get(room_key)
            .ok_or_else(|| ApiError::NotFound("Room not found.".to_string()))?;
        Ok(room.subscribe())
    }

    /// Current challenge text of a room.
    pub async fn room_chars(&self, room_key: &str) -> Result<String, ApiError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_key)
            .map(|room| room.chars().to_string())
            .ok_or_else(|| ApiError::NotFound("Room not found.".to_string()))
    }

    /// Start a test. Only the host may start one, and only while the room
    /// is idle. Schedules the deferred test-end task.
    pub async fn start_test(&self, room_key: &str, player_id: &str) -> Result<(), ApiError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_key)
            .ok_or_else(|| ApiError::NotFound("Room not found".to_string()))?;

        if room.host() != Some(player_id) {
            tracing::warn!("Player {} is not the host of room {}", player_id, room_key);
            return Err(ApiError::Forbidden("Not the host!".to_string()));
        }

        if room.test_running() {
            tracing::warn!("Test already running in room {}", room_key);
            return Err(ApiError::Forbidden("Test already running!".to_string()));
        }

        tracing::info!("Starting test in room {}", room_key);
        let end_timer = {
            let state = self.clone();
            let room_key = room_key.to_string();
            let duration = self.test_duration;
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                state.end_test(&room_key).await;
            })
            .abort_handle()
        };
        room.begin_test(end_timer);

        Ok(())
    }

    /// End the running test and notify subscribers. Normally invoked by
    /// the deferred timer; calling it early aborts the pending timer.
    pub async fn end_test(&self, room_key: &str) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_key) else {
            tracing::debug!("Test ended for missing room {}", room_key);
            return;
        };
        room.finish_test();
    }

    /// Remove a room from the registry. Linked players stay registered;
    /// pending long-polls observe the closed event channel.
    pub async fn delete_room(&self, room_key: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.remove(room_key).is_some() {
            tracing::info!("Deleted room {}", room_key);
        }
    }
}

mod player;
mod room;

pub use player::Player;
pub use room::{Room, TEST_DURATION};

use crate::words::WordList;
use crate::types::{PlayerId, RoomKey};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Length of generated room keys and player IDs.
const ID_LENGTH: usize = 6;

/// Shared application state: the room and player registries plus the word
/// list. Constructed once in `main` and injected into every handler.
///
/// Lock ordering: `rooms` before `players`, always.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomKey, Room>>>,
    pub players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    pub(crate) words: Arc<WordList>,
    pub(crate) test_duration: Duration,
}

impl AppState {
    pub fn new(words: WordList) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            words: Arc::new(words),
            test_duration: TEST_DURATION,
        }
    }

    /// Override the test duration (used by tests to avoid 30s waits).
    pub fn with_test_duration(mut self, duration: Duration) -> Self {
        self.test_duration = duration;
        self
    }
}

/// Generate a random numeric ID that is free in `existing`. Callers hold
/// the registry write lock, so the ID is still free at insertion time.
pub(crate) fn generate_id<V>(existing: &HashMap<String, V>) -> String {
    let mut rng = rand::rng();
    loop {
        let id: String = (0..ID_LENGTH)
            .map(|_| char::from(b'0' + rng.random_range(0..10)))
            .collect();
        if !existing.contains_key(&id) {
            return id;
        }
        // Collision, roll again.
    }
}

use super::AppState;
use crate::error::ApiError;
use crate::protocol::PlayerSummary;
use crate::types::{PlayerId, RoomKey};
use crate::words::WORDS_PER_TEXT;
use std::time::Duration;

/// One connected participant. A player belongs to exactly one room for
/// its whole lifetime.
pub struct Player {
    id: PlayerId,
    name: String,
    room_key: RoomKey,
    /// What the player has typed for the current test. Overwritten by each
    /// submission, never cleared between tests.
    typed: String,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, room_key: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            room_key: room_key.to_string(),
            typed: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room_key(&self) -> &str {
        &self.room_key
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn set_typed(&mut self, typed: String) {
        self.typed = typed;
    }

    /// Words per minute against `chars`, given the room's elapsed test
    /// time. Zero while no test is running or no time has passed.
    ///
    /// A word counts when the accumulated typed word equals the reference
    /// slice accumulated at the same absolute character positions — not at
    /// word-aligned positions, so the comparison drifts once a typed word
    /// differs in length from the reference word. A trailing partial word
    /// is never counted.
    pub fn wpm(&self, chars: &str, elapsed: Option<Duration>) -> f64 {
        let minutes = match elapsed {
            Some(elapsed) if !elapsed.is_zero() => elapsed.as_secs_f64() / 60.0,
            _ => return 0.0,
        };

        let reference: Vec<char> = chars.chars().collect();
        let mut correct_words = 0usize;
        let mut actual_word = String::new();
        let mut typed_word = String::new();

        for (i, character) in self.typed.chars().enumerate() {
            if character == ' ' {
                if actual_word == typed_word {
                    correct_words += 1;
                }
                actual_word.clear();
                typed_word.clear();
            } else {
                if let Some(&actual) = reference.get(i) {
                    actual_word.push(actual);
                }
                typed_word.push(character);
            }
        }

        correct_words as f64 / minutes
    }

    /// Per-character accuracy against `chars`, as a percentage of typed
    /// length. Empty input yields 0 rather than dividing by zero.
    pub fn acc(&self, chars: &str) -> f64 {
        let typed_len = self.typed.chars().count();
        if typed_len == 0 {
            return 0.0;
        }

        let reference: Vec<char> = chars.chars().collect();
        let correct = self
            .typed
            .chars()
            .enumerate()
            .filter(|(i, c)| reference.get(*i) == Some(c))
            .count();

        correct as f64 / typed_len as f64 * 100.0
    }
}

impl AppState {
    /// Allocate a player with a fresh ID and link it to `room_key`.
    pub async fn create_player(&self, name: &str, room_key: &str) -> Result<PlayerId, ApiError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_key)
            .ok_or_else(|| ApiError::NotFound("Room not found.".to_string()))?;

        let mut players = self.players.write().await;
        let id = super::generate_id(&players);
        tracing::info!("Created player {} in room {}", id, room_key);

        players.insert(id.clone(), Player::new(id.clone(), name, room_key));
        room.add_player(id.clone());

        Ok(id)
    }

    /// Remove a player from the registry and its room, best-effort.
    pub async fn delete_player(&self, player_id: &str) {
        let mut rooms = self.rooms.write().await;
        let mut players = self.players.write().await;

        let Some(player) = players.remove(player_id) else {
            tracing::debug!("Player {} not in registry", player_id);
            return;
        };

        tracing::info!("Deleting player {}", player_id);
        if let Some(room) = rooms.get_mut(player.room_key()) {
            room.remove_player(player_id);
        }
    }

    /// Record a typed-progress submission and regenerate the room's
    /// challenge text. Requires a running test in the player's room.
    pub async fn submit_typed(&self, player_id: &str, typed: String) -> Result<(), ApiError> {
        let mut rooms = self.rooms.write().await;
        let mut players = self.players.write().await;

        let player = players
            .get_mut(player_id)
            .ok_or_else(|| ApiError::NotFound("Player not found.".to_string()))?;

        let room = rooms
            .get_mut(player.room_key())
            .filter(|room| room.test_running())
            .ok_or_else(|| ApiError::NotFound("Test not running.".to_string()))?;

        player.set_typed(typed);
        room.generate_more_words(self.words.random_text(WORDS_PER_TEXT));

        Ok(())
    }

    /// Roster snapshot for a room, in insertion order, with live scores.
    pub async fn player_summaries(
        &self,
        room_key: &str,
    ) -> Result<Vec<PlayerSummary>, ApiError> {
        let rooms = self.rooms.read().await;
        let room = rooms
            .get(room_key)
            .ok_or_else(|| ApiError::NotFound("Room not found.".to_string()))?;

        let players = self.players.read().await;
        let elapsed = room.time_elapsed();

        Ok(room
            .players()
            .iter()
            .filter_map(|id| players.get(id))
            .map(|player| PlayerSummary {
                name: player.name().to_string(),
                id: player.id().to_string(),
                wpm: player.wpm(room.chars(), elapsed),
                acc: player.acc(room.chars()),
            })
            .collect())
    }
}

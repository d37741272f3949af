//! The registry: tracks every live user and every live game in the
//! process.
//!
//! # Concurrency note
//!
//! `Registry` is NOT thread-safe by itself — it uses plain `HashMap`s, not
//! concurrent ones. This is intentional: it is owned by a single
//! `tokio::sync::Mutex<Registry>` shared across connection tasks, so only
//! one operation ever touches the maps at a time. A game's own state,
//! once created, lives behind its `GameHandle` and is never touched here
//! directly — so a lookup never blocks on anything a `Game` actor does.

use std::collections::HashMap;
use std::sync::Arc;

use doodle_game::{
    choose_game_length, spawn_game, GameHandle, GameRng, GameRules, LeaveOutcome, MemberSink,
    PhraseSource,
};
use doodle_protocol::Difficulty;

use crate::error::RegistryError;
use crate::user::User;

/// The process-wide registry of connected users and live games.
pub struct Registry {
    users: HashMap<String, User>,
    games: HashMap<String, GameHandle>,
    rules: GameRules,
    phrase_source: Arc<dyn PhraseSource>,
    rng: Arc<dyn GameRng>,
}

impl Registry {
    pub fn new(
        rules: GameRules,
        phrase_source: Arc<dyn PhraseSource>,
        rng: Arc<dyn GameRng>,
    ) -> Self {
        Self {
            users: HashMap::new(),
            games: HashMap::new(),
            rules,
            phrase_source,
            rng,
        }
    }

    /// Registers a newly-connected user. Fails if the username is already
    /// taken by a live connection.
    pub fn connect(&mut self, username: String, sink: MemberSink) -> Result<(), RegistryError> {
        if self.users.contains_key(&username) {
            return Err(RegistryError::UserAlreadyExists(username));
        }
        self.users.insert(username.clone(), User::new(username, sink));
        Ok(())
    }

    /// Removes a user's connection, leaving whatever game they were a
    /// member of.
    pub async fn disconnect(&mut self, username: &str) {
        let Some(user) = self.users.remove(username) else {
            return;
        };
        if let Some(game_id) = user.game_id().map(str::to_string) {
            self.leave_internal(username, &game_id).await;
        }
    }

    /// CREATE: spawns a new game owned by `creator`, who is auto-joined.
    pub async fn create_game(
        &mut self,
        creator: &str,
        game_id: String,
        difficulty: Difficulty,
    ) -> Result<GameHandle, RegistryError> {
        if self.games.contains_key(&game_id) {
            return Err(RegistryError::GameExists(game_id));
        }
        let user = self
            .users
            .get_mut(creator)
            .ok_or_else(|| RegistryError::UserNotExist(creator.to_string()))?;
        if user.game_id().is_some() {
            return Err(RegistryError::AlreadyInGame);
        }

        let game_length = choose_game_length(&self.rules, &*self.rng);
        let handle = spawn_game(
            game_id.clone(),
            creator.to_string(),
            user.sink().clone(),
            difficulty,
            game_length,
            self.rules.clone(),
            self.phrase_source.clone(),
            self.rng.clone(),
        );
        user.set_game_id(Some(game_id.clone()));
        self.games.insert(game_id, handle.clone());
        Ok(handle)
    }

    /// JOIN: adds an existing user to an existing game.
    pub async fn join_game(
        &mut self,
        username: &str,
        game_id: &str,
    ) -> Result<GameHandle, RegistryError> {
        let sink = {
            let user = self
                .users
                .get(username)
                .ok_or_else(|| RegistryError::UserNotExist(username.to_string()))?;
            if let Some(current) = user.game_id() {
                if current != game_id {
                    return Err(RegistryError::AlreadyInGame);
                }
            }
            user.sink().clone()
        };
        let handle = self
            .games
            .get(game_id)
            .cloned()
            .ok_or_else(|| RegistryError::GameNotExist(game_id.to_string()))?;

        handle.join(username.to_string(), sink).await?;
        self.users
            .get_mut(username)
            .expect("checked above")
            .set_game_id(Some(game_id.to_string()));
        Ok(handle)
    }

    /// LEAVE: removes `username` from `game_id`. A no-op (`Ok`) if the
    /// game doesn't exist or the user isn't a member of it.
    pub async fn leave_game(&mut self, username: &str, game_id: &str) -> Result<(), RegistryError> {
        if !self.games.contains_key(game_id) {
            return Err(RegistryError::GameNotExist(game_id.to_string()));
        }
        self.leave_internal(username, game_id).await;
        Ok(())
    }

    /// END: only the game's creator may end it. Removes the game from the
    /// registry immediately (spec §8 scenario 5).
    pub async fn end_game(&mut self, username: &str, game_id: &str) -> Result<(), RegistryError> {
        let handle = self.get_game(game_id)?;
        handle.end(username.to_string()).await?;
        self.remove_game(game_id);
        Ok(())
    }

    async fn leave_internal(&mut self, username: &str, game_id: &str) {
        let Some(handle) = self.games.get(game_id).cloned() else {
            return;
        };
        let outcome = handle
            .leave(username.to_string())
            .await
            .unwrap_or(LeaveOutcome::Continued);

        if let Some(user) = self.users.get_mut(username) {
            user.set_game_id(None);
        }

        if outcome == LeaveOutcome::Ended {
            self.remove_game(game_id);
        }
    }

    fn remove_game(&mut self, game_id: &str) {
        self.games.remove(game_id);
        for user in self.users.values_mut() {
            if user.game_id() == Some(game_id) {
                user.set_game_id(None);
            }
        }
    }

    pub fn get_game(&self, game_id: &str) -> Result<GameHandle, RegistryError> {
        self.games
            .get(game_id)
            .cloned()
            .ok_or_else(|| RegistryError::GameNotExist(game_id.to_string()))
    }

    pub fn get_user(&self, username: &str) -> Result<&User, RegistryError> {
        self.users
            .get(username)
            .ok_or_else(|| RegistryError::UserNotExist(username.to_string()))
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_game::{ScriptedRng, StaticPhraseSource};
    use tokio::sync::mpsc;

    fn registry() -> Registry {
        let rng: Arc<dyn GameRng> = Arc::new(ScriptedRng::constant(0));
        let mut dict = HashMap::new();
        dict.insert(Difficulty::Medium, vec!["red apple".to_string()]);
        let source = Arc::new(StaticPhraseSource::new(dict, rng.clone()));
        Registry::new(GameRules::default(), source, rng)
    }

    fn sink() -> MemberSink {
        mpsc::unbounded_channel().0
    }

    #[tokio::test]
    async fn connect_rejects_duplicate_username() {
        let mut reg = registry();
        reg.connect("alice".into(), sink()).unwrap();
        let err = reg.connect("alice".into(), sink()).unwrap_err();
        assert!(matches!(err, RegistryError::UserAlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_game_requires_connected_creator() {
        let mut reg = registry();
        let err = reg
            .create_game("alice", "g1".into(), Difficulty::Medium)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UserNotExist(_)));
    }

    #[tokio::test]
    async fn create_game_then_duplicate_id_fails() {
        let mut reg = registry();
        reg.connect("alice".into(), sink()).unwrap();
        reg.create_game("alice", "g1".into(), Difficulty::Medium)
            .await
            .unwrap();

        reg.connect("bob".into(), sink()).unwrap();
        let err = reg
            .create_game("bob", "g1".into(), Difficulty::Medium)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::GameExists(_)));
    }

    #[tokio::test]
    async fn join_unknown_game_fails() {
        let mut reg = registry();
        reg.connect("alice".into(), sink()).unwrap();
        let err = reg.join_game("alice", "missing").await.unwrap_err();
        assert!(matches!(err, RegistryError::GameNotExist(_)));
    }

    #[tokio::test]
    async fn creator_end_removes_game_from_registry() {
        let mut reg = registry();
        reg.connect("alice".into(), sink()).unwrap();
        reg.create_game("alice", "g1".into(), Difficulty::Medium)
            .await
            .unwrap();

        reg.end_game("alice", "g1").await.unwrap();

        let err = reg.get_game("g1").unwrap_err();
        assert!(matches!(err, RegistryError::GameNotExist(_)));
    }

    #[tokio::test]
    async fn disconnect_clears_game_membership() {
        let mut reg = registry();
        reg.connect("alice".into(), sink()).unwrap();
        reg.create_game("alice", "g1".into(), Difficulty::Medium)
            .await
            .unwrap();

        reg.disconnect("alice").await;
        assert!(reg.get_game("g1").is_err(), "creator disconnect ends the game");
        assert!(!reg.contains_user("alice"));
    }
}

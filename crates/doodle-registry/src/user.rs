//! `User`: a live connection tracked by the [`crate::Registry`].

use doodle_game::MemberSink;

/// One connected user. `game_id` tracks which game this user is currently
/// a member of, if any — set by [`crate::Registry::create_game`] /
/// [`crate::Registry::join_game`], cleared on leave or disconnect.
#[derive(Debug)]
pub struct User {
    username: String,
    sink: MemberSink,
    game_id: Option<String>,
}

impl User {
    pub(crate) fn new(username: String, sink: MemberSink) -> Self {
        Self {
            username,
            sink,
            game_id: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn sink(&self) -> &MemberSink {
        &self.sink
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub(crate) fn set_game_id(&mut self, game_id: Option<String>) {
        self.game_id = game_id;
    }
}

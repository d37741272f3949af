//! `Game`: the per-room actor that owns turn and trick scheduling, draw
//! fan-out, chat censorship and guess detection, and history replay.
//!
//! Each game runs as an isolated Tokio task communicating through an
//! `mpsc` command channel (the "single-owner actor" pattern spec §5
//! requires): every mutation — membership, history, turn advance, guess-
//! win-and-cancel — is processed one command at a time, so a scheduled
//! timer firing can never race an inbound chat guess.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use doodle_protocol::{
    ChatMessage, Difficulty, ErrorMessage, GameMessage, Message, Operation,
    Payload, PictureMessage, Topic, TopicType, TrickMessage, TurnMessage,
};
use doodle_sched::ScheduledTask;
use tokio::sync::{mpsc, oneshot};

use crate::error::GameError;
use crate::phrase::PhraseSource;
use crate::rng::GameRng;
use crate::rules::GameRules;
use crate::trick::{self, TRICK_SENDER};
use crate::turn::{Turn, MASKED_PHRASE};

/// Channel used to deliver outbound envelopes to one member's connection.
/// The receiving end lives in a per-connection writer task (owned by the
/// `doodle` crate) that serializes each `Message` and writes it to the
/// transport in arrival order — this is what gives a single User's sends
/// their strict ordering guarantee (spec §4.2).
pub type MemberSink = mpsc::UnboundedSender<Message>;

const COMMAND_CHANNEL_SIZE: usize = 128;

/// What happened as a result of a LEAVE command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The game continues (possibly now inactive, if membership dropped
    /// below the minimum).
    Continued,
    /// The leaving member was the creator: the game is now ended and
    /// should be removed from the registry.
    Ended,
}

pub(crate) enum GameCommand {
    Join {
        user: String,
        sink: MemberSink,
        reply: oneshot::Sender<()>,
    },
    Leave {
        user: String,
        reply: oneshot::Sender<LeaveOutcome>,
    },
    Start {
        user: String,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    End {
        user: String,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Draw {
        sender: String,
        op: Operation,
        payload: PictureMessage,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Chat {
        sender: String,
        text: String,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Members {
        reply: oneshot::Sender<Vec<String>>,
    },
    BroadcastError {
        exception: String,
        value: String,
        reply: oneshot::Sender<()>,
    },
    TurnTimerFired,
    TrickFired {
        op: Operation,
    },
    PostWinElapsed,
    Shutdown,
}

/// A cheap, cloneable handle to a running [`Game`] actor. This is what the
/// registry holds in its game map.
#[derive(Clone)]
pub struct GameHandle {
    game_id: String,
    creator: String,
    difficulty: Difficulty,
    game_length: u32,
    tx: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn game_length(&self) -> u32 {
        self.game_length
    }

    pub async fn join(
        &self,
        user: String,
        sink: MemberSink,
    ) -> Result<(), GameError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GameCommand::Join { user, sink, reply })
            .await
            .map_err(|_| GameError::GameUnavailable)?;
        rx.await.map_err(|_| GameError::GameUnavailable)
    }

    pub async fn leave(&self, user: String) -> Result<LeaveOutcome, GameError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GameCommand::Leave { user, reply })
            .await
            .map_err(|_| GameError::GameUnavailable)?;
        rx.await.map_err(|_| GameError::GameUnavailable)
    }

    pub async fn start(&self, user: String) -> Result<(), GameError> {
        self.round_trip(|reply| GameCommand::Start { user, reply }).await
    }

    pub async fn end(&self, user: String) -> Result<(), GameError> {
        self.round_trip(|reply| GameCommand::End { user, reply }).await
    }

    pub async fn draw(
        &self,
        sender: String,
        op: Operation,
        payload: PictureMessage,
    ) -> Result<(), GameError> {
        self.round_trip(|reply| GameCommand::Draw {
            sender,
            op,
            payload,
            reply,
        })
        .await
    }

    pub async fn chat(
        &self,
        sender: String,
        text: String,
    ) -> Result<(), GameError> {
        self.round_trip(|reply| GameCommand::Chat { sender, text, reply })
            .await
    }

    pub async fn members(&self) -> Vec<String> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(GameCommand::Members { reply }).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Broadcasts an arbitrary `ERROR` envelope to every current member.
    /// Used by the dispatcher's ErrorRouter (spec §4.10) for errors that
    /// originate outside the actor itself (e.g. `CannotStartNotOwnGame`,
    /// `GameAlreadyStarted`) but are still addressed to a known game.
    /// A no-op if the actor has already stopped.
    pub async fn broadcast_error(&self, exception: impl Into<String>, value: impl Into<String>) {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(GameCommand::BroadcastError {
                exception: exception.into(),
                value: value.into(),
                reply,
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    async fn round_trip<F>(&self, build: F) -> Result<(), GameError>
    where
        F: FnOnce(oneshot::Sender<Result<(), GameError>>) -> GameCommand,
    {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| GameError::GameUnavailable)?;
        rx.await.map_err(|_| GameError::GameUnavailable)?
    }
}

/// Picks `game_length` uniformly from `rules.game_length_range` (spec
/// §4.8 CREATE step).
pub fn choose_game_length(rules: &GameRules, rng: &dyn GameRng) -> u32 {
    let (lo, hi) = rules.game_length_range;
    let span = (hi - lo + 1) as usize;
    lo + rng.index(span) as u32
}

/// Spawns a new game actor and returns a handle to it. The creator is
/// auto-joined (spec §4.8 CREATE: "Auto-join creator").
pub fn spawn_game(
    game_id: String,
    creator: String,
    creator_sink: MemberSink,
    difficulty: Difficulty,
    game_length: u32,
    rules: GameRules,
    phrase_source: Arc<dyn PhraseSource>,
    rng: Arc<dyn GameRng>,
) -> GameHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let mut senders = HashMap::new();
    senders.insert(creator.clone(), creator_sink);
    let mut scores = HashMap::new();
    scores.insert(creator.clone(), 0);

    let actor = GameActor {
        game_id: game_id.clone(),
        creator: creator.clone(),
        difficulty,
        game_length,
        rules,
        phrase_source,
        rng,
        members: vec![creator.clone()],
        senders,
        history: Vec::new(),
        turns: Vec::new(),
        scores,
        active: false,
        current_turn_no: 0,
        last_drawer: None,
        last_phrase: None,
        scheduled_next_turn: None,
        scheduled_trick: None,
        self_tx: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    GameHandle {
        game_id,
        creator,
        difficulty,
        game_length,
        tx,
    }
}

/// The actor's private state. Never shared — exactly one Tokio task ever
/// touches it.
struct GameActor {
    game_id: String,
    creator: String,
    difficulty: Difficulty,
    game_length: u32,
    rules: GameRules,
    phrase_source: Arc<dyn PhraseSource>,
    rng: Arc<dyn GameRng>,

    members: Vec<String>,
    senders: HashMap<String, MemberSink>,
    history: Vec<Message>,
    turns: Vec<Turn>,
    scores: HashMap<String, u32>,
    active: bool,
    current_turn_no: u32,
    last_drawer: Option<String>,
    last_phrase: Option<String>,
    scheduled_next_turn: Option<ScheduledTask>,
    scheduled_trick: Option<ScheduledTask>,

    self_tx: mpsc::Sender<GameCommand>,
    receiver: mpsc::Receiver<GameCommand>,
}

impl GameActor {
    async fn run(mut self) {
        tracing::info!(game_id = %self.game_id, "game actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                GameCommand::Join { user, sink, reply } => {
                    self.handle_join(user, sink);
                    let _ = reply.send(());
                }
                GameCommand::Leave { user, reply } => {
                    let outcome = self.handle_leave(&user);
                    let ended = outcome == LeaveOutcome::Ended;
                    let _ = reply.send(outcome);
                    if ended {
                        break;
                    }
                }
                GameCommand::Start { user, reply } => {
                    let result = self.handle_start(&user);
                    let _ = reply.send(result);
                }
                GameCommand::End { user, reply } => {
                    let result = self.handle_end(&user);
                    let ended = result.is_ok();
                    let _ = reply.send(result);
                    if ended {
                        break;
                    }
                }
                GameCommand::Draw {
                    sender,
                    op,
                    payload,
                    reply,
                } => {
                    self.handle_draw(sender, op, payload);
                    let _ = reply.send(Ok(()));
                }
                GameCommand::Chat {
                    sender,
                    text,
                    reply,
                } => {
                    self.handle_chat(sender, text);
                    let _ = reply.send(Ok(()));
                }
                GameCommand::Members { reply } => {
                    let _ = reply.send(self.members.clone());
                }
                GameCommand::BroadcastError {
                    exception,
                    value,
                    reply,
                } => {
                    self.broadcast_error_raw(&exception, &value);
                    let _ = reply.send(());
                }
                GameCommand::TurnTimerFired => {
                    if let Some(t) = self.scheduled_trick.take() {
                        t.cancel();
                    }
                    self.advance_turn();
                }
                GameCommand::TrickFired { op } => {
                    self.send_trick(op);
                }
                GameCommand::PostWinElapsed => {
                    self.advance_turn();
                }
                GameCommand::Shutdown => break,
            }
        }

        tracing::info!(game_id = %self.game_id, "game actor stopped");
    }

    // -- membership ---------------------------------------------------

    fn handle_join(&mut self, user: String, sink: MemberSink) {
        let already_member = self.members.contains(&user);
        if !already_member {
            self.members.push(user.clone());
            self.scores.entry(user.clone()).or_insert(0);
        }
        self.senders.insert(user.clone(), sink);
        self.broadcast_game_op(Operation::Join, &user, None);
        if !already_member {
            self.replay_history_to(&user);
        }
    }

    fn handle_leave(&mut self, user: &str) -> LeaveOutcome {
        if user == self.creator {
            self.end_game_with_error();
            return LeaveOutcome::Ended;
        }

        if !self.remove_member(user) {
            return LeaveOutcome::Continued;
        }

        self.broadcast_game_op(Operation::Leave, user, None);

        if self.active && self.members.len() < self.rules.min_players {
            self.deactivate_for_not_enough_players();
        }

        LeaveOutcome::Continued
    }

    fn remove_member(&mut self, user: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != user);
        self.senders.remove(user);
        self.members.len() != before
    }

    // -- lifecycle ------------------------------------------------------

    fn handle_start(&mut self, user: &str) -> Result<(), GameError> {
        if user != self.creator {
            return Err(GameError::CannotStartNotOwnGame);
        }
        if self.active {
            return Err(GameError::GameAlreadyStarted);
        }
        self.active = true;
        self.advance_turn();
        Ok(())
    }

    fn handle_end(&mut self, _user: &str) -> Result<(), GameError> {
        self.end_game_with_error();
        Ok(())
    }

    fn end_game_with_error(&mut self) {
        self.active = false;
        self.cancel_scheduled();
        self.broadcast_error(GameError::GameEnded);
    }

    fn deactivate_for_not_enough_players(&mut self) {
        self.active = false;
        self.cancel_scheduled();
        self.broadcast_error(GameError::NotEnoughPlayers);
    }

    fn cancel_scheduled(&mut self) {
        if let Some(t) = self.scheduled_next_turn.take() {
            t.cancel();
        }
        if let Some(t) = self.scheduled_trick.take() {
            t.cancel();
        }
    }

    // -- drawing ----------------------------------------------------------

    fn handle_draw(&mut self, sender: String, op: Operation, payload: PictureMessage) {
        let msg = Message::new(Topic::new(TopicType::Draw, op), sender)
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Draw(payload));
        self.history.push(msg.clone());
        self.broadcast_all(msg);
    }

    // -- chat / guessing --------------------------------------------------

    fn handle_chat(&mut self, sender: String, text: String) {
        let mut broadcast_text = text.clone();

        if let Some(turn) = self.turns.last().cloned() {
            if turn.winner.is_none() {
                if sender == turn.drawer {
                    broadcast_text = censor(&text, &turn.phrase);
                } else if is_winning_guess(&text, &turn.phrase) {
                    self.record_win(sender.clone(), turn);
                }
            }
        }

        let chat_msg = Message::new(Topic::new(TopicType::Chat, Operation::Say), sender.clone())
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Chat(ChatMessage {
                sender,
                message: broadcast_text,
            }));
        self.history.push(chat_msg.clone());
        self.broadcast_all(chat_msg);
    }

    fn record_win(&mut self, winner: String, mut turn: Turn) {
        turn.winner = Some(winner.clone());
        let idx = self.turns.len() - 1;
        self.turns[idx] = turn.clone();

        self.cancel_scheduled();

        let points = self.rules.score_for(turn.level);
        *self.scores.entry(winner.clone()).or_insert(0) += points;

        let turn_msg = TurnMessage {
            turn_no: turn.turn_no,
            active: true,
            level: turn.level,
            drawer: Some(turn.drawer.clone()),
            duration: turn.duration_secs,
            phrase: turn.phrase.clone(),
            winner: Some(winner.clone()),
            score: self.scores.clone(),
        };
        let msg = Message::new(Topic::new(TopicType::Game, Operation::Win), winner)
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Game(GameMessage {
                success: true,
                game_id: self.game_id.clone(),
                difficulty: None,
                game_length: None,
                turn: Some(turn_msg),
                members: None,
            }));
        self.broadcast_all(msg);

        let pause = Duration::from_secs(self.rules.post_win_pause_secs);
        let tx = self.self_tx.clone();
        self.scheduled_next_turn = Some(ScheduledTask::spawn(pause, async move {
            let _ = tx.send(GameCommand::PostWinElapsed).await;
        }));
    }

    // -- turn advance -------------------------------------------------

    fn advance_turn(&mut self) {
        match self.play_turn() {
            Ok(()) => {
                let turn = self.turns.last().cloned().expect("just pushed");
                self.schedule_turn_timers(&turn);
            }
            Err(GameError::NotEnoughPlayers) => {
                self.deactivate_for_not_enough_players();
            }
            Err(GameError::GameEnded) => {
                self.active = false;
                self.broadcast_game_end();
            }
            Err(_) => {}
        }
    }

    fn play_turn(&mut self) -> Result<(), GameError> {
        if self.members.len() < self.rules.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        let next_no = self.current_turn_no + 1;
        if next_no > self.game_length {
            return Err(GameError::GameEnded);
        }
        self.current_turn_no = next_no;

        let drawer = self.pick_drawer();
        let duration = self.pick_duration();
        let phrase = self.pick_phrase()?;

        let turn = Turn::new(
            self.current_turn_no,
            self.difficulty,
            &drawer,
            duration,
            &phrase,
        );
        self.turns.push(turn.clone());
        self.last_drawer = Some(drawer.clone());
        self.last_phrase = Some(phrase);
        self.scores.entry(drawer.clone()).or_insert(0);

        self.send_turn_message(&drawer, &turn, true);
        for member in self.members.clone() {
            if member != drawer {
                self.send_turn_message(&member, &turn, false);
            }
        }

        Ok(())
    }

    fn pick_drawer(&self) -> String {
        let candidates: Vec<&String> = self
            .members
            .iter()
            .filter(|m| Some(m.as_str()) != self.last_drawer.as_deref())
            .collect();
        if candidates.is_empty() {
            return self.members[0].clone();
        }
        let idx = self.rng.index(candidates.len());
        candidates[idx].clone()
    }

    fn pick_duration(&self) -> u32 {
        let durations = &self.rules.turn_durations;
        durations[self.rng.index(durations.len())]
    }

    fn pick_phrase(&mut self) -> Result<String, GameError> {
        let mut phrase = self.phrase_source.phrase(self.difficulty)?;
        let mut attempts = 0;
        while Some(phrase.as_str()) == self.last_phrase.as_deref() && attempts < 8 {
            phrase = self.phrase_source.phrase(self.difficulty)?;
            attempts += 1;
        }
        Ok(phrase)
    }

    fn schedule_turn_timers(&mut self, turn: &Turn) {
        let dur = Duration::from_secs(turn.duration_secs as u64);
        let tx = self.self_tx.clone();
        self.scheduled_next_turn = Some(ScheduledTask::spawn(dur, async move {
            let _ = tx.send(GameCommand::TurnTimerFired).await;
        }));

        let trick_delay = Duration::from_secs(trick::delay_secs(turn, &*self.rng));
        let op = trick::choose_trick(&*self.rng);
        let tx2 = self.self_tx.clone();
        self.scheduled_trick = Some(ScheduledTask::spawn(trick_delay, async move {
            let _ = tx2.send(GameCommand::TrickFired { op }).await;
        }));
    }

    fn send_trick(&self, op: Operation) {
        let Some(turn) = self.turns.last() else {
            return;
        };
        let Some(sink) = self.senders.get(&turn.drawer) else {
            return;
        };
        let msg = Message::new(Topic::new(TopicType::Trick, op), TRICK_SENDER)
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Trick(TrickMessage {
                game_id: self.game_id.clone(),
                description: trick::description(op).to_string(),
            }));
        let _ = sink.send(msg);
    }

    // -- outbound helpers -------------------------------------------------

    fn send_turn_message(&self, member: &str, turn: &Turn, is_drawer: bool) {
        let Some(sink) = self.senders.get(member) else {
            return;
        };
        let turn_msg = TurnMessage {
            turn_no: turn.turn_no,
            active: true,
            level: turn.level,
            drawer: Some(turn.drawer.clone()),
            duration: turn.duration_secs,
            phrase: if is_drawer {
                turn.phrase.clone()
            } else {
                MASKED_PHRASE.to_string()
            },
            winner: None,
            score: self.scores.clone(),
        };
        let msg = Message::new(Topic::new(TopicType::Game, Operation::Turn), turn.drawer.clone())
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Game(GameMessage {
                success: true,
                game_id: self.game_id.clone(),
                difficulty: None,
                game_length: None,
                turn: Some(turn_msg),
                members: None,
            }));
        let _ = sink.send(msg);
    }

    fn broadcast_game_end(&mut self) {
        let last_turn = self.turns.last().cloned();
        let turn_msg = last_turn.map(|t| TurnMessage {
            turn_no: t.turn_no,
            active: false,
            level: self.difficulty,
            drawer: None,
            duration: t.duration_secs,
            phrase: String::new(),
            winner: None,
            score: self.scores.clone(),
        });
        let msg = Message::new(Topic::new(TopicType::Game, Operation::End), self.creator.clone())
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Game(GameMessage {
                success: true,
                game_id: self.game_id.clone(),
                difficulty: Some(self.difficulty),
                game_length: Some(self.game_length),
                turn: turn_msg,
                members: Some(self.top_scorers()),
            }));
        self.broadcast_all(msg);
    }

    fn top_scorers(&self) -> Vec<String> {
        let Some(&max) = self.scores.values().max() else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .scores
            .iter()
            .filter(|(_, &score)| score == max)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn broadcast_error(&self, err: GameError) {
        self.broadcast_error_raw(err.exception_name(), &err.to_string());
    }

    fn broadcast_error_raw(&self, exception: &str, value: &str) {
        let msg = Message::new(
            Topic::new(TopicType::Error, Operation::Broadcast),
            self.creator.clone(),
        )
        .with_game_id(self.game_id.clone())
        .with_value(Payload::Error(ErrorMessage {
            exception: exception.to_string(),
            value: value.to_string(),
            error_id: crate::error_id(),
        }));
        self.broadcast_all(msg);
    }

    fn broadcast_game_op(
        &self,
        op: Operation,
        subject: &str,
        members_override: Option<Vec<String>>,
    ) {
        let msg = Message::new(Topic::new(TopicType::Game, op), subject)
            .with_game_id(self.game_id.clone())
            .with_value(Payload::Game(GameMessage {
                success: true,
                game_id: self.game_id.clone(),
                difficulty: None,
                game_length: Some(self.game_length),
                turn: None,
                members: Some(members_override.unwrap_or_else(|| self.members.clone())),
            }));
        self.broadcast_all(msg);
    }

    fn replay_history_to(&self, user: &str) {
        if let Some(sink) = self.senders.get(user) {
            for msg in &self.history {
                let _ = sink.send(msg.clone());
            }
        }
    }

    fn broadcast_all(&self, msg: Message) {
        for member in &self.members {
            if let Some(sink) = self.senders.get(member) {
                let _ = sink.send(msg.clone());
            }
        }
    }
}

/// Replaces whole-word, case-insensitive occurrences of a phrase token in
/// `text` with `<CENSORED>` (spec §4.7 step 1).
fn censor(text: &str, phrase: &str) -> String {
    let banned: std::collections::HashSet<String> =
        phrase.split_whitespace().map(|t| t.to_lowercase()).collect();
    text.split_whitespace()
        .map(|word| {
            if banned.contains(&word.to_lowercase()) {
                "<CENSORED>"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every whitespace-split, lowercased token of `phrase` must appear as a
/// whitespace-split, lowercased token of `text` (spec §4.7 step 2).
fn is_winning_guess(text: &str, phrase: &str) -> bool {
    let guess_tokens: std::collections::HashSet<String> =
        text.split_whitespace().map(|t| t.to_lowercase()).collect();
    phrase
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .all(|t| guess_tokens.contains(&t))
}

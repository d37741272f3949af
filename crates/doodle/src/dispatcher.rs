//! Message routing (spec §4.5's Dispatcher) and error routing (§4.10's
//! ErrorRouter).
//!
//! The dispatcher itself is stateless: it just matches `topic.kind` /
//! `topic.operation` and calls the matching [`Registry`] or
//! [`GameHandle`] method. All the actual state — membership, turns,
//! scoring — lives behind those calls, one actor per game.

use doodle_game::GameError;
use doodle_protocol::{
    Difficulty, ErrorMessage, GameMessage, Message, Operation, Payload, Topic, TopicType,
};
use doodle_registry::{Registry, RegistryError};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::DoodleError;

/// Extracts `{username}` from a handshake path `/{prefix}/{username}`
/// (spec §6). `None` if the path doesn't have that shape or the username
/// segment is empty.
pub fn parse_username<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let mut segments = path.trim_start_matches('/').splitn(2, '/');
    if segments.next()? != prefix {
        return None;
    }
    match segments.next()? {
        "" => None,
        username => Some(username),
    }
}

/// Routes one inbound, already-validated [`Message`] to its handler (spec
/// §4.5 step 2).
pub async fn route_message(registry: &Mutex<Registry>, username: &str, msg: Message) -> Result<(), DoodleError> {
    match msg.topic.kind {
        TopicType::Game => route_game(registry, username, msg).await,
        TopicType::Draw => route_draw(registry, username, msg).await,
        TopicType::Chat => route_chat(registry, username, msg).await,
        // Neither is ever client-produced (ERROR is server-to-client only;
        // TRICK is sent only by the trick generator).
        TopicType::Error | TopicType::Trick => Err(GameError::NotAllowedOperation.into()),
    }
}

async fn route_game(registry: &Mutex<Registry>, username: &str, msg: Message) -> Result<(), DoodleError> {
    match msg.topic.operation {
        Operation::Create => {
            let game_id = msg.game_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let difficulty = match &msg.value {
                Some(Payload::Game(g)) => g.difficulty.unwrap_or_default(),
                _ => Difficulty::default(),
            };
            let handle = registry
                .lock()
                .await
                .create_game(username, game_id, difficulty)
                .await?;
            send_create_reply(registry, username, &handle).await;
            Ok(())
        }
        Operation::Join => {
            let game_id = require_game_id(&msg)?;
            registry.lock().await.join_game(username, &game_id).await?;
            Ok(())
        }
        Operation::Leave => {
            let game_id = require_game_id(&msg)?;
            registry.lock().await.leave_game(username, &game_id).await?;
            Ok(())
        }
        Operation::Start => {
            let game_id = require_game_id(&msg)?;
            let handle = registry.lock().await.get_game(&game_id)?;
            handle.start(username.to_string()).await?;
            Ok(())
        }
        Operation::End => {
            let game_id = require_game_id(&msg)?;
            registry.lock().await.end_game(username, &game_id).await?;
            Ok(())
        }
        // Produced only by the server (TURN, WIN) or declared but never
        // produced by any handler (MEMBERS, spec §9) — not a legal inbound
        // operation.
        Operation::Turn | Operation::Win | Operation::Members => {
            Err(GameError::NotAllowedOperation.into())
        }
        _ => unreachable!("Message::validate rejects operations not allowed for GAME"),
    }
}

async fn route_draw(registry: &Mutex<Registry>, username: &str, msg: Message) -> Result<(), DoodleError> {
    let game_id = msg.game_id.clone().ok_or(GameError::GameNotStarted)?;
    let payload = match msg.value {
        Some(Payload::Draw(picture)) => picture,
        _ => {
            return Err(doodle_protocol::ProtocolError::Validation(
                "DRAW requires a PictureMessage payload".into(),
            )
            .into())
        }
    };
    let handle = registry.lock().await.get_game(&game_id)?;
    handle.draw(username.to_string(), msg.topic.operation, payload).await?;
    Ok(())
}

async fn route_chat(registry: &Mutex<Registry>, username: &str, msg: Message) -> Result<(), DoodleError> {
    let game_id = msg.game_id.clone().ok_or(GameError::GameNotStarted)?;
    let text = match msg.value {
        Some(Payload::Chat(chat)) => chat.message,
        _ => {
            return Err(doodle_protocol::ProtocolError::Validation(
                "CHAT requires a ChatMessage payload".into(),
            )
            .into())
        }
    };
    let handle = registry.lock().await.get_game(&game_id)?;
    handle.chat(username.to_string(), text).await?;
    Ok(())
}

fn require_game_id(msg: &Message) -> Result<String, DoodleError> {
    msg.game_id
        .clone()
        .ok_or_else(|| doodle_protocol::ProtocolError::Validation("game_id is required".into()).into())
}

async fn send_create_reply(registry: &Mutex<Registry>, username: &str, handle: &doodle_game::GameHandle) {
    let reg = registry.lock().await;
    let Ok(user) = reg.get_user(username) else {
        return;
    };
    let msg = Message::new(Topic::new(TopicType::Game, Operation::Create), username)
        .with_game_id(handle.game_id().to_string())
        .with_value(Payload::Game(GameMessage {
            success: true,
            game_id: handle.game_id().to_string(),
            difficulty: Some(handle.difficulty()),
            game_length: Some(handle.game_length()),
            turn: None,
            members: None,
        }));
    let _ = user.sink().send(msg);
}

/// Builds an `ErrorMessage` envelope and routes it per spec §4.10: direct
/// to the originating user if `game_id` is null, otherwise broadcast to
/// the room — falling back to a direct `GameNotExist` if that room turns
/// out to be gone. Every envelope gets a fresh `error_id`.
pub async fn route_error(registry: &Mutex<Registry>, username: &str, game_id: Option<&str>, err: &DoodleError) {
    let exception = err.exception_name().to_string();
    let value = err.to_string();

    let Some(game_id) = game_id else {
        deliver_direct(registry, username, &exception, &value).await;
        return;
    };

    let handle = registry.lock().await.get_game(game_id).ok();
    match handle {
        Some(handle) => handle.broadcast_error(exception, value).await,
        None => {
            let not_exist = RegistryError::GameNotExist(game_id.to_string());
            deliver_direct(registry, username, not_exist.exception_name(), &not_exist.to_string()).await;
        }
    }
}

async fn deliver_direct(registry: &Mutex<Registry>, username: &str, exception: &str, value: &str) {
    let reg = registry.lock().await;
    let Ok(user) = reg.get_user(username) else {
        return;
    };
    let msg = Message::new(Topic::new(TopicType::Error, Operation::Broadcast), username).with_value(
        Payload::Error(ErrorMessage {
            exception: exception.to_string(),
            value: value.to_string(),
            error_id: Uuid::new_v4().to_string(),
        }),
    );
    let _ = user.sink().send(msg);
}

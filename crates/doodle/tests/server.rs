//! End-to-end tests against a real, bound `Server`, driving real
//! `tokio-tungstenite` WebSocket connections. Covers spec §8's six
//! scenarios.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use doodle_protocol::{
    ChatMessage, Difficulty, GameMessage, Message, Operation, Payload, PictureData,
    PictureMessage, Topic, TopicType,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static TEST_ID: AtomicU64 = AtomicU64::new(0);

/// Writes a one-phrase dictionary to a fresh temp directory so every
/// turn in a test has a known, predictable phrase.
fn phrase_dir(phrase: &str) -> PathBuf {
    let id = TEST_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("doodle-test-{}-{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["easy.txt", "medium.txt", "hard.txt"] {
        std::fs::write(dir.join(name), format!("{phrase}\n")).unwrap();
    }
    dir
}

async fn start_server(phrase: &str) -> SocketAddr {
    let mut config = doodle::Config::default();
    config.bind_address = "127.0.0.1:0".to_string();
    config.phrase_dictionaries_path = phrase_dir(phrase);

    let server = doodle::Server::bind(config).await.expect("server binds");
    let addr = server.local_addr().expect("bound address");
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr, username: &str) -> WsStream {
    let url = format!("ws://{addr}/ws/{username}");
    let (stream, _) = tokio_tungstenite::connect_async(url).await.expect("connects");
    stream
}

async fn send(ws: &mut WsStream, msg: &Message) {
    let text = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(text.into())).await.unwrap();
}

async fn recv(ws: &mut WsStream) -> Message {
    recv_within(ws, Duration::from_secs(5)).await.expect("message before timeout")
}

async fn recv_within(ws: &mut WsStream, timeout: Duration) -> Option<Message> {
    tokio::time::timeout(timeout, async {
        loop {
            match ws.next().await?.ok()? {
                WsMessage::Text(t) => return serde_json::from_str(&t).ok(),
                WsMessage::Binary(b) => return serde_json::from_slice(&b).ok(),
                _ => continue,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

fn create_msg(username: &str, game_id: &str) -> Message {
    Message::new(Topic::new(TopicType::Game, Operation::Create), username)
        .with_game_id(game_id)
        .with_value(Payload::Game(GameMessage {
            success: true,
            game_id: game_id.to_string(),
            difficulty: Some(Difficulty::Medium),
            game_length: None,
            turn: None,
            members: None,
        }))
}

fn join_msg(username: &str, game_id: &str) -> Message {
    Message::new(Topic::new(TopicType::Game, Operation::Join), username).with_game_id(game_id)
}

fn start_msg(username: &str, game_id: &str) -> Message {
    Message::new(Topic::new(TopicType::Game, Operation::Start), username).with_game_id(game_id)
}

fn end_msg(username: &str, game_id: &str) -> Message {
    Message::new(Topic::new(TopicType::Game, Operation::End), username).with_game_id(game_id)
}

fn line_msg(username: &str, game_id: &str, draw_id: &str) -> Message {
    Message::new(Topic::new(TopicType::Draw, Operation::Line), username)
        .with_game_id(game_id)
        .with_value(Payload::Draw(PictureMessage {
            draw_id: draw_id.to_string(),
            data: PictureData::Line(doodle_protocol::LineData {
                line: vec![0.0, 1.0, 1.0, 1.0],
                colour: vec![0.0, 0.0, 0.0, 1.0],
                width: 2,
            }),
        }))
}

fn chat_msg(username: &str, game_id: &str, text: &str) -> Message {
    Message::new(Topic::new(TopicType::Chat, Operation::Say), username)
        .with_game_id(game_id)
        .with_value(Payload::Chat(ChatMessage {
            sender: username.to_string(),
            message: text.to_string(),
        }))
}

fn payload_game(msg: &Message) -> &GameMessage {
    match msg.value.as_ref().expect("GAME payload") {
        Payload::Game(g) => g,
        other => panic!("expected GAME payload, got {other:?}"),
    }
}

#[tokio::test]
async fn create_join_and_history_replay() {
    let addr = start_server("red apple").await;
    let mut a = connect(addr, "A").await;

    send(&mut a, &create_msg("A", "g1")).await;
    let created = recv(&mut a).await;
    assert_eq!(created.topic.operation, Operation::Create);
    let game_length = payload_game(&created).game_length.unwrap();
    assert!((3..=15).contains(&game_length));

    send(&mut a, &line_msg("A", "g1", "d1")).await;
    let echoed = recv(&mut a).await;
    assert_eq!(echoed.topic.operation, Operation::Line);

    let mut b = connect(addr, "B").await;
    send(&mut b, &join_msg("B", "g1")).await;

    let a_join = recv(&mut a).await;
    assert_eq!(a_join.topic.operation, Operation::Join);
    assert_eq!(
        payload_game(&a_join).members.as_deref(),
        Some(&["A".to_string(), "B".to_string()][..])
    );

    let b_join = recv(&mut b).await;
    assert_eq!(b_join.topic.operation, Operation::Join);

    let history = recv(&mut b).await;
    assert_eq!(history.topic.operation, Operation::Line);
    match history.value.unwrap() {
        Payload::Draw(p) => assert_eq!(p.draw_id, "d1"),
        other => panic!("expected DRAW payload, got {other:?}"),
    }
}

#[tokio::test]
async fn not_enough_players() {
    let addr = start_server("red apple").await;
    let mut a = connect(addr, "A").await;

    send(&mut a, &create_msg("A", "g1")).await;
    recv(&mut a).await; // GAME/CREATE

    send(&mut a, &start_msg("A", "g1")).await;
    let err = recv(&mut a).await;
    assert_eq!(err.topic.kind, TopicType::Error);
    match err.value.unwrap() {
        Payload::Error(e) => assert_eq!(e.exception, "NotEnoughPlayers"),
        other => panic!("expected ERROR payload, got {other:?}"),
    }
}

/// Starts a 3-member game and returns each member's turn-1 `GAME/TURN`
/// message alongside their socket. The drawer is whoever's phrase isn't
/// masked — drawer selection is randomized, so tests discover it rather
/// than assuming a fixed name.
async fn start_three_player_game(addr: SocketAddr) -> Vec<(String, WsStream, Message)> {
    let mut a = connect(addr, "A").await;
    let mut b = connect(addr, "B").await;
    let mut c = connect(addr, "C").await;

    send(&mut a, &create_msg("A", "g1")).await;
    recv(&mut a).await;
    send(&mut b, &join_msg("B", "g1")).await;
    recv(&mut a).await;
    recv(&mut b).await;
    send(&mut c, &join_msg("C", "g1")).await;
    recv(&mut a).await;
    recv(&mut b).await;
    recv(&mut c).await;

    send(&mut a, &start_msg("A", "g1")).await;
    let a_turn = recv(&mut a).await;
    let b_turn = recv(&mut b).await;
    let c_turn = recv(&mut c).await;

    vec![
        ("A".to_string(), a, a_turn),
        ("B".to_string(), b, b_turn),
        ("C".to_string(), c, c_turn),
    ]
}

fn find_drawer(turns: &[(String, WsStream, Message)], real_phrase: &str) -> String {
    turns
        .iter()
        .find(|(_, _, msg)| payload_game(msg).turn.as_ref().unwrap().phrase == real_phrase)
        .map(|(name, _, _)| name.clone())
        .expect("exactly one member receives the real phrase")
}

#[tokio::test]
async fn full_turn_and_guess_win() {
    let addr = start_server("red apple").await;
    let mut turns = start_three_player_game(addr).await;

    for (_, _, msg) in &turns {
        let turn = payload_game(msg).turn.clone().unwrap();
        assert_eq!(turn.turn_no, 1);
        assert!(turn.phrase == "red apple" || turn.phrase == doodle_game::MASKED_PHRASE);
    }
    let drawer = find_drawer(&turns, "red apple");
    let guesser_idx = turns.iter().position(|(name, _, _)| *name != drawer).unwrap();

    {
        let (guesser, ws, _) = &mut turns[guesser_idx];
        send(ws, &chat_msg(guesser, "g1", "I think it is a Red Apple today")).await;
    }

    for (_, ws, _) in &mut turns {
        let chat_echo = recv(ws).await;
        assert_eq!(chat_echo.topic.kind, TopicType::Chat);
        let win = recv(ws).await;
        assert_eq!(win.topic.operation, Operation::Win);
        let win_turn = payload_game(&win).turn.clone().unwrap();
        assert_eq!(win_turn.score.get(&turns[guesser_idx].0).copied(), Some(100));
    }
}

#[tokio::test]
async fn drawer_censorship() {
    let addr = start_server("red apple").await;
    let mut turns = start_three_player_game(addr).await;
    let drawer = find_drawer(&turns, "red apple");
    let drawer_idx = turns.iter().position(|(name, _, _)| *name == drawer).unwrap();

    {
        let (name, ws, _) = &mut turns[drawer_idx];
        send(ws, &chat_msg(name, "g1", "just a red hint")).await;
    }

    let broadcast = recv(&mut turns[drawer_idx].1).await;
    match broadcast.value.unwrap() {
        Payload::Chat(c) => assert_eq!(c.message, "just a <CENSORED> hint"),
        other => panic!("expected CHAT payload, got {other:?}"),
    }
}

#[tokio::test]
async fn creator_end_removes_game() {
    let addr = start_server("red apple").await;
    let mut a = connect(addr, "A").await;
    let mut b = connect(addr, "B").await;

    send(&mut a, &create_msg("A", "g1")).await;
    recv(&mut a).await;
    send(&mut b, &join_msg("B", "g1")).await;
    recv(&mut a).await;
    recv(&mut b).await;

    send(&mut a, &end_msg("A", "g1")).await;

    let a_err = recv(&mut a).await;
    assert_eq!(a_err.topic.kind, TopicType::Error);
    let b_err = recv(&mut b).await;
    match b_err.value.unwrap() {
        Payload::Error(e) => assert_eq!(e.exception, "GameEnded"),
        other => panic!("expected ERROR payload, got {other:?}"),
    }

    // The game is gone: any further operation on g1 yields GameNotExist.
    send(&mut a, &start_msg("A", "g1")).await;
    let not_exist = recv(&mut a).await;
    match not_exist.value.unwrap() {
        Payload::Error(e) => assert_eq!(e.exception, "GameNotExist"),
        other => panic!("expected ERROR payload, got {other:?}"),
    }
}

#[tokio::test]
async fn trick_during_turn_targets_only_the_drawer() {
    let addr = start_server("red apple").await;
    let mut turns = start_three_player_game(addr).await;
    let drawer = find_drawer(&turns, "red apple");

    // Trick delay upper bound is floor(duration/3); duration is 30 or 60,
    // so at most 20s. Give it a generous margin.
    for (name, ws, _) in &mut turns {
        let got = recv_within(ws, Duration::from_secs(25)).await;
        if *name == drawer {
            let trick = got.expect("drawer receives a TRICK message");
            assert_eq!(trick.topic.kind, TopicType::Trick);
            assert_eq!(trick.username, doodle_game::TRICK_SENDER);
        } else if let Some(msg) = got {
            // Non-drawers may legitimately see nothing else before the
            // turn ends; anything they do see must not be a TRICK.
            assert_ne!(msg.topic.kind, TopicType::Trick);
        }
    }
}

//! Wire types: the message envelope, its topic, and the five payload
//! variants that can ride in `value`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// One of the five message families. Each carries a disjoint set of
/// [`Operation`]s and expects a matching [`Payload`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TopicType {
    Game,
    Draw,
    Chat,
    Error,
    Trick,
}

impl std::fmt::Display for TopicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TopicType::Game => "GAME",
            TopicType::Draw => "DRAW",
            TopicType::Chat => "CHAT",
            TopicType::Error => "ERROR",
            TopicType::Trick => "TRICK",
        };
        f.write_str(s)
    }
}

/// The flat union of every operation literal across every topic type.
/// Which ones are legal for a given [`TopicType`] is enforced in
/// [`Operation::is_valid_for`], not by the type system — this mirrors the
/// wire shape, where `operation` is just a string sibling of `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Join,
    Leave,
    End,
    Start,
    Turn,
    Win,
    Members,
    Line,
    Rect,
    Frame,
    Say,
    Broadcast,
    Nothing,
    Snail,
    Pacman,
    Earthquake,
    Landslide,
}

impl Operation {
    /// The operations a [`TopicType`] permits, per spec §4.4 rule 2.
    pub fn allowed_for(kind: TopicType) -> &'static [Operation] {
        use Operation::*;
        match kind {
            TopicType::Game => &[Create, Join, Leave, End, Start, Turn, Win, Members],
            TopicType::Draw => &[Line, Rect, Frame],
            TopicType::Chat => &[Say],
            TopicType::Error => &[Broadcast],
            TopicType::Trick => &[Nothing, Snail, Pacman, Earthquake, Landslide],
        }
    }

    pub fn is_valid_for(self, kind: TopicType) -> bool {
        Operation::allowed_for(kind).contains(&self)
    }
}

/// `{ "type": ..., "operation": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "type")]
    pub kind: TopicType,
    pub operation: Operation,
}

impl Topic {
    pub fn new(kind: TopicType, operation: Operation) -> Self {
        Self { kind, operation }
    }
}

/// Phrase / scoring difficulty. Serialized as the bare uppercase string
/// (`"EASY"`, `"MEDIUM"`, `"HARD"`) everywhere it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        };
        f.write_str(s)
    }
}

/// One freehand line stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub line: Vec<f64>,
    pub colour: Vec<f64>,
    pub width: u32,
}

/// One filled rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectData {
    pub pos: Vec<f64>,
    pub colour: Vec<f64>,
    pub size: Vec<f64>,
}

/// Distinguished structurally: `LineData` has `line`, `RectData` has `pos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PictureData {
    Line(LineData),
    Rect(RectData),
}

impl PictureData {
    /// Whether this payload shape matches a DRAW operation, per spec §4.4
    /// rule 4 (LINE/FRAME carry line data, RECT carries rect data).
    pub fn matches_operation(&self, op: Operation) -> bool {
        match (self, op) {
            (PictureData::Line(_), Operation::Line | Operation::Frame) => true,
            (PictureData::Rect(_), Operation::Rect) => true,
            _ => false,
        }
    }
}

/// `draw_id` is client-assigned per drawable; the server echoes it back
/// unchanged on broadcast and in history replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureMessage {
    pub draw_id: String,
    pub data: PictureData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    pub turn_no: u32,
    pub active: bool,
    pub level: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawer: Option<String>,
    pub duration: u32,
    pub phrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub score: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMessage {
    pub success: bool,
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub exception: String,
    pub value: String,
    pub error_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrickMessage {
    pub game_id: String,
    pub description: String,
}

/// The five payload shapes a [`Message`] can carry. Untagged: each variant
/// has a distinct field set, so serde picks the right one structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Game(GameMessage),
    Draw(PictureMessage),
    Chat(ChatMessage),
    Error(ErrorMessage),
    Trick(TrickMessage),
}

impl Payload {
    fn matches_topic(&self, kind: TopicType) -> bool {
        matches!(
            (self, kind),
            (Payload::Game(_), TopicType::Game)
                | (Payload::Draw(_), TopicType::Draw)
                | (Payload::Chat(_), TopicType::Chat)
                | (Payload::Error(_), TopicType::Error)
                | (Payload::Trick(_), TopicType::Trick)
        )
    }
}

/// The full inbound/outbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub topic: Topic,
    pub username: String,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub value: Option<Payload>,
}

impl Message {
    pub fn new(topic: Topic, username: impl Into<String>) -> Self {
        Self {
            topic,
            username: username.into(),
            game_id: None,
            value: None,
        }
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_value(mut self, value: Payload) -> Self {
        self.value = Some(value);
        self
    }

    /// Runs every MessageCodec validation rule from spec §4.4. `value`
    /// is permitted to be absent for LEAVE/END/START (rule 3).
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.topic.operation.is_valid_for(self.topic.kind) {
            return Err(ProtocolError::Validation(format!(
                "operation {:?} is not valid for topic {}",
                self.topic.operation, self.topic.kind
            )));
        }

        let tolerates_absent_value = self.topic.kind == TopicType::Game
            && matches!(
                self.topic.operation,
                Operation::Leave | Operation::End | Operation::Start
            );

        match &self.value {
            Some(payload) => {
                if !payload.matches_topic(self.topic.kind) {
                    return Err(ProtocolError::Validation(format!(
                        "payload variant does not match topic {}",
                        self.topic.kind
                    )));
                }
                if let Payload::Draw(picture) = payload {
                    if !picture.data.matches_operation(self.topic.operation) {
                        return Err(ProtocolError::Validation(
                            "picture data shape does not match draw operation".into(),
                        ));
                    }
                }
            }
            None if tolerates_absent_value => {}
            None => {
                return Err(ProtocolError::Validation(
                    "value is required for this topic/operation".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_allowed_for_game() {
        assert!(Operation::Create.is_valid_for(TopicType::Game));
        assert!(!Operation::Line.is_valid_for(TopicType::Game));
    }

    #[test]
    fn topic_type_serializes_uppercase() {
        let json = serde_json::to_string(&TopicType::Draw).unwrap();
        assert_eq!(json, "\"DRAW\"");
    }

    #[test]
    fn validate_rejects_mismatched_operation() {
        let msg = Message {
            topic: Topic::new(TopicType::Game, Operation::Line),
            username: "a".into(),
            game_id: None,
            value: None,
        };
        assert!(msg.validate().is_err());
    }

    #[test]
    fn validate_allows_absent_value_for_start() {
        let msg = Message {
            topic: Topic::new(TopicType::Game, Operation::Start),
            username: "a".into(),
            game_id: Some("g1".into()),
            value: None,
        };
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_picture_shape_mismatch() {
        let msg = Message {
            topic: Topic::new(TopicType::Draw, Operation::Rect),
            username: "a".into(),
            game_id: Some("g1".into()),
            value: Some(Payload::Draw(PictureMessage {
                draw_id: "d1".into(),
                data: PictureData::Line(LineData {
                    line: vec![0.0, 1.0],
                    colour: vec![0.0, 0.0, 0.0, 1.0],
                    width: 2,
                }),
            })),
        };
        assert!(msg.validate().is_err());
    }

    #[test]
    fn picture_message_round_trips() {
        let msg = PictureMessage {
            draw_id: "d1".into(),
            data: PictureData::Rect(RectData {
                pos: vec![1.0, 2.0],
                colour: vec![0.0, 0.0, 0.0],
                size: vec![3.0, 4.0],
            }),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: PictureMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }
}

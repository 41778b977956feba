//! Wire protocol and grid definitions shared by the snake battle server and its clients.
//!
//! Every frame on the wire is a single JSON object terminated by `\n`. Field names
//! and enum values follow the protocol spoken by the existing rendering client, so
//! they stay in Portuguese on the wire (`tipo`, `acao`, `cima`, ...) while the Rust
//! side uses English names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const GRID_WIDTH: i32 = 32;
pub const GRID_HEIGHT: i32 = 24;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;

/// Player ids are assigned in connection order: the first accepted socket is 1.
pub type PlayerId = u32;
pub const PLAYER_IDS: [PlayerId; 2] = [1, 2];

/// A grid cell as `(x, y)`. Serializes as a two element array `[x, y]`.
pub type Cell = (i32, i32);

/// Cardinal heading of a snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "cima")]
    Up,
    #[serde(rename = "baixo")]
    Down,
    #[serde(rename = "esquerda")]
    Left,
    #[serde(rename = "direita")]
    Right,
}

impl Direction {
    /// Unit step on the grid. `y` grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// True when turning from `self` to `next` would invert the direction of travel.
    pub fn is_reversal(self, next: Direction) -> bool {
        self.opposite() == next
    }

    /// Cell reached by moving one step from `cell`.
    pub fn step(self, cell: Cell) -> Cell {
        let (dx, dy) = self.delta();
        (cell.0 + dx, cell.1 + dy)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("direction command without a direction")]
    MissingDirection,
    #[error("action '{0}' does not take a direction")]
    UnexpectedDirection(String),
}

/// Per-player view carried by every state broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Body cells, head first.
    #[serde(rename = "corpo")]
    pub body: Vec<Cell>,
    #[serde(rename = "direcao")]
    pub heading: Direction,
    #[serde(rename = "vivo")]
    pub alive: bool,
    #[serde(rename = "pontos")]
    pub score: u32,
}

/// Frames sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum ServerMessage {
    #[serde(rename = "conexao")]
    Identity { id: PlayerId },
    #[serde(rename = "estado")]
    State {
        #[serde(rename = "jogadores")]
        players: BTreeMap<String, PlayerSnapshot>,
        #[serde(rename = "maca")]
        food: Cell,
        #[serde(rename = "em_andamento")]
        in_progress: bool,
    },
    #[serde(rename = "pong")]
    Pong { timestamp: f64 },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode_line(self)
    }

    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Frames sent from a client to the server.
///
/// Decoding is closed: anything other than the two documented shapes is rejected,
/// including non-object frames, extra fields and a `direcao` field on a ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "RawCommand")]
pub enum ClientMessage {
    Direction(Direction),
    Ping,
}

const ACTION_DIRECTION: &str = "direcao";
const ACTION_PING: &str = "ping";

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCommand {
    acao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    direcao: Option<Direction>,
}

impl TryFrom<RawCommand> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        match (raw.acao.as_str(), raw.direcao) {
            (ACTION_DIRECTION, Some(direction)) => Ok(ClientMessage::Direction(direction)),
            (ACTION_DIRECTION, None) => Err(ProtocolError::MissingDirection),
            (ACTION_PING, None) => Ok(ClientMessage::Ping),
            (ACTION_PING, Some(_)) => Err(ProtocolError::UnexpectedDirection(raw.acao)),
            _ => Err(ProtocolError::UnknownAction(raw.acao)),
        }
    }
}

// Frames must be JSON objects; the derived struct visitor alone also takes arrays.
impl TryFrom<Map<String, Value>> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let raw = RawCommand::deserialize(Value::Object(fields))?;
        ClientMessage::try_from(raw)
    }
}

impl From<ClientMessage> for RawCommand {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Direction(direction) => RawCommand {
                acao: ACTION_DIRECTION.to_string(),
                direcao: Some(direction),
            },
            ClientMessage::Ping => RawCommand {
                acao: ACTION_PING.to_string(),
                direcao: None,
            },
        }
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        encode_line(self)
    }

    /// Parses one line. Goes through the raw form directly so callers see which rule failed.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let fields: Map<String, Value> = serde_json::from_str(line.trim())?;
        ClientMessage::try_from(fields)
    }
}

/// Serializes a frame and appends the `\n` delimiter.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_direction_reversals() {
        assert!(Direction::Up.is_reversal(Direction::Down));
        assert!(Direction::Down.is_reversal(Direction::Up));
        assert!(Direction::Left.is_reversal(Direction::Right));
        assert!(Direction::Right.is_reversal(Direction::Left));

        assert!(!Direction::Right.is_reversal(Direction::Up));
        assert!(!Direction::Right.is_reversal(Direction::Right));
        assert!(!Direction::Up.is_reversal(Direction::Left));
    }

    #[test]
    fn test_direction_step() {
        assert_eq!(Direction::Right.step((5, 5)), (6, 5));
        assert_eq!(Direction::Left.step((5, 5)), (4, 5));
        assert_eq!(Direction::Up.step((5, 5)), (5, 4));
        assert_eq!(Direction::Down.step((5, 5)), (5, 6));
    }

    #[test]
    fn test_identity_wire_format() {
        let line = ServerMessage::Identity { id: 2 }.encode().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end(), r#"{"tipo":"conexao","id":2}"#);
    }

    #[test]
    fn test_state_wire_format() {
        let mut players = BTreeMap::new();
        players.insert(
            "1".to_string(),
            PlayerSnapshot {
                body: vec![(5, 5), (4, 5)],
                heading: Direction::Right,
                alive: true,
                score: 3,
            },
        );
        players.insert(
            "2".to_string(),
            PlayerSnapshot {
                body: vec![(26, 18), (27, 18)],
                heading: Direction::Left,
                alive: false,
                score: 0,
            },
        );
        let message = ServerMessage::State {
            players,
            food: (10, 7),
            in_progress: true,
        };

        let value: Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "tipo": "estado",
                "jogadores": {
                    "1": {"corpo": [[5, 5], [4, 5]], "direcao": "direita", "vivo": true, "pontos": 3},
                    "2": {"corpo": [[26, 18], [27, 18]], "direcao": "esquerda", "vivo": false, "pontos": 0}
                },
                "maca": [10, 7],
                "em_andamento": true
            })
        );

        let decoded = ServerMessage::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_pong_timestamp_is_float() {
        let line = ServerMessage::Pong {
            timestamp: 1712345678.25,
        }
        .encode()
        .unwrap();

        match ServerMessage::decode(&line).unwrap() {
            ServerMessage::Pong { timestamp } => assert_approx_eq!(timestamp, 1712345678.25, 1e-6),
            other => panic!("Wrong message after decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_direction_command() {
        let message = ClientMessage::decode(r#"{"acao":"direcao","direcao":"cima"}"#).unwrap();
        assert_eq!(message, ClientMessage::Direction(Direction::Up));

        let message = ClientMessage::decode(r#"{"direcao":"esquerda","acao":"direcao"}"#).unwrap();
        assert_eq!(message, ClientMessage::Direction(Direction::Left));
    }

    #[test]
    fn test_decode_ping() {
        assert_eq!(
            ClientMessage::decode(r#"{"acao":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
    }

    #[test]
    fn test_encode_client_messages() {
        assert_eq!(
            ClientMessage::Ping.encode().unwrap(),
            "{\"acao\":\"ping\"}\n"
        );
        assert_eq!(
            ClientMessage::Direction(Direction::Down).encode().unwrap(),
            "{\"acao\":\"direcao\",\"direcao\":\"baixo\"}\n"
        );
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let result = ClientMessage::decode(r#"{"acao":"pular"}"#);
        assert!(matches!(result, Err(ProtocolError::UnknownAction(a)) if a == "pular"));
    }

    #[test]
    fn test_decode_rejects_missing_direction() {
        let result = ClientMessage::decode(r#"{"acao":"direcao"}"#);
        assert!(matches!(result, Err(ProtocolError::MissingDirection)));
    }

    #[test]
    fn test_decode_rejects_direction_on_ping() {
        let result = ClientMessage::decode(r#"{"acao":"ping","direcao":"cima"}"#);
        assert!(matches!(result, Err(ProtocolError::UnexpectedDirection(_))));
    }

    #[test]
    fn test_deserialize_requires_an_object() {
        assert_eq!(
            serde_json::from_str::<ClientMessage>(r#"{"acao":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"["ping"]"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"["direcao","cima"]"#).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        let frames = [
            "",
            "not json",
            r#"{"acao":"direcao","direcao":"norte"}"#,
            r#"{"acao":"ping","extra":1}"#,
            r#"{"direcao":"cima"}"#,
            r#"["acao","ping"]"#,
            r#"["ping"]"#,
            r#"["direcao","cima"]"#,
            r#""ping""#,
            "null",
            r#"{"acao":"direcao","direcao":"cima""#,
        ];

        for frame in frames {
            let result = ClientMessage::decode(frame);
            assert!(
                matches!(result, Err(ProtocolError::Json(_))),
                "Should reject frame: {}",
                frame
            );
        }
    }
}

//! Wire message definitions for client-server communication
//! These are the JSON types the game server exchanges with this client

use serde::{Deserialize, Serialize};

use crate::hex::Axial;

/// Server-assigned tank identity, stable for the whole match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TankId(pub u32);

/// One board cell as delivered at game start
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HexConfig {
    pub p: Axial,
    /// Sprite variant picked by the server
    pub variant: u8,
}

/// Impassable landmark occupying one cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SiteConfig {
    pub p: Axial,
    pub variant: u8,
}

/// Initial tank placement
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TankConfig {
    pub id: TankId,
    pub p: Axial,
}

/// Full board setup sent once when the game starts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub hexes: Vec<HexConfig>,
    pub sites: Vec<SiteConfig>,
    pub player_tanks: Vec<TankConfig>,
    pub enemy_tanks: Vec<TankConfig>,
    /// Maximum path steps per tank per turn
    pub drive_range: u32,
    /// Fog-of-war radius around each friendly tank
    pub visibility_range: u32,
    /// Shrink origin for the collapsing board
    pub center: Axial,
}

/// One record of a resolved turn, replayed by the animation engine in
/// order. `EndTurn` is a local sentinel appended per received batch; the
/// server never sends it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnResult {
    /// Two-point move fragment: the accelerating first half of a path
    /// step (`start`) or the decelerating last half
    Move2 {
        id: TankId,
        p1: Axial,
        p2: Axial,
        start: bool,
    },

    /// Three-point move fragment passing through an intermediate cell
    Move3 {
        id: TankId,
        p1: Axial,
        p2: Axial,
        p3: Axial,
    },

    /// Tank fires in a unit direction
    Fire {
        id: TankId,
        /// Unit offset vector, converted to a direction index locally
        dir: Axial,
    },

    /// Shell impact at a cell; `id` names the destroyed tank when
    /// `destroyed` is set
    Explosion {
        p: Axial,
        id: Option<TankId>,
        destroyed: bool,
    },

    /// Enemy tank destroyed outside the viewer's line of sight
    Destroyed { id: TankId, p: Axial },

    /// Enemy tank entered or left the visible area
    Visible {
        id: TankId,
        p: Axial,
        visible: bool,
    },

    /// Board shrink: an announcement (`started` false) or the actual
    /// collapse of all cells at grid distance >= `r` from the center
    Shrink { r: u32, started: bool },

    /// Batch terminator appended locally after every push
    EndTurn,
}

/// One composed player order, sent on turn confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TankAction {
    /// Drive along `path` (full vertex list, origin included)
    Move { id: TankId, path: Vec<Axial> },
    /// Fire in a unit direction
    Fire { id: TankId, dir: Axial },
}

/// Final match outcome from the viewer's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to join a room by its share code
    JoinRoom { room_code: String },

    /// Confirm the composed orders for this turn
    SendTurn { actions: Vec<TankAction> },

    /// Leave the current room
    QuitRoom,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Both players present, board delivered, game begins
    StartGame { config: BoardConfig },

    /// Resolved results of the last turn, for animated replay
    TurnResults { results: Vec<TurnResult> },

    /// Room join confirmation, waiting for the opponent
    RoomJoined,

    /// Room closed or the opponent left
    RoomDisconnected,

    /// Match is over
    GameFinished { result: MatchOutcome },
}

/// Protocol decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientMsg {
    /// Encode for the wire
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMsg {
    /// Decode a message received from the server
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_result_tagging() {
        let raw = r#"{"type":"move2","id":3,"p1":{"x":0,"y":0},"p2":{"x":1,"y":0},"start":true}"#;
        let result: TurnResult = serde_json::from_str(raw).unwrap();
        assert_eq!(
            result,
            TurnResult::Move2 {
                id: TankId(3),
                p1: Axial::new(0, 0),
                p2: Axial::new(1, 0),
                start: true,
            }
        );
    }

    #[test]
    fn test_server_msg_round_trip() {
        let msg = ServerMsg::TurnResults {
            results: vec![
                TurnResult::Fire {
                    id: TankId(1),
                    dir: Axial::new(1, -1),
                },
                TurnResult::Shrink {
                    r: 4,
                    started: false,
                },
            ],
        };
        let raw = serde_json::to_string(&msg).unwrap();
        let back = ServerMsg::decode(&raw).unwrap();
        match back {
            ServerMsg::TurnResults { results } => {
                assert_eq!(results.len(), 2);
                assert_eq!(
                    results[0],
                    TurnResult::Fire {
                        id: TankId(1),
                        dir: Axial::new(1, -1),
                    }
                );
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_client_msg_encode() {
        let msg = ClientMsg::SendTurn {
            actions: vec![TankAction::Move {
                id: TankId(7),
                path: vec![Axial::new(0, 0), Axial::new(1, 0)],
            }],
        };
        let raw = msg.encode().unwrap();
        assert!(raw.contains(r#""type":"send_turn""#));
        assert!(raw.contains(r#""id":7"#));
    }

    #[test]
    fn test_malformed_message_rejected() {
        let err = ServerMsg::decode("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_outcome_tags() {
        assert_eq!(
            serde_json::to_string(&MatchOutcome::Win).unwrap(),
            r#""win""#
        );
        let loss: MatchOutcome = serde_json::from_str(r#""loss""#).unwrap();
        assert_eq!(loss, MatchOutcome::Loss);
    }
}

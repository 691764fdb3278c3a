use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Left edge of player 1's paddle.
pub const LEFT_PADDLE_X: f32 = 10.0;
/// Distance from the right wall to the left edge of player 2's paddle.
pub const RIGHT_PADDLE_INSET: f32 = 20.0;
/// Gap left between a paddle and the ball after a hit.
pub const PADDLE_SNAP_GAP: f32 = 2.0;
/// Horizontal speed-up applied on every paddle hit.
pub const RALLY_SPEEDUP: f32 = 1.05;

/// Game constants shared by the server and every client.
///
/// Velocities are expressed in arena units per tick, not per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub ball_size: f32,
    pub ball_speed_x: f32,
    pub ball_speed_y: f32,
    pub paddle_speed: f32,
    /// World state at start-up. The ball returns to `initial.ball_x/ball_y` after every point.
    pub initial: WorldState,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_width: 960.0,
            screen_height: 540.0,
            paddle_width: 10.0,
            paddle_height: 100.0,
            ball_size: 10.0,
            ball_speed_x: 4.0,
            ball_speed_y: 4.0,
            paddle_speed: 8.0,
            initial: WorldState {
                paddle1_y: 200.0,
                paddle2_y: 200.0,
                ball_x: 320.0,
                ball_y: 240.0,
            },
        }
    }
}

impl GameConfig {
    /// Lowest position a paddle's top edge may reach.
    pub fn max_paddle_y(&self) -> f32 {
        self.screen_height - self.paddle_height
    }

    /// Lowest position the ball's top edge may reach before bouncing.
    pub fn max_ball_y(&self) -> f32 {
        self.screen_height - self.ball_size
    }

    /// Horizontal band `(left, right)` occupied by player 1's paddle.
    pub fn left_paddle_band(&self) -> (f32, f32) {
        (LEFT_PADDLE_X, LEFT_PADDLE_X + self.paddle_width)
    }

    /// Horizontal band `(left, right)` occupied by player 2's paddle.
    pub fn right_paddle_band(&self) -> (f32, f32) {
        let left = self.screen_width - RIGHT_PADDLE_INSET;
        (left, left + self.paddle_width)
    }
}

/// Paddle movement requested by a client.
///
/// Travels on the wire as the strings `"UP"` and `"DOWN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Command {
    Up,
    Down,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Up => "UP",
            Command::Down => "DOWN",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command {0:?}")]
pub struct UnknownCommand(pub String);

impl TryFrom<String> for Command {
    type Error = UnknownCommand;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "UP" => Ok(Command::Up),
            "DOWN" => Ok(Command::Down),
            _ => Err(UnknownCommand(value)),
        }
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.as_str().to_string()
    }
}

/// Client to server frame.
///
/// `player` is only a claim: the server decides whether to believe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    pub command: Command,
    pub player: u8,
}

/// Server to client frame: the authoritative positions after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub paddle1_y: f32,
    pub paddle2_y: f32,
    pub ball_x: f32,
    pub ball_y: f32,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode frame: {0}")]
    Decode(#[source] bincode::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] bincode::Error),
}

pub fn encode_input(input: &ClientInput) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(input).map_err(CodecError::Encode)
}

pub fn decode_input(bytes: &[u8]) -> Result<ClientInput, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}

pub fn encode_state(state: &WorldState) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(state).map_err(CodecError::Encode)
}

pub fn decode_state(bytes: &[u8]) -> Result<WorldState, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}

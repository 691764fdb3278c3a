//! Integration tests for the pong server
//!
//! These tests start a real server on a loopback port and talk to it with
//! WebSocket clients, exactly as a game client would.

use futures_util::{SinkExt, StreamExt};
use server::network::{Server, ServerConfig};
use shared::{decode_state, encode_input, ClientInput, Command, GameConfig, WorldState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(3);

async fn start_server() -> SocketAddr {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    };
    let server = Server::new(config, GameConfig::default()).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

/// Connects and waits for the first broadcast, which proves the join was applied.
async fn join(addr: SocketAddr) -> Client {
    let mut client = connect(addr).await;
    next_state(&mut client).await;
    client
}

async fn next_state(client: &mut Client) -> WorldState {
    timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Binary(bytes))) => return decode_state(&bytes).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended while waiting for state: {:?}", other),
            }
        }
    })
    .await
    .expect("no state received in time")
}

async fn wait_for(client: &mut Client, pred: impl Fn(&WorldState) -> bool) -> WorldState {
    timeout(WAIT, async {
        loop {
            let state = next_state(client).await;
            if pred(&state) {
                return state;
            }
        }
    })
    .await
    .expect("condition not reached in time")
}

async fn send(client: &mut Client, command: Command, player: u8) {
    let frame = encode_input(&ClientInput { command, player }).unwrap();
    assert_ok!(client.send(Message::Binary(frame)).await);
}

/// Keeps sending until the world satisfies `pred`, checking `invariant` on every state seen.
async fn send_until(
    client: &mut Client,
    command: Command,
    player: u8,
    pred: impl Fn(&WorldState) -> bool,
    invariant: impl Fn(&WorldState) -> bool,
) -> WorldState {
    for _ in 0..50 {
        send(client, command, player).await;
        for _ in 0..4 {
            let state = next_state(client).await;
            assert!(invariant(&state), "invariant broken: {:?}", state);
            if pred(&state) {
                return state;
            }
        }
    }
    panic!("condition not reached after repeated commands");
}

/// SESSION AND TRUST TESTS
mod session_tests {
    use super::*;

    /// C1 joins as player 1, C2 as player 2, C1's UP moves paddle 1 once
    #[tokio::test]
    async fn up_from_first_player_moves_paddle_one() {
        let addr = start_server().await;
        let mut c1 = join(addr).await;
        let mut c2 = join(addr).await;

        send(&mut c1, Command::Up, 1).await;

        let state = wait_for(&mut c1, |s| s.paddle1_y != 200.0).await;
        assert_eq!(state.paddle1_y, 192.0);
        assert_eq!(state.paddle2_y, 200.0);

        let seen_by_c2 = wait_for(&mut c2, |s| s.paddle1_y != 200.0).await;
        assert_eq!(seen_by_c2.paddle1_y, 192.0);
    }

    /// With two players connected the claimed player number is ignored
    #[tokio::test]
    async fn forged_player_claim_moves_own_paddle() {
        let addr = start_server().await;
        let mut c1 = join(addr).await;
        let mut c2 = join(addr).await;

        send(&mut c1, Command::Down, 2).await;
        send(&mut c2, Command::Up, 1).await;

        let state = wait_for(&mut c1, |s| s.paddle1_y != 200.0 && s.paddle2_y != 200.0).await;
        assert_eq!(state.paddle1_y, 208.0);
        assert_eq!(state.paddle2_y, 192.0);
    }

    /// A lone client may drive both paddles
    #[tokio::test]
    async fn single_client_drives_both_paddles() {
        let addr = start_server().await;
        let mut c1 = join(addr).await;

        send(&mut c1, Command::Up, 1).await;
        send(&mut c1, Command::Down, 2).await;

        let state = wait_for(&mut c1, |s| s.paddle1_y != 200.0 && s.paddle2_y != 200.0).await;
        assert_eq!(state.paddle1_y, 192.0);
        assert_eq!(state.paddle2_y, 208.0);
    }

    /// A disconnect frees slot 1 for the next arrival
    #[tokio::test]
    async fn freed_slot_goes_to_next_connection() {
        let addr = start_server().await;
        let c1 = join(addr).await;
        let _c2 = join(addr).await;

        drop(c1);

        let mut c3 = connect(addr).await;
        // Both slots are held again once c3 owns slot 1, so the claim of 2 is ignored
        let state = send_until(
            &mut c3,
            Command::Up,
            2,
            |s| s.paddle1_y < 200.0,
            |s| s.paddle2_y == 200.0,
        )
        .await;
        assert_eq!(state.paddle2_y, 200.0);
    }

    /// A third connection watches until a slot frees, then takes it over
    #[tokio::test]
    async fn third_connection_waits_then_takes_freed_slot() {
        let addr = start_server().await;
        let _c1 = join(addr).await;
        let mut c2 = join(addr).await;
        let mut c3 = join(addr).await;

        send(&mut c3, Command::Down, 1).await;
        send(&mut c3, Command::Down, 2).await;
        for _ in 0..10 {
            let state = next_state(&mut c3).await;
            assert_eq!(state.paddle1_y, 200.0);
            assert_eq!(state.paddle2_y, 200.0);
        }

        assert_ok!(c2.close(None).await);

        let state = send_until(
            &mut c3,
            Command::Down,
            1,
            |s| s.paddle2_y > 200.0,
            |s| s.paddle1_y == 200.0,
        )
        .await;
        assert_eq!(state.paddle1_y, 200.0);
    }
}

/// PROTOCOL ROBUSTNESS TESTS
mod protocol_tests {
    use super::*;

    /// Garbage and text frames are dropped without closing the connection
    #[tokio::test]
    async fn malformed_frames_do_not_drop_connection() {
        let addr = start_server().await;
        let mut c1 = join(addr).await;

        assert_ok!(c1.send(Message::Binary(vec![0xff, 0x01, 0x02])).await);
        assert_ok!(c1.send(Message::Text("UP".to_string())).await);

        #[derive(serde::Serialize)]
        struct RawInput {
            command: String,
            player: u8,
        }
        let unknown = bincode::serialize(&RawInput {
            command: "LEFT".to_string(),
            player: 1,
        })
        .unwrap();
        assert_ok!(c1.send(Message::Binary(unknown)).await);

        send(&mut c1, Command::Up, 1).await;
        let state = wait_for(&mut c1, |s| s.paddle1_y != 200.0).await;
        assert_eq!(state.paddle1_y, 192.0);
    }

    /// Only the configured path is upgraded
    #[tokio::test]
    async fn wrong_path_is_rejected() {
        let addr = start_server().await;
        assert!(connect_async(format!("ws://{}/other", addr)).await.is_err());
        assert_ok!(connect_async(format!("ws://{}/ws", addr)).await);
    }

    /// Broadcasts arrive at the tick rate and keep the ball moving
    #[tokio::test]
    async fn state_stream_advances_ball() {
        let addr = start_server().await;
        let mut c1 = join(addr).await;

        let first = next_state(&mut c1).await;
        let mut last = first;
        for _ in 0..20 {
            last = next_state(&mut c1).await;
        }

        assert!(last.ball_x != first.ball_x || last.ball_y != first.ball_y);
        let config = GameConfig::default();
        assert!(last.ball_y >= 0.0 && last.ball_y <= config.max_ball_y());
    }
}

/// PHYSICS SCENARIO TESTS
mod physics_tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use server::physics::{step, BallVelocity, Side};

    /// Ball at (18, 205) against a paddle at 200 bounces and snaps to 22
    #[test]
    fn left_paddle_collision_snaps_ball() {
        let config = GameConfig::default();
        let world = WorldState {
            paddle1_y: 200.0,
            paddle2_y: 200.0,
            ball_x: 22.0,
            ball_y: 205.0,
        };

        let outcome = step(world, BallVelocity::new(-4.0, 0.0), &config);

        assert_eq!(outcome.paddle_hit, Some(Side::Left));
        assert!(outcome.velocity.vx > 0.0);
        assert_approx_eq!(outcome.velocity.vx, 4.0 * 1.05);
        assert_eq!(outcome.world.ball_x, 22.0);
        assert_eq!(outcome.world.ball_y, 205.0);
    }

    /// Leaving through the right edge re-serves from the center toward the left
    #[test]
    fn exit_right_resets_to_center() {
        let config = GameConfig::default();
        let world = WorldState {
            paddle1_y: 200.0,
            paddle2_y: 0.0,
            ball_x: 955.0,
            ball_y: 300.0,
        };

        let outcome = step(world, BallVelocity::new(8.0, -3.0), &config);

        assert_eq!(outcome.exited, Some(Side::Right));
        assert_eq!(outcome.world.ball_x, config.initial.ball_x);
        assert_eq!(outcome.world.ball_y, config.initial.ball_y);
        assert!(outcome.velocity.vx < 0.0);
        assert_eq!(outcome.velocity.vx.abs(), config.ball_speed_x);
        assert_eq!(outcome.velocity.vy, config.ball_speed_y);
    }
}

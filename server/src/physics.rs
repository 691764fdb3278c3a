//! Ball motion, collisions and scoring
//!
//! [`step`] is a pure function: the same world, velocity and configuration
//! always produce the same outcome, so trajectories can be replayed exactly.
//! Within one step the checks run in a fixed order against the same
//! post-integration position:
//! 1. integrate
//! 2. floor/ceiling bounce
//! 3. left paddle, or else right paddle
//! 4. scoring reset

use shared::{GameConfig, WorldState, PADDLE_SNAP_GAP, RALLY_SPEEDUP};

/// Ball velocity in arena units per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallVelocity {
    pub vx: f32,
    pub vy: f32,
}

impl BallVelocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    /// Serve velocity from the configured base speeds.
    pub fn initial(config: &GameConfig) -> Self {
        Self {
            vx: config.ball_speed_x,
            vy: config.ball_speed_y,
        }
    }
}

/// Side of the arena the ball left through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Everything that happened during one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub world: WorldState,
    pub velocity: BallVelocity,
    pub wall_bounce: bool,
    pub paddle_hit: Option<Side>,
    /// Set when the ball left the arena and was re-served.
    pub exited: Option<Side>,
}

/// Advances the ball by one tick.
pub fn step(world: WorldState, velocity: BallVelocity, config: &GameConfig) -> StepOutcome {
    let mut world = world;
    let mut velocity = velocity;

    world.ball_x += velocity.vx;
    world.ball_y += velocity.vy;

    let wall_bounce = bounce_off_walls(&mut world, &mut velocity, config);
    let paddle_hit = bounce_off_paddles(&mut world, &mut velocity, config);

    let exited = if world.ball_x < 0.0 {
        Some(Side::Left)
    } else if world.ball_x > config.screen_width {
        Some(Side::Right)
    } else {
        None
    };

    if let Some(side) = exited {
        world.ball_x = config.initial.ball_x;
        world.ball_y = config.initial.ball_y;
        velocity = serve_after(side, config);
    }

    StepOutcome {
        world,
        velocity,
        wall_bounce,
        paddle_hit,
        exited,
    }
}

/// Velocity for the serve after the ball left through `side`
///
/// The ball always heads away from the side it left through.
pub fn serve_after(side: Side, config: &GameConfig) -> BallVelocity {
    let speed_x = config.ball_speed_x.abs();
    BallVelocity {
        vx: match side {
            Side::Left => speed_x,
            Side::Right => -speed_x,
        },
        vy: config.ball_speed_y,
    }
}

/// Reflects off the ceiling or floor. Only a ball moving into a wall is
/// turned around, and it is put back inside the arena.
fn bounce_off_walls(world: &mut WorldState, velocity: &mut BallVelocity, config: &GameConfig) -> bool {
    let max_y = config.max_ball_y();

    if world.ball_y <= 0.0 && velocity.vy < 0.0 {
        velocity.vy = -velocity.vy;
        world.ball_y = 0.0;
        true
    } else if world.ball_y >= max_y && velocity.vy > 0.0 {
        velocity.vy = -velocity.vy;
        world.ball_y = max_y;
        true
    } else {
        false
    }
}

fn bounce_off_paddles(
    world: &mut WorldState,
    velocity: &mut BallVelocity,
    config: &GameConfig,
) -> Option<Side> {
    let (left_start, left_end) = config.left_paddle_band();
    let (right_start, right_end) = config.right_paddle_band();

    if velocity.vx < 0.0
        && overlaps_band(world.ball_x, config.ball_size, left_start, left_end)
        && overlaps_paddle(world.ball_y, world.paddle1_y, config)
    {
        velocity.vx = -velocity.vx * RALLY_SPEEDUP;
        world.ball_x = left_end + PADDLE_SNAP_GAP;
        Some(Side::Left)
    } else if velocity.vx > 0.0
        && overlaps_band(world.ball_x, config.ball_size, right_start, right_end)
        && overlaps_paddle(world.ball_y, world.paddle2_y, config)
    {
        velocity.vx = -velocity.vx * RALLY_SPEEDUP;
        world.ball_x = right_start - config.ball_size - PADDLE_SNAP_GAP;
        Some(Side::Right)
    } else {
        None
    }
}

fn overlaps_band(ball_x: f32, ball_size: f32, start: f32, end: f32) -> bool {
    ball_x <= end && ball_x + ball_size >= start
}

fn overlaps_paddle(ball_y: f32, paddle_y: f32, config: &GameConfig) -> bool {
    ball_y + config.ball_size >= paddle_y && ball_y <= paddle_y + config.paddle_height
}

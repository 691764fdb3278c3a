use crate::physics::{self, BallVelocity, Side, StepOutcome};
use crate::session::Slot;
use log::{debug, info};
use shared::{Command, GameConfig, WorldState};

/// Authoritative simulation state
///
/// Owned by the simulation authority alone. Other tasks only ever see the
/// encoded copy of `world` that is broadcast after each tick.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    pub world: WorldState,
    pub velocity: BallVelocity,
    config: GameConfig,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            tick: 0,
            world: config.initial,
            velocity: BallVelocity::initial(&config),
            config,
        }
    }

    /// Moves a paddle by one step, clamped to the arena.
    pub fn apply_command(&mut self, slot: Slot, command: Command) {
        let max_y = self.config.max_paddle_y();
        let speed = self.config.paddle_speed;

        let paddle = match slot {
            Slot::One => &mut self.world.paddle1_y,
            Slot::Two => &mut self.world.paddle2_y,
        };

        *paddle = match command {
            Command::Up => (*paddle - speed).max(0.0),
            Command::Down => (*paddle + speed).min(max_y),
        };

        debug!("{} {} -> y = {}", slot, command, *paddle);
    }

    /// Advances the ball by one tick.
    pub fn update_physics(&mut self) -> StepOutcome {
        let outcome = physics::step(self.world, self.velocity, &self.config);
        self.world = outcome.world;
        self.velocity = outcome.velocity;
        self.tick += 1;

        if outcome.wall_bounce {
            debug!("Wall bounce at tick {}, vy = {}", self.tick, self.velocity.vy);
        }
        if let Some(side) = outcome.paddle_hit {
            debug!(
                "{:?} paddle hit at tick {}, vx = {}",
                side, self.tick, self.velocity.vx
            );
        }
        if let Some(side) = outcome.exited {
            let scorer = match side {
                Side::Left => Slot::Two,
                Side::Right => Slot::One,
            };
            info!("Point for {} at tick {}", scorer, self.tick);
        }

        outcome
    }
}

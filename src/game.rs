//! Headless pipe course
//!
//! A minimal side-scroller in the spirit of Flappy Bird: the bird falls under
//! gravity, a flap sets an upward velocity, and pairs of pipes with a fixed gap
//! scroll in from the right. Touching a pipe, the ground, or leaving the top of
//! the screen ends the episode.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    exploration::build_rng,
    ports::Environment,
    types::{Action, GameState, RewardValues},
};

/// Physical constants of the course, in pixels and frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    pub width: f64,
    pub height: f64,
    /// Fraction of the height where the ground starts
    pub ground_ratio: f64,
    pub player_x: f64,
    pub player_width: f64,
    pub player_height: f64,
    pub gravity: f64,
    pub flap_power: f64,
    pub max_drop_speed: f64,
    pub pipe_width: f64,
    pub pipe_gap: f64,
    pub pipe_speed: f64,
    /// Horizontal distance between consecutive pipes
    pub pipe_spacing: f64,
    /// Minimum clearance between the gap and the top of the screen or the ground
    pub gap_margin: f64,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            width: 288.0,
            height: 512.0,
            ground_ratio: 0.79,
            player_x: 57.6,
            player_width: 34.0,
            player_height: 24.0,
            gravity: 1.0,
            flap_power: 9.0,
            max_drop_speed: 10.0,
            pipe_width: 52.0,
            pipe_gap: 100.0,
            pipe_speed: 4.0,
            pipe_spacing: 180.0,
            gap_margin: 40.0,
        }
    }
}

impl CourseConfig {
    pub fn ground_y(&self) -> f64 {
        self.height * self.ground_ratio
    }

    /// Check that the course leaves room for a gap and a bird.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("pipe_gap", self.pipe_gap),
            ("pipe_speed", self.pipe_speed),
            ("pipe_spacing", self.pipe_spacing),
            ("pipe_width", self.pipe_width),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| !(*v > 0.0)) {
            return Err(Error::InvalidConfiguration {
                message: format!("course {name} must be positive"),
            });
        }
        if self.gap_top_max() < self.gap_top_min() {
            return Err(Error::InvalidConfiguration {
                message: "pipe gap and margins do not fit between the top and the ground"
                    .to_string(),
            });
        }
        if self.player_height >= self.pipe_gap {
            return Err(Error::InvalidConfiguration {
                message: "player is taller than the pipe gap".to_string(),
            });
        }
        Ok(())
    }

    fn gap_top_min(&self) -> f64 {
        self.gap_margin
    }

    fn gap_top_max(&self) -> f64 {
        self.ground_y() - self.pipe_gap - self.gap_margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pipe {
    x: f64,
    gap_top: f64,
    passed: bool,
}

/// Headless course implementing [`Environment`].
#[derive(Debug, Clone)]
pub struct FlappyCourse {
    config: CourseConfig,
    rewards: RewardValues,
    rng: StdRng,
    player_y: f64,
    player_vel: f64,
    pipes: Vec<Pipe>,
    score: u32,
    frame: u64,
    game_over: bool,
}

impl FlappyCourse {
    /// Build a course with the given rewards and an optional seed for pipe placement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the config fails validation.
    pub fn new(config: CourseConfig, rewards: RewardValues, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let mut course = Self {
            config,
            rewards,
            rng: build_rng(seed),
            player_y: 0.0,
            player_vel: 0.0,
            pipes: Vec::new(),
            score: 0,
            frame: 0,
            game_over: false,
        };
        course.start_episode();
        Ok(course)
    }

    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    pub fn rewards(&self) -> RewardValues {
        self.rewards
    }

    fn random_gap_top(&mut self) -> f64 {
        let (low, high) = (self.config.gap_top_min(), self.config.gap_top_max());
        if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }

    fn start_episode(&mut self) {
        self.player_y = self.config.height / 2.0 - self.config.player_height / 2.0;
        self.player_vel = 0.0;
        self.score = 0;
        self.frame = 0;
        self.game_over = false;

        let count = (self.config.width / self.config.pipe_spacing).ceil() as usize + 2;
        self.pipes.clear();
        for i in 0..count {
            let gap_top = self.random_gap_top();
            self.pipes.push(Pipe {
                x: self.config.width + i as f64 * self.config.pipe_spacing,
                gap_top,
                passed: false,
            });
        }
    }

    /// Pipes ahead of the bird's left edge, nearest first.
    fn upcoming(&self) -> impl Iterator<Item = &Pipe> {
        let player_x = self.config.player_x;
        let pipe_width = self.config.pipe_width;
        self.pipes
            .iter()
            .filter(move |p| p.x + pipe_width > player_x)
    }

    fn collides(&self) -> bool {
        let c = &self.config;
        let top = self.player_y;
        let bottom = self.player_y + c.player_height;
        if top < 0.0 || bottom >= c.ground_y() {
            return true;
        }
        let left = c.player_x;
        let right = c.player_x + c.player_width;
        self.pipes.iter().any(|p| {
            let overlaps_x = right > p.x && left < p.x + c.pipe_width;
            overlaps_x && (top < p.gap_top || bottom > p.gap_top + c.pipe_gap)
        })
    }

    fn advance_pipes(&mut self) -> u32 {
        let c = self.config;
        let mut passed = 0;
        for pipe in &mut self.pipes {
            pipe.x -= c.pipe_speed;
            if !pipe.passed && pipe.x + c.pipe_width < c.player_x {
                pipe.passed = true;
                passed += 1;
            }
        }

        let rightmost = self
            .pipes
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut next_x = rightmost;
        for i in 0..self.pipes.len() {
            if self.pipes[i].x + c.pipe_width < 0.0 {
                next_x += c.pipe_spacing;
                let gap_top = self.random_gap_top();
                self.pipes[i] = Pipe {
                    x: next_x,
                    gap_top,
                    passed: false,
                };
            }
        }
        passed
    }
}

impl Environment for FlappyCourse {
    fn reset(&mut self) -> Result<()> {
        self.start_episode();
        Ok(())
    }

    fn state(&self) -> GameState {
        let c = &self.config;
        let mut upcoming: Vec<&Pipe> = self.upcoming().collect();
        upcoming.sort_by(|a, b| a.x.total_cmp(&b.x));

        let describe = |pipe: Option<&&Pipe>| match pipe {
            Some(p) => (p.x + c.pipe_width - c.player_x, p.gap_top, p.gap_top + c.pipe_gap),
            None => (c.width, 0.0, c.pipe_gap),
        };
        let (dist, top, bottom) = describe(upcoming.first());
        let (next_dist, next_top, next_bottom) = describe(upcoming.get(1));

        GameState {
            player_y: self.player_y,
            player_vel: self.player_vel,
            next_pipe_dist_to_player: dist,
            next_pipe_top_y: top,
            next_pipe_bottom_y: bottom,
            next_next_pipe_dist_to_player: next_dist,
            next_next_pipe_top_y: next_top,
            next_next_pipe_bottom_y: next_bottom,
        }
    }

    fn act(&mut self, action: Action) -> f64 {
        if self.game_over {
            return 0.0;
        }

        self.frame += 1;
        if action == Action::Flap {
            self.player_vel = -self.config.flap_power;
        }
        self.player_y += self.player_vel;
        self.player_vel = (self.player_vel + self.config.gravity).min(self.config.max_drop_speed);

        let passed = self.advance_pipes();
        self.score += passed;

        let mut reward = self.rewards.tick + passed as f64 * self.rewards.positive;
        if self.collides() {
            self.game_over = true;
            reward += self.rewards.loss;
        }
        reward
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(seed: u64) -> FlappyCourse {
        FlappyCourse::new(CourseConfig::default(), RewardValues::default(), Some(seed)).unwrap()
    }

    #[test]
    fn test_falling_bird_hits_ground_with_loss() {
        let mut env = course(1);
        let mut total = 0.0;
        let mut frames = 0;
        while !env.is_game_over() && frames < 1000 {
            total += env.act(Action::Noop);
            frames += 1;
        }
        assert!(env.is_game_over());
        assert_eq!(total, -5.0);
        assert_eq!(env.score(), 0);
        assert_eq!(env.act(Action::Noop), 0.0);
    }

    #[test]
    fn test_flapping_constantly_leaves_the_top() {
        let mut env = course(2);
        let mut frames = 0;
        while !env.is_game_over() && frames < 1000 {
            env.act(Action::Flap);
            frames += 1;
        }
        assert!(env.is_game_over());
        assert!(env.state().player_y < 0.0);
    }

    #[test]
    fn test_next_pipe_is_ahead_and_gap_fits() {
        let env = course(3);
        let state = env.state();
        let config = CourseConfig::default();
        assert!(state.next_pipe_dist_to_player > 0.0);
        assert!(state.next_next_pipe_dist_to_player > state.next_pipe_dist_to_player);
        assert_eq!(state.next_pipe_bottom_y - state.next_pipe_top_y, config.pipe_gap);
        assert!(state.next_pipe_top_y >= config.gap_margin);
    }

    #[test]
    fn test_reset_restores_start_position() {
        let mut env = course(4);
        let start = env.state().player_y;
        for _ in 0..5 {
            env.act(Action::Noop);
        }
        assert_eq!(env.frame(), 5);
        env.reset().unwrap();
        assert_eq!(env.state().player_y, start);
        assert_eq!(env.frame(), 0);
        assert!(!env.is_game_over());
    }

    #[test]
    fn test_same_seed_same_course() {
        let a = course(7).state();
        let b = course(7).state();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CourseConfig {
            pipe_gap: 500.0,
            ..CourseConfig::default()
        };
        assert!(FlappyCourse::new(config, RewardValues::default(), None).is_err());
    }
}

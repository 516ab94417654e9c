//! Anchor controller: a tank driven by a scripted input route

use std::fmt;
use std::str::FromStr;

use rally_core::Pose;

use crate::settings::TankConfig;

/// One tick of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankInput {
    Forward,
    Back,
    Left,
    Right,
    Idle,
}

impl TankInput {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Self::Forward),
            'B' => Some(Self::Back),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            '.' => Some(Self::Idle),
            _ => None,
        }
    }
}

/// Input sequence replayed in a loop
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    steps: Vec<TankInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route is empty")]
    Empty,
    #[error("unknown route step '{0}', expected one of F B L R .")]
    UnknownStep(char),
}

impl FromStr for Route {
    type Err = RouteError;

    /// Parse a string such as `FFFFLLFF..`. Whitespace is ignored; a step
    /// may be prefixed by a repeat count, as in `20F5L`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        let mut repeat: Option<usize> = None;
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if let Some(digit) = c.to_digit(10) {
                repeat = Some(repeat.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
                continue;
            }
            let input = TankInput::from_char(c).ok_or(RouteError::UnknownStep(c))?;
            let count = repeat.take().unwrap_or(1);
            steps.extend(std::iter::repeat(input).take(count));
        }
        if steps.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self { steps })
    }
}

impl Route {
    /// Step to apply on tick `tick`
    pub fn step(&self, tick: usize) -> TankInput {
        self.steps[tick % self.steps.len()]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            let c = match step {
                TankInput::Forward => 'F',
                TankInput::Back => 'B',
                TankInput::Left => 'L',
                TankInput::Right => 'R',
                TankInput::Idle => '.',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Moves the anchor along its heading
#[derive(Debug, Clone)]
pub struct Tank {
    config: TankConfig,
    pose: Pose,
    odometer: f32,
}

impl Tank {
    pub fn new(config: TankConfig, pose: Pose) -> Self {
        Self {
            config,
            pose,
            odometer: 0.0,
        }
    }

    /// Apply one input and return the new pose
    pub fn update(&mut self, input: TankInput) -> Pose {
        let Pose { position, heading } = self.pose;
        self.pose = match input {
            TankInput::Forward => Pose::new(position + self.pose.forward() * self.config.velocity, heading),
            TankInput::Back => Pose::new(position - self.pose.forward() * self.config.velocity, heading),
            TankInput::Left => Pose::new(position, heading - self.config.angular_velocity),
            TankInput::Right => Pose::new(position, heading + self.config.angular_velocity),
            TankInput::Idle => self.pose,
        };
        if matches!(input, TankInput::Forward | TankInput::Back) {
            self.odometer += self.config.velocity;
        }
        self.pose
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Total distance driven
    pub fn odometer(&self) -> f32 {
        self.odometer
    }
}

//! Command-line and environment configuration for the perf lab.

use clap::Parser;

use crate::actions::Action;
use crate::lab::LabError;
use crate::scenarios::Scenario;

#[derive(Parser, Debug)]
#[command(name = "tripboard", about = "Headless render perf lab for trip boards")]
pub struct Cli {
    #[arg(long, env = "TRIPBOARD_SCENARIO", value_enum, default_value = "grid-1k")]
    pub scenario: Scenario,

    #[arg(long, env = "TRIPBOARD_ACTION", value_enum, default_value = "idle")]
    pub action: Action,

    #[arg(long, env = "TRIPBOARD_FRAMES", default_value_t = 300)]
    pub frames: u64,

    #[arg(long, env = "TRIPBOARD_WIDTH", default_value_t = 1280.0)]
    pub width: f64,

    #[arg(long, env = "TRIPBOARD_HEIGHT", default_value_t = 800.0)]
    pub height: f64,

    #[arg(long, env = "TRIPBOARD_PIXEL_RATIO", default_value_t = 1.0)]
    pub pixel_ratio: f64,

    /// Seed for scenario jitter.
    #[arg(long, env = "TRIPBOARD_SEED", default_value_t = 7)]
    pub seed: u64,

    /// Print the report as JSON on stdout instead of logging a summary.
    #[arg(long, env = "TRIPBOARD_JSON")]
    pub json: bool,
}

/// One lab run.
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    pub scenario: Scenario,
    pub action: Action,
    pub frames: u64,
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub seed: u64,
    /// Log a progress line every this many frames. Zero disables it.
    pub progress_every: u64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Grid1k,
            action: Action::Idle,
            frames: 300,
            width: 1280.0,
            height: 800.0,
            pixel_ratio: 1.0,
            seed: 7,
            progress_every: 60,
        }
    }
}

impl LabConfig {
    /// # Errors
    ///
    /// Rejects a run with zero frames. Canvas size is checked by the renderer.
    pub fn validate(&self) -> Result<(), LabError> {
        if self.frames == 0 {
            return Err(LabError::InvalidConfig("frames must be at least 1".into()));
        }
        Ok(())
    }
}

impl From<&Cli> for LabConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            scenario: cli.scenario,
            action: cli.action,
            frames: cli.frames,
            width: cli.width,
            height: cli.height,
            pixel_ratio: cli.pixel_ratio,
            seed: cli.seed,
            ..Self::default()
        }
    }
}

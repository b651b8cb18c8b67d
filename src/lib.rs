// Library surface for the game core, shared by the TUI binary and the
// headless/integration tests. Nothing here draws to the terminal.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod rules;
pub mod runtime;
pub mod schedule;
pub mod scoring;
pub mod session;
pub mod stimulus;
pub mod util;
pub mod variant;

pub use engine::{Command, Phase, RoundEngine, Snapshot};
pub use variant::GameVariant;

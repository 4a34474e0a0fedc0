// AI opponent: profiles, prediction and the per-game decision engine

mod engine;
mod prediction;
mod profile;

pub use engine::{AiState, DecisionEngine, FrameInput};
pub use prediction::predict_ball_y;
pub use profile::{AiProfile, CustomSettings, Difficulty};

// Decision engine: one stateful AI opponent per game

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::prediction::predict_ball_y;
use super::profile::AiProfile;

/// Distance from the right screen edge to the AI paddle's x-plane.
const PADDLE_PLANE_MARGIN: f32 = 20.0;

/// Ball x below which the AI just recenters regardless of direction.
const IDLE_ZONE_X: f32 = 200.0;

/// How far off the sabotage aim point is from the true intercept.
const SABOTAGE_OFFSET: f32 = 150.0;

/// One frame worth of observations from the game client.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_speed_x: f32,
    pub ball_speed_y: f32,
    pub paddle_y: f32,
    pub paddle_height: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    pub scored_for_me: bool,
    pub scored_against_me: bool,
}

/// Mutable per-game AI state. Counters persist for the life of the session;
/// the tactical flags reset at every rally boundary.
#[derive(Debug, Clone, Default)]
pub struct AiState {
    pub games_played: u32,
    pub wins: u32,
    pub hits: u32,
    pub misses: u32,
    pub consecutive_wins: u32,

    // Tactical, cleared each rally
    pub is_frozen: bool,
    pub target_locked: bool,
    pub locked_target: Option<f32>,
    pub should_lose_next: bool,
    lose_decided: bool,

    // Special modes, governed by their own counters only
    pub rage_mode: bool,
    pub rage_counter: u32,
    pub tired_mode: bool,
    pub tired_counter: u32,
    pub super_focus: bool,
    pub focus_counter: u32,
}

/// The AI opponent for a single game.
///
/// Consumes one [`FrameInput`] per call and produces a target paddle center
/// position. All randomness flows through the injected RNG so tests can pin
/// outcomes.
pub struct DecisionEngine {
    profile: AiProfile,
    state: AiState,
    rng: Box<dyn RngCore + Send>,
}

impl DecisionEngine {
    pub fn new(profile: AiProfile) -> Self {
        Self::with_rng(profile, Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(profile: AiProfile, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            profile,
            state: AiState::default(),
            rng,
        }
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    pub fn state(&self) -> &AiState {
        &self.state
    }

    /// Decide where the paddle should move this frame.
    ///
    /// Returns the target paddle *center* y, always clamped to
    /// `[paddle_height/2, screen_height - paddle_height/2]`.
    pub fn decide(&mut self, frame: &FrameInput) -> f32 {
        if frame.scored_for_me || frame.scored_against_me {
            self.on_rally_end(frame.scored_for_me, frame.scored_against_me);
        }

        self.tick_modes();
        let (accuracy, error_rate) = self.effective_stats();

        // A paddle taller than the field would invert the valid band (and a
        // degenerate band must not panic the clamp), so cap it first.
        let paddle_height = frame.paddle_height.min(frame.screen_height);
        let paddle_center = frame.paddle_y + paddle_height / 2.0;
        let screen_center = frame.screen_height / 2.0;
        let min_y = paddle_height / 2.0;
        let max_y = frame.screen_height - paddle_height / 2.0;
        let plane_x = frame.screen_width - PADDLE_PLANE_MARGIN;
        let approaching = frame.ball_speed_x > 0.0;

        // The throw-or-not decision is made once per rally, the first time
        // the ball crosses into our half heading toward us.
        if approaching && frame.ball_x > frame.screen_width / 2.0 && !self.state.lose_decided {
            self.state.lose_decided = true;
            self.state.should_lose_next = self.should_lose();
        }

        let target = if self.state.should_lose_next && approaching {
            if self.chance(0.7) {
                // Aim deliberately wide of the true intercept
                let predicted = predict_ball_y(
                    frame.ball_x,
                    frame.ball_y,
                    frame.ball_speed_x,
                    frame.ball_speed_y,
                    plane_x,
                    frame.screen_height,
                );
                let sign = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
                predicted + sign * SABOTAGE_OFFSET
            } else {
                paddle_center
            }
        } else if self.chance(error_rate) {
            // Clumsy move: pick a random spot anywhere in the valid band
            self.uniform(min_y, max_y)
        } else if !approaching || frame.ball_x < IDLE_ZONE_X {
            self.state.is_frozen = false;
            self.state.target_locked = false;
            self.state.locked_target = None;
            screen_center
        } else {
            let predicted = predict_ball_y(
                frame.ball_x,
                frame.ball_y,
                frame.ball_speed_x,
                frame.ball_speed_y,
                plane_x,
                frame.screen_height,
            );

            if frame.ball_x > frame.screen_width - self.profile.freeze_distance {
                // Freeze zone: commit to the current position
                self.state.is_frozen = true;
                paddle_center
            } else if frame.ball_x > frame.screen_width - self.profile.prepare_distance {
                // Prepare zone: lock a (noisy) target once per rally
                if !self.state.target_locked {
                    let noise = self.noise(50.0 * (1.0 - accuracy));
                    self.state.locked_target = Some(predicted + noise);
                    self.state.target_locked = true;
                }
                self.state.locked_target.unwrap_or(predicted)
            } else {
                // Reaction zone: fresh noisy estimate every call
                predicted + self.noise(30.0 * (1.0 - accuracy))
            }
        };

        target.clamp(min_y, max_y)
    }

    /// Feed back whether the AI's paddle actually connected with the ball.
    ///
    /// Learning difficulties (hard, impossible, custom) tighten up on
    /// success and loosen on failure; the rest only keep score.
    pub fn record_hit(&mut self, success: bool) {
        if success {
            self.state.hits += 1;
            if self.profile.difficulty.learns() {
                self.profile.freeze_distance = (self.profile.freeze_distance + 2.0).min(200.0);
                self.profile.prediction_accuracy =
                    (self.profile.prediction_accuracy + self.profile.learning_rate).min(0.99);
            }
        } else {
            self.state.misses += 1;
            if self.profile.difficulty.learns() {
                self.profile.freeze_distance = (self.profile.freeze_distance - 3.0).max(80.0);
            }
        }
    }

    /// Score bookkeeping plus special-mode updates, then a clean slate of
    /// tactical flags for the next rally.
    fn on_rally_end(&mut self, scored_for_me: bool, scored_against_me: bool) {
        if scored_for_me {
            self.state.wins += 1;
            self.state.hits += 1;
            self.state.consecutive_wins += 1;
        } else {
            self.state.misses += 1;
            self.state.consecutive_wins = 0;
        }
        self.state.games_played += 1;

        self.update_special_modes(scored_against_me, scored_for_me);

        self.state.is_frozen = false;
        self.state.target_locked = false;
        self.state.locked_target = None;
        self.state.should_lose_next = false;
        self.state.lose_decided = false;
    }

    /// Rally-boundary triggers: rage builds on conceded points, fatigue
    /// kicks in every fifth completed game.
    fn update_special_modes(&mut self, scored_against_me: bool, scored_for_me: bool) {
        if self.profile.rage_enabled {
            if scored_against_me {
                self.state.rage_counter += 1;
                if self.state.rage_counter >= 2 {
                    self.state.rage_mode = true;
                }
            } else if scored_for_me {
                self.state.rage_counter = self.state.rage_counter.saturating_sub(1);
                if self.state.rage_counter == 0 {
                    self.state.rage_mode = false;
                }
            }
        }

        if self.profile.fatigue_enabled
            && self.state.games_played > 0
            && self.state.games_played % 5 == 0
        {
            self.state.tired_mode = true;
            self.state.tired_counter = 3;
        }
    }

    /// Per-decision mode ticks: countdowns run once per call, and focus has
    /// an independent 10% chance to (re)arm itself.
    fn tick_modes(&mut self) {
        if self.profile.fatigue_enabled && self.state.tired_counter > 0 {
            self.state.tired_counter -= 1;
            if self.state.tired_counter == 0 {
                self.state.tired_mode = false;
            }
        }

        if self.profile.focus_enabled {
            if self.chance(0.1) {
                self.state.super_focus = true;
                self.state.focus_counter = 3;
            }
            if self.state.focus_counter > 0 {
                self.state.focus_counter -= 1;
                if self.state.focus_counter == 0 {
                    self.state.super_focus = false;
                }
            }
        }
    }

    /// Derive (accuracy, error_rate) for this decision. Modifier order
    /// matters: rage, then fatigue, then focus, each compounding.
    fn effective_stats(&self) -> (f32, f32) {
        let mut accuracy = self.profile.prediction_accuracy;
        let mut error_rate = self.profile.error_rate;

        if self.state.rage_mode {
            error_rate *= 0.5;
            accuracy = (accuracy * 1.2).min(0.98);
        }
        if self.state.tired_mode {
            error_rate *= 1.5;
            accuracy *= 0.8;
        }
        if self.state.super_focus {
            accuracy = (accuracy * 1.3).min(0.99);
            error_rate *= 0.3;
        }

        (accuracy, error_rate)
    }

    /// Should the AI deliberately throw the incoming rally?
    fn should_lose(&mut self) -> bool {
        if self.state.games_played < 3 || self.state.rage_mode {
            return false;
        }

        let win_rate = self.state.wins as f32 / self.state.games_played as f32;

        // Adaptive difficulty: back off hard when the human is getting crushed
        if self.profile.adaptive_enabled && win_rate > 0.8 {
            return self.chance(0.6);
        }

        if win_rate > self.profile.target_win_rate + 0.2 {
            self.chance(self.profile.lose_probability * 2.0)
        } else if win_rate > self.profile.target_win_rate {
            self.chance(self.profile.lose_probability)
        } else if self.state.consecutive_wins >= self.profile.max_consecutive_wins {
            self.chance(0.8)
        } else {
            false
        }
    }

    fn chance(&mut self, probability: f32) -> bool {
        self.rng.gen::<f32>() < probability
    }

    fn uniform(&mut self, low: f32, high: f32) -> f32 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    fn noise(&mut self, range: f32) -> f32 {
        if range > 0.0 {
            self.rng.gen_range(-range..range)
        } else {
            0.0
        }
    }
}

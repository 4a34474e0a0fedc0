// Difficulty profiles for the AI opponent

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// AI difficulty selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// Easy - slow reactions, frequent mistakes, happy to lose
    Easy,
    /// Medium - balanced opponent, aims for a 50% win rate
    Medium,
    /// Hard - fast and accurate, learns from its hits
    Hard,
    /// Impossible - near-perfect tracking, almost never throws a point
    Impossible,
    /// Custom - fully client-configured via 0-10 sliders
    Custom,
}

impl Difficulty {
    /// Parse a wire-format difficulty label
    pub fn parse(label: &str) -> Option<Difficulty> {
        match label {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "impossible" => Some(Difficulty::Impossible),
            "custom" => Some(Difficulty::Custom),
            _ => None,
        }
    }

    /// Get wire/display name for this difficulty
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
            Difficulty::Custom => "custom",
        }
    }

    /// Whether this difficulty adapts its parameters from hit feedback
    pub fn learns(&self) -> bool {
        matches!(
            self,
            Difficulty::Hard | Difficulty::Impossible | Difficulty::Custom
        )
    }
}

/// Client-supplied custom difficulty settings.
///
/// All numeric fields are 0-10 sliders; values outside that range are
/// clamped before mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomSettings {
    pub reaction_speed: f32,
    pub prediction_accuracy: f32,
    pub accuracy: f32,
    pub learning_rate: f32,
    pub prepare_distance: f32,
    pub freeze_distance: f32,
    pub target_win_rate: f32,
    pub fairness: f32,
    pub max_consecutive_wins: f32,
    pub rage_mode: bool,
    pub fatigue_system: bool,
    pub focus_mode: bool,
    pub adaptive_difficulty: bool,
    pub show_prediction: bool,
}

/// Resolved AI parameter set, fixed for the lifetime of a game.
///
/// `freeze_distance` and `prediction_accuracy` are the only fields that
/// drift after creation, nudged by [`record_hit`](super::DecisionEngine::record_hit)
/// on learning-enabled difficulties.
#[derive(Debug, Clone)]
pub struct AiProfile {
    pub difficulty: Difficulty,
    pub reaction_speed: f32,
    pub prediction_accuracy: f32,
    pub prepare_distance: f32,
    pub freeze_distance: f32,
    pub error_rate: f32,
    pub learning_rate: f32,
    pub target_win_rate: f32,
    pub lose_probability: f32,
    pub max_consecutive_wins: u32,
    pub rage_enabled: bool,
    pub fatigue_enabled: bool,
    pub focus_enabled: bool,
    pub adaptive_enabled: bool,
    pub show_prediction_enabled: bool,
}

impl AiProfile {
    /// Fixed parameter presets for the four named difficulties
    pub fn preset(difficulty: Difficulty) -> AiProfile {
        // (reaction, accuracy, prepare, freeze, error, learn, win_rate, lose_p, max_wins)
        let (reaction_speed, prediction_accuracy, prepare_distance, freeze_distance, error_rate, learning_rate, target_win_rate, lose_probability, max_consecutive_wins) =
            match difficulty {
                Difficulty::Easy => (0.5, 0.4, 300.0, 60.0, 0.30, 0.005, 0.30, 0.40, 2),
                Difficulty::Medium | Difficulty::Custom => {
                    (0.7, 0.7, 400.0, 100.0, 0.15, 0.01, 0.50, 0.20, 3)
                }
                Difficulty::Hard => (0.95, 0.9, 500.0, 140.0, 0.05, 0.02, 0.70, 0.10, 5),
                Difficulty::Impossible => (1.0, 0.98, 600.0, 180.0, 0.01, 0.03, 0.90, 0.02, 10),
            };

        AiProfile {
            difficulty,
            reaction_speed,
            prediction_accuracy,
            prepare_distance,
            freeze_distance,
            error_rate,
            learning_rate,
            target_win_rate,
            lose_probability,
            max_consecutive_wins,
            rage_enabled: false,
            fatigue_enabled: false,
            focus_enabled: false,
            adaptive_enabled: false,
            show_prediction_enabled: false,
        }
    }

    /// Map 0-10 custom sliders onto the internal continuous parameter set
    pub fn from_custom(settings: &CustomSettings) -> AiProfile {
        let slider = |x: f32| x.clamp(0.0, 10.0);

        AiProfile {
            difficulty: Difficulty::Custom,
            reaction_speed: slider(settings.reaction_speed) / 10.0,
            prediction_accuracy: slider(settings.prediction_accuracy) / 10.0,
            prepare_distance: 200.0 + slider(settings.prepare_distance) * 40.0, // 200-600
            freeze_distance: 50.0 + slider(settings.freeze_distance) * 15.0,    // 50-200
            error_rate: 0.5 - slider(settings.accuracy) * 0.049,                // 0.5-0.01
            learning_rate: slider(settings.learning_rate) / 200.0,              // 0-0.05
            target_win_rate: slider(settings.target_win_rate) / 10.0,
            lose_probability: (10.0 - slider(settings.fairness)) / 20.0, // 0.5-0.0
            max_consecutive_wins: (slider(settings.max_consecutive_wins) as u32).max(1),
            rage_enabled: settings.rage_mode,
            fatigue_enabled: settings.fatigue_system,
            focus_enabled: settings.focus_mode,
            adaptive_enabled: settings.adaptive_difficulty,
            show_prediction_enabled: settings.show_prediction,
        }
    }

    /// Resolve a wire-format difficulty label plus optional custom settings.
    ///
    /// `custom` is required (and only consulted) for the `"custom"` label.
    pub fn resolve(label: &str, custom: Option<&CustomSettings>) -> anyhow::Result<AiProfile> {
        match Difficulty::parse(label) {
            Some(Difficulty::Custom) => match custom {
                Some(settings) => Ok(AiProfile::from_custom(settings)),
                None => bail!("custom difficulty requires custom_settings"),
            },
            Some(difficulty) => Ok(AiProfile::preset(difficulty)),
            None => bail!("unknown difficulty '{label}'"),
        }
    }

    /// Dead-zone threshold for the legacy up/down/stable direction mapping
    pub fn move_threshold(&self) -> f32 {
        match self.difficulty {
            Difficulty::Easy => 25.0,
            Difficulty::Medium => 15.0,
            Difficulty::Hard => 8.0,
            Difficulty::Impossible => 3.0,
            Difficulty::Custom => 25.0 * (1.0 - self.prediction_accuracy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_all(value: f32, flags: bool) -> CustomSettings {
        CustomSettings {
            reaction_speed: value,
            prediction_accuracy: value,
            accuracy: value,
            learning_rate: value,
            prepare_distance: value,
            freeze_distance: value,
            target_win_rate: value,
            fairness: value,
            max_consecutive_wins: value,
            rage_mode: flags,
            fatigue_system: flags,
            focus_mode: flags,
            adaptive_difficulty: flags,
            show_prediction: flags,
        }
    }

    #[test]
    fn test_preset_values() {
        let medium = AiProfile::preset(Difficulty::Medium);
        assert_eq!(medium.prediction_accuracy, 0.7);
        assert_eq!(medium.prepare_distance, 400.0);
        assert_eq!(medium.freeze_distance, 100.0);
        assert_eq!(medium.max_consecutive_wins, 3);
        assert!(!medium.rage_enabled);

        let impossible = AiProfile::preset(Difficulty::Impossible);
        assert_eq!(impossible.error_rate, 0.01);
        assert_eq!(impossible.target_win_rate, 0.90);
        assert_eq!(impossible.max_consecutive_wins, 10);
    }

    #[test]
    fn test_custom_boundaries() {
        let floor = AiProfile::from_custom(&custom_all(0.0, false));
        assert!((floor.error_rate - 0.5).abs() < 1e-4);
        assert_eq!(floor.prepare_distance, 200.0);
        assert_eq!(floor.freeze_distance, 50.0);
        assert_eq!(floor.lose_probability, 0.5);
        assert_eq!(floor.max_consecutive_wins, 1); // floor of 1 even at slider 0

        let ceiling = AiProfile::from_custom(&custom_all(10.0, true));
        assert!((ceiling.error_rate - 0.01).abs() < 1e-4);
        assert_eq!(ceiling.prepare_distance, 600.0);
        assert_eq!(ceiling.freeze_distance, 200.0);
        assert_eq!(ceiling.lose_probability, 0.0);
        assert_eq!(ceiling.max_consecutive_wins, 10);
        assert!(ceiling.rage_enabled && ceiling.adaptive_enabled);
    }

    #[test]
    fn test_out_of_range_sliders_clamp() {
        let over = AiProfile::from_custom(&custom_all(99.0, false));
        let at_max = AiProfile::from_custom(&custom_all(10.0, false));
        assert_eq!(over.prepare_distance, at_max.prepare_distance);
        assert_eq!(over.error_rate, at_max.error_rate);

        let under = AiProfile::from_custom(&custom_all(-5.0, false));
        let at_min = AiProfile::from_custom(&custom_all(0.0, false));
        assert_eq!(under.freeze_distance, at_min.freeze_distance);
        assert_eq!(under.lose_probability, at_min.lose_probability);
    }

    #[test]
    fn test_resolve_labels() {
        assert_eq!(
            AiProfile::resolve("hard", None).unwrap().difficulty,
            Difficulty::Hard
        );
        assert!(AiProfile::resolve("nightmare", None).is_err());
        assert!(AiProfile::resolve("custom", None).is_err());

        let custom = AiProfile::resolve("custom", Some(&custom_all(5.0, false))).unwrap();
        assert_eq!(custom.difficulty, Difficulty::Custom);
        assert_eq!(custom.prepare_distance, 400.0);
    }

    #[test]
    fn test_move_threshold() {
        assert_eq!(AiProfile::preset(Difficulty::Easy).move_threshold(), 25.0);
        assert_eq!(
            AiProfile::preset(Difficulty::Impossible).move_threshold(),
            3.0
        );

        let custom = AiProfile::from_custom(&custom_all(10.0, false));
        // prediction_accuracy = 1.0 -> zero dead zone
        assert_eq!(custom.move_threshold(), 0.0);
    }
}

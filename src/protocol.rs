// Wire protocol: JSON messages exchanged with game clients

use serde::{Deserialize, Serialize};

use crate::ai::CustomSettings;

pub const DEFAULT_PADDLE_HEIGHT: f32 = 100.0;
pub const DEFAULT_AREA_WIDTH: f32 = 800.0;
pub const DEFAULT_AREA_HEIGHT: f32 = 600.0;

/// AI configuration carried by `init_game` (and the legacy init form)
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    pub custom_settings: Option<CustomSettings>,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct InitGameRequest {
    pub game_id: Option<String>,
    pub ai_config: Option<AiConfig>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    pub game_id: Option<String>,
}

/// Ball kinematics. Every field is optional: a frame with missing data is
/// answered with a hold-position fallback instead of an error.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BallData {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub speed_x: Option<f32>,
    pub speed_y: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaddleData {
    pub ai_y: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GameAreaData {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoreData {
    #[serde(default)]
    pub ai_scored: bool,
    #[serde(default)]
    pub human_scored: bool,
}

/// One frame observation. Score flags arrive either nested under `score`
/// or as top-level `scored_for_me`/`scored_against_me`; both shapes count.
#[derive(Debug, Default, Deserialize)]
pub struct GameDataRequest {
    pub game_id: Option<String>,
    #[serde(default)]
    pub ball: BallData,
    #[serde(default)]
    pub paddle: PaddleData,
    #[serde(default)]
    pub game_area: GameAreaData,
    #[serde(default)]
    pub score: ScoreData,
    #[serde(default)]
    pub scored_for_me: bool,
    #[serde(default)]
    pub scored_against_me: bool,
}

impl GameDataRequest {
    pub fn scored_for_me(&self) -> bool {
        self.scored_for_me || self.score.ai_scored
    }

    pub fn scored_against_me(&self) -> bool {
        self.scored_against_me || self.score.human_scored
    }
}

/// Server responses, tagged like the inbound messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    GameInitialized {
        #[serde(skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ai_difficulty: Option<String>,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    GameJoined {
        #[serde(skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    AiDecision {
        target_y: f32,
        /// Legacy discrete form, derived from `target_y`
        direction: &'static str,
        game_id: String,
    },
}

impl Response {
    pub fn init_ok(game_id: String, ai_difficulty: String) -> Response {
        Response::GameInitialized {
            game_id: Some(game_id),
            ai_difficulty: Some(ai_difficulty),
            success: true,
            error: None,
        }
    }

    pub fn init_err(error: String) -> Response {
        Response::GameInitialized {
            game_id: None,
            ai_difficulty: None,
            success: false,
            error: Some(error),
        }
    }

    pub fn join_ok(game_id: String) -> Response {
        Response::GameJoined {
            game_id: Some(game_id),
            success: true,
            error: None,
        }
    }

    pub fn join_err(error: String) -> Response {
        Response::GameJoined {
            game_id: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Bare error shape for malformed input (`{"error": "Invalid JSON"}`)
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map an absolute target position to the legacy up/down/stable command.
///
/// `dead_zone` suppresses jitter around the current paddle center; screen
/// y grows downward, so a positive difference means "down".
pub fn direction_for(target_y: f32, paddle_center: f32, dead_zone: f32) -> &'static str {
    let diff = target_y - paddle_center;
    if diff.abs() < dead_zone {
        "stable"
    } else if diff > 0.0 {
        "down"
    } else {
        "up"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_mapping() {
        assert_eq!(direction_for(300.0, 290.0, 15.0), "stable");
        assert_eq!(direction_for(400.0, 290.0, 15.0), "down");
        assert_eq!(direction_for(100.0, 290.0, 15.0), "up");
        // Exactly at the dead zone boundary still moves
        assert_eq!(direction_for(305.0, 290.0, 15.0), "down");
    }

    #[test]
    fn test_game_data_full_shape() {
        let request: GameDataRequest = serde_json::from_str(
            r#"{
                "game_id": "g1",
                "ball": {"x": 700.0, "y": 300.0, "speed_x": 5.0, "speed_y": 0.0},
                "paddle": {"ai_y": 250.0, "height": 80.0},
                "game_area": {"width": 800.0, "height": 600.0},
                "score": {"ai_scored": true}
            }"#,
        )
        .unwrap();

        assert_eq!(request.game_id.as_deref(), Some("g1"));
        assert_eq!(request.ball.x, Some(700.0));
        assert_eq!(request.paddle.height, Some(80.0));
        assert!(request.scored_for_me());
        assert!(!request.scored_against_me());
    }

    #[test]
    fn test_game_data_top_level_score_flags() {
        let request: GameDataRequest =
            serde_json::from_str(r#"{"scored_against_me": true}"#).unwrap();
        assert!(request.scored_against_me());
        assert!(!request.scored_for_me());
    }

    #[test]
    fn test_game_data_tolerates_missing_fields() {
        let request: GameDataRequest = serde_json::from_str(r#"{"game_id": "g1"}"#).unwrap();
        assert_eq!(request.ball.x, None);
        assert_eq!(request.paddle.ai_y, None);
        assert_eq!(request.game_area.width, None);
    }

    #[test]
    fn test_response_serialization() {
        let json =
            serde_json::to_value(Response::init_ok("g1".into(), "medium".into())).unwrap();
        assert_eq!(json["type"], "game_initialized");
        assert_eq!(json["game_id"], "g1");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(Response::join_err("Game g9 not found".into())).unwrap();
        assert_eq!(json["type"], "game_joined");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Game g9 not found");

        let json = serde_json::to_value(Response::AiDecision {
            target_y: 290.0,
            direction: "stable",
            game_id: "g1".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "ai_decision");
        assert_eq!(json["target_y"], 290.0);
        assert_eq!(json["direction"], "stable");
    }
}

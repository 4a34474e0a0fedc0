// Trajectory prediction for the AI opponent

/// Ball speeds below this are treated as "not moving horizontally".
const MIN_HORIZONTAL_SPEED: f32 = 0.1;

/// Predict where the ball will be when it reaches the given x-plane.
///
/// Returns the current `ball_y` unchanged if the ball is (effectively)
/// stationary horizontally or already past the plane - the caller treats
/// that as "nothing to intercept". Accounts for wall bounces off the top
/// and bottom of the field.
///
/// # Arguments
/// * `ball_x`, `ball_y` - Current ball position (center coordinates)
/// * `ball_vx`, `ball_vy` - Current ball velocity (units per frame)
/// * `plane_x` - The x-position we're predicting for (the AI paddle's plane)
/// * `screen_height` - Height of the playing field (for wall bounce calculation)
pub fn predict_ball_y(
    ball_x: f32,
    ball_y: f32,
    ball_vx: f32,
    ball_vy: f32,
    plane_x: f32,
    screen_height: f32,
) -> f32 {
    if ball_vx.abs() < MIN_HORIZONTAL_SPEED {
        return ball_y;
    }

    let time_to_reach = (plane_x - ball_x) / ball_vx;
    if time_to_reach <= 0.0 {
        return ball_y;
    }

    let mut predicted_y = ball_y + ball_vy * time_to_reach;

    // Fold the projected position back into the field by reflecting off the
    // exceeded wall. Steep angles can bounce several times; cap at 10
    // reflections and let the caller clamp whatever is left.
    for _ in 0..10 {
        if (0.0..=screen_height).contains(&predicted_y) {
            break;
        }

        if predicted_y < 0.0 {
            predicted_y = -predicted_y;
        } else if predicted_y > screen_height {
            predicted_y = 2.0 * screen_height - predicted_y;
        }
    }

    predicted_y
}

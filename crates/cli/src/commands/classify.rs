use serde_json::json;

use crate::commands::CommandResult;
use wardrobe_core::domain::weather::WeatherObservation;
use wardrobe_core::weather::classify;

pub fn run(temperature_c: f64, condition: &str, wind_speed_ms: f64) -> CommandResult {
    if !temperature_c.is_finite() || !wind_speed_ms.is_finite() {
        return CommandResult::failure(
            "classify",
            "invalid_observation",
            "temperature and wind speed must be finite numbers",
            2,
        );
    }
    if condition.trim().is_empty() {
        return CommandResult::failure("classify", "invalid_observation", "condition is required", 2);
    }

    let observation = WeatherObservation::new(temperature_c, condition.trim(), wind_speed_ms);
    let category = classify(&observation);

    CommandResult::success_with_data(
        "classify",
        category.title(),
        Some(json!({
            "category": category,
            "title": category.title(),
            "temperature_c": observation.temperature_c,
            "condition": observation.condition,
            "wind_speed_ms": observation.wind_speed_ms,
        })),
    )
}

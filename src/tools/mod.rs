//! 工具层：注册表、执行器与内置工具（时间、天气、空气质量、日历、浏览器）

pub mod air_quality;
pub mod browser;
pub mod calendar;
pub mod executor;
pub mod geo;
pub mod registry;
pub mod schema;
pub mod time;
pub mod weather;

use std::time::Duration;

pub use air_quality::{aqi_category, AirQualityTool, AQI_BANDS};
pub use browser::{browser_command, target_url, BrowserTool, UNSUPPORTED_OS};
pub use calendar::{CalendarArgs, CalendarTool, CALENDAR_NOT_CONFIGURED};
pub use executor::ToolExecutor;
pub use geo::{Geocoder, Location};
pub use registry::{Tool, ToolRegistry};
pub use schema::{input_schema, schema_of};
pub use time::{format_time_at, parse_timezone, CurrentTimeTool};
pub use weather::WeatherTool;

use crate::config::ToolsSection;

/// 按配置组装内置工具，注册顺序即发给模型的工具目录顺序
pub fn create_default_registry(cfg: &ToolsSection) -> ToolRegistry {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "http client builder failed, using defaults");
            reqwest::Client::new()
        });
    let geocoder = Geocoder::new(
        client.clone(),
        Location {
            name: cfg.default_location.clone(),
            latitude: cfg.default_latitude,
            longitude: cfg.default_longitude,
        },
    );

    let mut registry = ToolRegistry::new();
    registry.register(CurrentTimeTool::new(cfg.default_timezone.clone()));
    registry.register(WeatherTool::new(client.clone(), geocoder.clone()));
    registry.register(AirQualityTool::new(client, geocoder));
    registry.register(CalendarTool::new(cfg.calendar_path.clone()));
    registry.register(BrowserTool);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = create_default_registry(&ToolsSection::default());
        assert_eq!(
            registry.tool_names(),
            vec![
                "get_current_time",
                "get_weather",
                "get_air_quality",
                "get_calendar_events",
                "open_browser"
            ]
        );
        let specs = registry.specs();
        assert!(specs[3].parameters["properties"].get("limit").is_some());
        assert_eq!(specs[0].parameters["properties"]["input"]["type"], "string");
    }
}

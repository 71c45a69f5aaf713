//! 天气工具：Open-Meteo 当前天气

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::geo::{Geocoder, Location};
use crate::tools::schema::input_schema;
use crate::tools::Tool;

pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m,wind_direction_10m";

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<u32>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub wind_direction_10m: Option<f64>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

/// WMO 天气代码 -> 中文描述
pub fn weather_code_text(code: u32) -> &'static str {
    match code {
        0 => "晴",
        1 => "大部晴朗",
        2 => "多云",
        3 => "阴",
        45 | 48 => "雾",
        51 | 53 | 55 => "毛毛雨",
        56 | 57 => "冻毛毛雨",
        61 => "小雨",
        63 => "中雨",
        65 => "大雨",
        66 | 67 => "冻雨",
        71 => "小雪",
        73 => "中雪",
        75 => "大雪",
        77 => "雪粒",
        80..=82 => "阵雨",
        85 | 86 => "阵雪",
        95 => "雷暴",
        96 | 99 => "雷暴伴冰雹",
        _ => "未知天气",
    }
}

fn wind_direction_text(deg: f64) -> &'static str {
    const DIRS: [&str; 8] = ["北风", "东北风", "东风", "东南风", "南风", "西南风", "西风", "西北风"];
    let idx = ((deg.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    DIRS[idx]
}

/// 格式化为一段中文摘要
pub fn format_weather(location: &Location, w: &CurrentWeather) -> String {
    let mut parts = vec![format!("{}当前", location.name)];
    if let Some(code) = w.weather_code {
        parts.push(weather_code_text(code).to_string());
    }
    parts.push(format!("气温 {:.1}°C", w.temperature_2m));
    if let Some(t) = w.apparent_temperature {
        parts.push(format!("体感 {t:.1}°C"));
    }
    if let Some(h) = w.relative_humidity_2m {
        parts.push(format!("相对湿度 {h:.0}%"));
    }
    if let Some(p) = w.precipitation {
        parts.push(format!("降水 {p:.1} mm"));
    }
    if let Some(speed) = w.wind_speed_10m {
        let dir = w.wind_direction_10m.map(wind_direction_text).unwrap_or("风");
        parts.push(format!("{dir} {speed:.1} km/h"));
    }
    parts.join("，")
}

pub struct WeatherTool {
    client: Client,
    geocoder: Geocoder,
    url: String,
}

impl WeatherTool {
    pub fn new(client: Client, geocoder: Geocoder) -> Self {
        Self {
            client,
            geocoder,
            url: FORECAST_URL.to_string(),
        }
    }

    async fn fetch(&self, input: &str) -> Result<String, String> {
        let location = self.geocoder.resolve(input).await?;
        let resp: ForecastResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| format!("天气请求失败: {e}"))?
            .error_for_status()
            .map_err(|e| format!("天气请求失败: {e}"))?
            .json()
            .await
            .map_err(|e| format!("天气响应解析失败: {e}"))?;
        Ok(format_weather(&location, &resp.current))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "查询实时天气（气温、体感、湿度、降水、风）。输入城市名或 \"纬度,经度\"；为空时使用默认城市。"
    }

    fn parameters_schema(&self) -> Value {
        input_schema("城市名或 \"纬度,经度\"，可为空")
    }

    async fn invoke(&self, input: &str) -> String {
        match self.fetch(input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "get_weather failed");
                format!("获取天气失败：{e}")
            }
        }
    }
}

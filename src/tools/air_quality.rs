//! 空气质量工具：Open-Meteo 美标 AQI
//!
//! 只返回裸数值文本（如 "167"）；等级与建议由 prompt 中的展示规则负责（见 aqi_category）。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::geo::Geocoder;
use crate::tools::schema::input_schema;
use crate::tools::Tool;

pub const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// 美标 AQI 分级（上界含，等级名）
pub const AQI_BANDS: &[(u32, &str)] = &[
    (50, "优"),
    (100, "中等"),
    (150, "对敏感人群不健康"),
    (200, "不健康"),
    (300, "非常不健康"),
    (u32::MAX, "危险"),
];

/// AQI 数值对应的等级
pub fn aqi_category(aqi: u32) -> &'static str {
    AQI_BANDS
        .iter()
        .find(|(upper, _)| aqi <= *upper)
        .map(|(_, name)| *name)
        .unwrap_or("危险")
}

#[derive(Deserialize)]
struct AirQualityResponse {
    current: AirQualityCurrent,
}

#[derive(Deserialize)]
struct AirQualityCurrent {
    us_aqi: Option<f64>,
}

pub struct AirQualityTool {
    client: Client,
    geocoder: Geocoder,
    url: String,
}

impl AirQualityTool {
    pub fn new(client: Client, geocoder: Geocoder) -> Self {
        Self {
            client,
            geocoder,
            url: AIR_QUALITY_URL.to_string(),
        }
    }

    async fn fetch(&self, input: &str) -> Result<u32, String> {
        let location = self.geocoder.resolve(input).await?;
        let resp: AirQualityResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("current", "us_aqi".to_string()),
            ])
            .send()
            .await
            .map_err(|e| format!("空气质量请求失败: {e}"))?
            .error_for_status()
            .map_err(|e| format!("空气质量请求失败: {e}"))?
            .json()
            .await
            .map_err(|e| format!("空气质量响应解析失败: {e}"))?;
        resp.current
            .us_aqi
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u32)
            .ok_or_else(|| format!("{} 暂无 AQI 数据", location.name))
    }
}

#[async_trait]
impl Tool for AirQualityTool {
    fn name(&self) -> &str {
        "get_air_quality"
    }

    fn description(&self) -> &str {
        "查询实时空气质量，返回美标 AQI 数值（纯数字）。输入城市名或 \"纬度,经度\"；为空时使用默认城市。"
    }

    fn parameters_schema(&self) -> Value {
        input_schema("城市名或 \"纬度,经度\"，可为空")
    }

    async fn invoke(&self, input: &str) -> String {
        match self.fetch(input).await {
            Ok(aqi) => aqi.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "get_air_quality failed");
                format!("获取空气质量失败：{e}")
            }
        }
    }
}

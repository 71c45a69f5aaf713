//! 位置解析：工具输入 -> 经纬度
//!
//! 输入可以为空（用默认位置）、城市名、"纬度,经度"，或 JSON {"location": ...} / {"latitude": .., "longitude": ..}。
//! 城市名通过 Open-Meteo 地理编码接口解析。

use reqwest::Client;
use serde::Deserialize;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// 解析后的位置输入
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Default,
    Name(String),
    Coords(f64, f64),
}

fn parse_coords(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once([',', '，'])?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

pub fn parse_location_input(input: &str) -> LocationInput {
    let input = input.trim();
    if input.is_empty() {
        return LocationInput::Default;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(input) {
        let lat = map.get("latitude").or_else(|| map.get("lat")).and_then(|v| v.as_f64());
        let lon = map
            .get("longitude")
            .or_else(|| map.get("lon"))
            .or_else(|| map.get("lng"))
            .and_then(|v| v.as_f64());
        if let (Some(lat), Some(lon)) = (lat, lon) {
            return LocationInput::Coords(lat, lon);
        }
        return match ["location", "city", "input"]
            .iter()
            .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
        {
            Some(name) => parse_location_input(name),
            None => LocationInput::Default,
        };
    }
    match parse_coords(input) {
        Some((lat, lon)) => LocationInput::Coords(lat, lon),
        None => LocationInput::Name(input.to_string()),
    }
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
}

/// 位置解析器：持有 HTTP 客户端、地理编码地址与默认位置
#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    url: String,
    default: Location,
}

impl Geocoder {
    pub fn new(client: Client, default: Location) -> Self {
        Self {
            client,
            url: GEOCODING_URL.to_string(),
            default,
        }
    }

    pub async fn resolve(&self, input: &str) -> Result<Location, String> {
        match parse_location_input(input) {
            LocationInput::Default => Ok(self.default.clone()),
            LocationInput::Coords(latitude, longitude) => Ok(Location {
                name: format!("{latitude:.4},{longitude:.4}"),
                latitude,
                longitude,
            }),
            LocationInput::Name(name) if name == self.default.name => Ok(self.default.clone()),
            LocationInput::Name(name) => self.geocode(&name).await,
        }
    }

    async fn geocode(&self, name: &str) -> Result<Location, String> {
        let resp: GeocodingResponse = self
            .client
            .get(&self.url)
            .query(&[("name", name), ("count", "1"), ("language", "zh"), ("format", "json")])
            .send()
            .await
            .map_err(|e| format!("地理编码请求失败: {e}"))?
            .error_for_status()
            .map_err(|e| format!("地理编码请求失败: {e}"))?
            .json()
            .await
            .map_err(|e| format!("地理编码响应解析失败: {e}"))?;
        let hit = resp
            .results
            .into_iter()
            .next()
            .ok_or_else(|| format!("找不到地点「{name}」"))?;
        Ok(Location {
            name: hit.name,
            latitude: hit.latitude,
            longitude: hit.longitude,
        })
    }
}

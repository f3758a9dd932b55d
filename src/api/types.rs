use serde::Serialize;

use crate::clients::weatherbit::{CurrentWeather, ForecastDay};
use crate::db::SearchRecord;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WeatherReportDto {
    pub search_id: i32,
    pub current_weather: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

impl From<crate::services::WeatherReport> for WeatherReportDto {
    fn from(report: crate::services::WeatherReport) -> Self {
        Self {
            search_id: report.search_id,
            current_weather: report.current_weather,
            forecast: report.forecast,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchHistoryDto {
    pub id: i32,
    pub city: String,
    pub country: String,
    pub timestamp: String,
}

impl From<SearchRecord> for SearchHistoryDto {
    fn from(record: SearchRecord) -> Self {
        Self {
            id: record.id,
            city: record.city,
            country: record.country,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedHistoryDto {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
}

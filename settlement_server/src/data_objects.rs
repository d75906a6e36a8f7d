use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use settlement_engine::db_types::FulfillmentStatus;

/// The envelope every JSON response is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T = Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> JsonResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// A failure that carries structured detail, such as an itemized cart report.
    pub fn failure_with_data<S: Display>(message: S, data: T) -> Self {
        Self { success: false, data: Some(data), error: Some(message.to_string()) }
    }
}

impl JsonResponse<Value> {
    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, data: None, error: Some(message.to_string()) }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateStatusParams {
    pub status: FulfillmentStatus,
}

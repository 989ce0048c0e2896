use lookoutcore::DashboardError;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;

/// Body returned by `/control` and by failed exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeReply {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            error: None,
        }
    }

    pub fn rejected(err: &DashboardError) -> Self {
        Self {
            status: "rejected".into(),
            error: Some(err.to_string()),
        }
    }
}

pub fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::EmptyHistory => StatusCode::BAD_REQUEST,
        DashboardError::HeatmapDisabled | DashboardError::NothingRendered => StatusCode::CONFLICT,
        DashboardError::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

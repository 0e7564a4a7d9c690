use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ExportStartResponse {
    pub status: String,
    pub message: String,
    pub task_id: Uuid,
    pub check_status_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportStatusResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

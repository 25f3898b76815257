//! Wire types for the design API.
//!
//! The API is loosely typed on the server side; anything the client forwards
//! verbatim (scene analysis, edit plans) stays as opaque JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An edit plan produced by `plan-edits` and forwarded verbatim to
/// `run-inpainting`. The client never inspects its structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditPlan(pub serde_json::Value);

/// Response from `upload-image`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub image_id: String,
}

/// Response from `transcribe`.
#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// Response from `fetch-design-knowledge`. The server returns either parsed
/// recommendations or the raw model response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignKnowledge {
    #[serde(default)]
    pub recommendations: Option<serde_json::Value>,
    #[serde(default)]
    pub raw_response: Option<String>,
}

/// One produced image-edit result, as returned by `run-inpainting` and kept
/// in session history. Fields the server omits are filled in client-side when
/// the version is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    #[serde(default)]
    pub version_id: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub edit_plan: Option<EditPlan>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-side wall time for the edit, in seconds.
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Response from `system/ws-url`.
#[derive(Debug, Clone, Deserialize)]
pub struct WsUrlResponse {
    pub ws_url: String,
}

/// Response from creating a share link.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareLink {
    pub share_url: String,
}

/// A shared view fetched by token.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedView {
    #[serde(default)]
    pub project: Option<serde_json::Value>,
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    #[serde(default)]
    pub original_image: Option<String>,
    #[serde(default)]
    pub edited_image: Option<String>,
    #[serde(default)]
    pub edit_plan: Option<EditPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edit_plan_round_trips_verbatim() {
        let raw = json!({"edits": [{"target": "wall", "color": "teal"}], "room_type": "bedroom"});
        let plan: EditPlan = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&plan).unwrap(), raw);
    }

    #[test]
    fn version_decodes_minimal_server_response() {
        let version: Version = serde_json::from_str(
            r#"{"version_id": "v1", "image_url": "https://x/edited.png", "processing_time": 45.2}"#,
        )
        .unwrap();
        assert_eq!(version.version_id.as_deref(), Some("v1"));
        assert_eq!(version.image_url, "https://x/edited.png");
        assert_eq!(version.processing_time, Some(45.2));
        assert!(version.user_prompt.is_none());
        assert!(version.created_at.is_none());
    }

    #[test]
    fn design_knowledge_accepts_either_shape() {
        let parsed: DesignKnowledge =
            serde_json::from_str(r#"{"recommendations": {"palette": ["teal"]}}"#).unwrap();
        assert!(parsed.recommendations.is_some());
        let raw: DesignKnowledge =
            serde_json::from_str(r#"{"raw_response": "use muted tones"}"#).unwrap();
        assert_eq!(raw.raw_response.as_deref(), Some("use muted tones"));
    }

    #[test]
    fn shared_view_tolerates_missing_fields() {
        let view: SharedView = serde_json::from_str("{}").unwrap();
        assert!(view.project.is_none());
        assert!(view.edited_image.is_none());
    }
}

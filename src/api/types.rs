use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct UploadResponse {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoProjectRequest {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    pub elements: Vec<Element>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Image {
        source: String,
        position: Position,
        size: Size,
        #[serde(rename = "startTime")]
        start_time: u32,
        duration: u32,
    },
    Text {
        content: String,
        position: Position,
        style: TextStyle,
        #[serde(rename = "startTime")]
        start_time: u32,
        duration: u32,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: u32,
    pub color: String,
    pub background_color: String,
    pub font_family: String,
    pub font_weight: String,
    pub text_align: String,
    pub padding: u32,
}

/// Returned by both project creation and render requests.
#[derive(Debug, Deserialize, Clone)]
pub struct CreatedResponse {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct RenderRequest {
    pub quality: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RenderStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
}

/// The service hands out ids as strings on some endpoints and integers on others.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if !s.trim().is_empty() => Some(s),
        Some(RawId::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

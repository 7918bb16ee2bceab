use serde::{Deserialize, Serialize};

/// Form body of `POST /generate-video`.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateForm {
    /// The prompt with surrounding whitespace removed, if any text remains.
    pub fn validated_prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
    }
}

/// Input forwarded to the inference provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationInput {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub video_url: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_key_configured: bool,
}

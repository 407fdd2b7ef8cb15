use crate::capture::CapturedImage;
use crate::settings::AppConfig;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

/// One user question, built once per ask and consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub prompt: String,
    pub image: Option<CapturedImage>,
    pub model_id: String,
    pub temperature: f32,
    pub thinking_budget: i32,
    pub system_instruction: String,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>, image: Option<CapturedImage>, config: &AppConfig) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            model_id: config.model_id.clone(),
            temperature: config.temperature,
            thinking_budget: config.thinking_budget,
            system_instruction: config.system_instruction.clone(),
        }
    }

    pub fn body(&self) -> GenerateContentBody {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &self.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: STANDARD.encode(image.png()),
                },
            });
        }
        parts.push(Part::Text {
            text: self.prompt.clone(),
        });

        let system_instruction = if self.system_instruction.trim().is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: self.system_instruction.clone(),
                }],
            })
        };

        GenerateContentBody {
            contents: vec![Content {
                role: Some("user".into()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                thinking_config: ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                },
            },
            system_instruction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentBody {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
}

/// Text-to-speech tool.
///
/// Posts `{text, voiceId, modelId}` as JSON to the TTS endpoint with the
/// service token in the `token` query parameter, and returns the `audioUrl`
/// from the response as an audio content block.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::TtsCredential;
use crate::core::error::ToolError;
use crate::core::protocol::ContentBlock;
use crate::core::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::core::schema::{ArgumentSchema, FieldSpec, ValidatedArgs};

pub const NAME: &str = "generate_audio";
pub const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2";
pub const CONFIRMATION: &str = "Audio generated successfully.";
pub const MIME_TYPE: &str = "audio/mpeg";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioArgs {
    text: String,
    voice_id: String,
    model_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    model_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    audio_url: String,
}

pub fn schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .field(FieldSpec::string("text", "Text to speak").length(1, 5000))
        .field(FieldSpec::string("voiceId", "Voice identifier"))
        .field(
            FieldSpec::string("modelId", "Speech model identifier")
                .default_value(DEFAULT_MODEL_ID),
        )
}

struct GenerateAudio {
    client: reqwest::Client,
    credential: TtsCredential,
}

#[async_trait]
impl ToolHandler for GenerateAudio {
    async fn handle(&self, args: ValidatedArgs) -> Result<Vec<ContentBlock>, ToolError> {
        let args: AudioArgs = args.into_typed()?;

        let response = self
            .client
            .post(&self.credential.url)
            .query(&[("token", self.credential.token.as_str())])
            .json(&TtsRequest {
                text: &args.text,
                voice_id: &args.voice_id,
                model_id: &args.model_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::downstream_failure(NAME, response).await);
        }

        let body: TtsResponse = response.json().await?;
        Ok(vec![
            ContentBlock::text(CONFIRMATION),
            ContentBlock::Audio {
                url: body.audio_url,
                mime_type: MIME_TYPE.to_string(),
            },
        ])
    }
}

/// Register the audio tool with the tool registry.
pub fn register(registry: &mut ToolRegistry, credential: &TtsCredential, client: reqwest::Client) {
    registry.register(ToolDefinition {
        name: NAME,
        description: "Generate speech audio from text and return a URL to the MP3.",
        schema: schema(),
        handler: Box::new(GenerateAudio {
            client,
            credential: credential.clone(),
        }),
    });
}

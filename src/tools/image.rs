/// Image generation tool.
///
/// Posts `{prompt, steps}` as JSON with the service key as a bearer token and
/// returns the `url` from the response as an image content block.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::ImageCredential;
use crate::core::error::ToolError;
use crate::core::protocol::ContentBlock;
use crate::core::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::core::schema::{ArgumentSchema, FieldSpec, ValidatedArgs};

pub const NAME: &str = "generate_image";
pub const DEFAULT_STEPS: i64 = 30;

#[derive(Deserialize)]
struct ImageArgs {
    prompt: String,
    steps: i64,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    steps: i64,
}

#[derive(Deserialize)]
struct ImageResponse {
    url: String,
}

pub fn schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .field(FieldSpec::string("prompt", "Description of the image").length(1, 800))
        .field(
            FieldSpec::integer("steps", "Number of diffusion steps")
                .range(1, 100)
                .default_value(DEFAULT_STEPS),
        )
}

/// Media type guessed from the URL's file extension, PNG when unknown.
fn image_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let ext = file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

struct GenerateImage {
    client: reqwest::Client,
    credential: ImageCredential,
}

#[async_trait]
impl ToolHandler for GenerateImage {
    async fn handle(&self, args: ValidatedArgs) -> Result<Vec<ContentBlock>, ToolError> {
        let args: ImageArgs = args.into_typed()?;

        let response = self
            .client
            .post(&self.credential.url)
            .bearer_auth(&self.credential.api_key)
            .json(&ImageRequest {
                prompt: &args.prompt,
                steps: args.steps,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::downstream_failure(NAME, response).await);
        }

        let body: ImageResponse = response.json().await?;
        let mime_type = image_mime_type(&body.url).to_string();
        Ok(vec![ContentBlock::Image {
            url: body.url,
            mime_type,
        }])
    }
}

/// Register the image tool with the tool registry.
pub fn register(registry: &mut ToolRegistry, credential: &ImageCredential, client: reqwest::Client) {
    registry.register(ToolDefinition {
        name: NAME,
        description: "Generate an image from a text prompt and return its URL.",
        schema: schema(),
        handler: Box::new(GenerateImage {
            client,
            credential: credential.clone(),
        }),
    });
}

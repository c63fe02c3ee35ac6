/// Translation tool.
///
/// Posts the raw text as `text/plain` with the target language in the
/// `targetLang` query parameter. The endpoint carries its own auth, if any.
/// The response body is returned as-is in a text content block.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::core::config::TranslateCredential;
use crate::core::error::ToolError;
use crate::core::protocol::ContentBlock;
use crate::core::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::core::schema::{ArgumentSchema, FieldSpec, ValidatedArgs};

pub const NAME: &str = "translate_text";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateArgs {
    text: String,
    target_lang: String,
}

pub fn schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .field(FieldSpec::string("text", "Text to translate").length(1, 10000))
        .field(FieldSpec::fixed_string(
            "targetLang",
            "Two-letter target language code, e.g. \"de\"",
            2,
        ))
}

struct TranslateText {
    client: reqwest::Client,
    credential: TranslateCredential,
}

#[async_trait]
impl ToolHandler for TranslateText {
    async fn handle(&self, args: ValidatedArgs) -> Result<Vec<ContentBlock>, ToolError> {
        let args: TranslateArgs = args.into_typed()?;

        let response = self
            .client
            .post(&self.credential.url)
            .query(&[("targetLang", args.target_lang.as_str())])
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(args.text)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::downstream_failure(NAME, response).await);
        }

        Ok(vec![ContentBlock::text(response.text().await?)])
    }
}

/// Register the translation tool with the tool registry.
pub fn register(
    registry: &mut ToolRegistry,
    credential: &TranslateCredential,
    client: reqwest::Client,
) {
    registry.register(ToolDefinition {
        name: NAME,
        description: "Translate text into the given two-letter target language.",
        schema: schema(),
        handler: Box::new(TranslateText {
            client,
            credential: credential.clone(),
        }),
    });
}

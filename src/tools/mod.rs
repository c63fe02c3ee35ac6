/// Tools Module
///
/// One module per downstream-backed tool. Each exports a `register` function
/// that adds the tool to the registry during initialization. Each adapter
/// owns its downstream's credential placement and payload shape.

pub mod audio;
pub mod image;
pub mod translate;

use tracing::warn;

use crate::core::error::ToolError;

/// Turn a non-2xx downstream response into a failure carrying its body.
async fn downstream_failure(tool: &str, response: reqwest::Response) -> ToolError {
    let status = response.status();
    match response.text().await {
        Ok(body) => {
            warn!(tool, status = status.as_u16(), "downstream returned an error status");
            ToolError::Downstream(body)
        }
        Err(e) => e.into(),
    }
}

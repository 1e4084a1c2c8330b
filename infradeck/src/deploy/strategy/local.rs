//! Running configured command stages inside a workspace

use std::path::Path;

use tokio::sync::mpsc;
use tracing::debug;

use crate::deploy::output::RunOutput;
use crate::deploy::process::{OutputChunk, ProcessRunner};
use crate::errors::DeckError;

/// Run each stage in order, streaming its output into `output`.
///
/// Stops at the first failing stage. Returns the stage outputs joined by
/// newlines.
pub async fn run_stages(
    runner: &ProcessRunner,
    stages: &[String],
    working_dir: &Path,
    output: &mut RunOutput,
) -> Result<String, DeckError> {
    let mut outputs = Vec::with_capacity(stages.len());

    for (index, stage) in stages.iter().enumerate() {
        debug!(
            "Deployment {}: stage {}/{}",
            output.deployment_id(),
            index + 1,
            stages.len()
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<OutputChunk>();
        let forward = async {
            while let Some(chunk) = rx.recv().await {
                output.push_chunk(&chunk.data).await?;
            }
            Ok::<(), DeckError>(())
        };

        let (result, forwarded) = tokio::join!(runner.run(stage, working_dir, tx), forward);
        forwarded?;
        outputs.push(result?);
    }

    Ok(outputs.join("\n"))
}

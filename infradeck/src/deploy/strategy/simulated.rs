//! Playback of scripted console output

use tokio::time::sleep;

use crate::deploy::output::RunOutput;
use crate::deploy::strategy::scripts::ScriptStep;
use crate::errors::DeckError;

/// Emit each step after its delay. Returns the final logs.
pub async fn play_script(steps: &[ScriptStep], output: &mut RunOutput) -> Result<String, DeckError> {
    for step in steps {
        sleep(step.delay()).await;
        output.push_line(step.message).await?;
    }
    Ok(output.logs().to_string())
}

//! Completion engine backed by an external program.
//!
//! The prompt, prefixed by the system prompt when one is set, is written to the
//! program's stdin and its stdout is taken as the completion. Any local model
//! runner or API wrapper that follows this convention can drive AI generation.

use advisor_core::traits::{CompletionEngine, CompletionOptions};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CommandCompletionEngine {
    program: String,
    args: Vec<String>,
}

impl CommandCompletionEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn compose_input(prompt: &str, options: &CompletionOptions) -> String {
        match options.system_prompt.as_deref() {
            Some(system) if !system.trim().is_empty() => format!("{}\n\n{}", system, prompt),
            _ => prompt.to_string(),
        }
    }
}

#[async_trait]
impl CompletionEngine for CommandCompletionEngine {
    async fn generate_completion(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        debug!("Running completion command '{}'", self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start completion command '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(Self::compose_input(prompt, options).as_bytes())
                .await
                .context("Failed to write prompt to completion command")?;
        }

        let output = child
            .wait_with_output()
            .await
            .context("Failed to read completion command output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Completion command '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }

        let completion = String::from_utf8(output.stdout)
            .context("Completion command produced invalid UTF-8")?;
        if completion.trim().is_empty() {
            return Err(anyhow!("Completion command '{}' produced no output", self.program));
        }
        Ok(completion)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_is_prepended() {
        let options = CompletionOptions {
            system_prompt: Some("Be brief".to_string()),
            ..CompletionOptions::default()
        };
        assert_eq!(
            CommandCompletionEngine::compose_input("Hello", &options),
            "Be brief\n\nHello"
        );
        assert_eq!(
            CommandCompletionEngine::compose_input("Hello", &CompletionOptions::default()),
            "Hello"
        );
    }
}

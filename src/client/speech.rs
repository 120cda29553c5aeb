// src/client/speech.rs
//! Text-to-speech through an external command (`say`, `espeak`, `piper ...`)

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::client::consumer::Speaker;

/// Runs `program args...` and writes the text to its stdin.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Splits a command line on whitespace. Quoting is not interpreted.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Speech command is empty"))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[rocket::async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        debug!("Speaking {} chars with {}", text.len(), self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start speech command: {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write to speech command")?;
        }

        let status = child.wait().await.context("Speech command did not finish")?;
        if !status.success() {
            anyhow::bail!("Speech command exited with {}", status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let speaker = CommandSpeaker::parse("espeak -s 160").unwrap();
        assert_eq!(speaker.program, "espeak");
        assert_eq!(speaker.args, vec!["-s", "160"]);

        assert!(CommandSpeaker::parse("   ").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let ok = CommandSpeaker::parse("cat").unwrap();
        assert!(ok.speak("hello").await.is_ok());

        let failing = CommandSpeaker::parse("false").unwrap();
        assert!(failing.speak("hello").await.is_err());
    }
}

//! Speech through the platform's command line synthesizer.

use std::io::{self, Write};
use std::process::{Child, Command, Output, Stdio};

use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::speech::SpeechEngine;

/// Upper bound on a single utterance
const MAX_TEXT_LEN: usize = 4_000;

const WINDOWS_SPEAK_SCRIPT: &str = "Add-Type -AssemblyName System.Speech; \
     (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak([Console]::In.ReadToEnd())";

/// Where the synthesizer expects the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput {
    /// Appended as the last argument
    Argument,
    /// Written to stdin, then stdin is closed
    Stdin,
}

/// Runs a synthesizer process per utterance and waits for it to exit, which
/// is when playback has finished.
#[derive(Debug, Clone)]
pub struct CommandSpeechEngine {
    program: String,
    args: Vec<String>,
    input: TextInput,
}

impl CommandSpeechEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, input: TextInput) -> Self {
        Self {
            program: program.into(),
            args,
            input,
        }
    }

    /// Pick the synthesizer for the current platform.
    pub fn detect() -> Result<Self, SpeechError> {
        let engine = if cfg!(target_os = "macos") {
            Self::new("say", Vec::new(), TextInput::Argument)
        } else if cfg!(target_os = "windows") {
            Self::new(
                "powershell",
                vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-Command".to_string(),
                    WINDOWS_SPEAK_SCRIPT.to_string(),
                ],
                TextInput::Stdin,
            )
        } else {
            let program = ["espeak-ng", "espeak"]
                .into_iter()
                .find(|program| is_installed(program))
                .ok_or_else(|| {
                    SpeechError::EngineUnavailable("neither espeak-ng nor espeak is installed".to_string())
                })?;
            Self::new(program, Vec::new(), TextInput::Argument)
        };

        info!("Using '{}' for speech", engine.program);
        Ok(engine)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let text = sanitize(text);
        if text.trim().is_empty() {
            return Err(SpeechError::Engine("Text cannot be empty".to_string()));
        }

        let mut command = Command::new(&self.program);
        command.args(&self.args).stdout(Stdio::null()).stderr(Stdio::piped());

        match self.input {
            TextInput::Argument => {
                command.arg(&text).stdin(Stdio::null());
            }
            TextInput::Stdin => {
                command.stdin(Stdio::piped());
            }
        }

        debug!("Speaking {} characters with {}", text.len(), self.program);
        let mut child = command.spawn()?;

        let fed = match (self.input, child.stdin.take()) {
            // dropping stdin closes it, which ends the input
            (TextInput::Stdin, Some(mut stdin)) => stdin.write_all(text.as_bytes()),
            _ => Ok(()),
        };

        let output = await_utterance(child, fed)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Engine(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Wait for a synthesizer process to finish speaking. When feeding its input
/// failed, the process is killed and reaped instead, so it can never keep
/// talking over the next utterance.
pub fn await_utterance(mut child: Child, fed: io::Result<()>) -> Result<Output, SpeechError> {
    if let Err(e) = fed {
        warn!("Feeding text to the synthesizer failed, stopping it: {}", e);
        let _ = child.kill();
        let _ = child.wait();
        return Err(SpeechError::Io(e));
    }
    Ok(child.wait_with_output()?)
}

/// Stand-in when no synthesizer is installed: every utterance fails, which
/// the speech worker logs and moves past.
#[derive(Debug, Clone)]
pub struct MissingSpeechEngine {
    reason: String,
}

impl MissingSpeechEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl SpeechEngine for MissingSpeechEngine {
    fn speak(&mut self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::EngineUnavailable(self.reason.clone()))
    }
}

/// Strip control characters and cap the length
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(MAX_TEXT_LEN)
        .collect()
}

fn is_installed(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

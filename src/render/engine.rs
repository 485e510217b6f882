//! Rendering engines
//!
//! Math typesetting and diagram layout are delegated to engines behind
//! these traits. An engine that is not configured is simply absent; the
//! adapters then report no pending work.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::presentation::DiagramTheme;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Typesets one TeX expression into markup (SVG or HTML)
#[async_trait]
pub trait MathEngine: Send + Sync {
    async fn typeset(&self, tex: &str, display: bool) -> Result<String, EngineError>;
}

/// Lays out one diagram source into SVG
#[async_trait]
pub trait DiagramEngine: Send + Sync {
    async fn render(&self, source: &str, theme: DiagramTheme) -> Result<String, EngineError>;
}

/// The loaded engines, one slot per kind of embedded content
#[derive(Clone, Default)]
pub struct Engines {
    pub math: Option<Arc<dyn MathEngine>>,
    pub flow: Option<Arc<dyn DiagramEngine>>,
    pub sequence: Option<Arc<dyn DiagramEngine>>,
}

impl std::fmt::Debug for Engines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engines")
            .field("math", &self.math.is_some())
            .field("flow", &self.flow.is_some())
            .field("sequence", &self.sequence.is_some())
            .finish()
    }
}

impl Engines {
    /// Engines backed by the external commands in the configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        let math = config
            .math_command
            .as_deref()
            .and_then(ProcessEngine::from_command)
            .map(|engine| Arc::new(engine) as Arc<dyn MathEngine>);
        let flow = config
            .flow_command
            .as_deref()
            .and_then(ProcessEngine::from_command)
            .map(|engine| Arc::new(engine) as Arc<dyn DiagramEngine>);
        let sequence = config
            .sequence_command
            .as_deref()
            .and_then(ProcessEngine::from_command)
            .map(|engine| Arc::new(engine) as Arc<dyn DiagramEngine>);

        let engines = Self {
            math,
            flow,
            sequence,
        };
        log::debug!("Configured engines: {:?}", engines);
        engines
    }
}

/// Engine implemented by an external program
///
/// The source is written to stdin and the rendered markup read from
/// stdout. A non-zero exit is a rejection of the source; its stderr
/// becomes the error message.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `["program", "arg", ...]`; `None` for an empty command
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.to_vec()))
    }

    async fn run(&self, input: &str, env: &[(&str, &str)]) -> Result<String, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(env.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Failed(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = input.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    log::debug!("Engine stdin closed early: {}", e);
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineError::Failed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(EngineError::Syntax(message));
        }

        let markup = String::from_utf8(output.stdout)
            .map_err(|_| EngineError::Failed(format!("{} produced invalid UTF-8", self.program)))?;
        if markup.trim().is_empty() {
            return Err(EngineError::Failed(format!("{} produced no output", self.program)));
        }
        Ok(markup)
    }
}

#[async_trait]
impl MathEngine for ProcessEngine {
    async fn typeset(&self, tex: &str, display: bool) -> Result<String, EngineError> {
        let display = if display { "1" } else { "0" };
        self.run(tex, &[("PRINTDOWN_MATH_DISPLAY", display)]).await
    }
}

#[async_trait]
impl DiagramEngine for ProcessEngine {
    async fn render(&self, source: &str, theme: DiagramTheme) -> Result<String, EngineError> {
        self.run(source, &[("PRINTDOWN_DIAGRAM_THEME", theme.as_str())])
            .await
    }
}

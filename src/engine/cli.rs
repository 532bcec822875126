use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::EngineType;
use crate::shutdown::ShutdownSignal;

use super::process::{
    kill_process_tree, resolve_cli_path, spawn_in_new_process_group, PROCESS_REGISTRY,
};
use super::{Engine, EngineError, EngineResult, GenerationRequest, EXIT_INTERRUPTED, EXIT_TIMEOUT};

/// Interval between "still waiting" log lines.
const WAIT_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Poll interval while a child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Engine that pipes the prompt to a command-line tool and reads stdout.
pub struct CliEngine {
    kind: EngineType,
    program: String,
    args: Vec<String>,
    /// Timeout in seconds (0 = no timeout).
    timeout_secs: u64,
    signal: ShutdownSignal,
}

impl CliEngine {
    /// Create an engine running `program args..` with the prompt on stdin.
    pub fn new<I, S>(kind: EngineType, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout_secs: 0,
            signal: ShutdownSignal::new(),
        }
    }

    /// Claude CLI in print mode.
    pub fn claude() -> Self {
        let program = resolve_cli_path("claude").unwrap_or_else(|| "claude".to_string());
        Self::new(EngineType::Claude, program, ["--print", "-p", "-"])
    }

    /// Codex CLI in exec mode.
    pub fn codex() -> Self {
        let program = resolve_cli_path("codex").unwrap_or_else(|| "codex".to_string());
        Self::new(EngineType::Codex, program, ["exec", "-"])
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Abort in-flight calls when `signal` fires.
    pub fn with_signal(mut self, signal: ShutdownSignal) -> Self {
        self.signal = signal;
        self
    }

    fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs > 0 {
            Some(Duration::from_secs(self.timeout_secs))
        } else {
            None
        }
    }

    fn run(&self, prompt: &str, label: &str) -> EngineResult {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match spawn_in_new_process_group(&mut cmd) {
            Ok(c) => c,
            Err(e) => {
                return EngineResult::failure(format!("failed to spawn {}: {}", self.program, e), 1)
            }
        };
        let pid = child.id();
        PROCESS_REGISTRY.register(pid);

        // Written from a thread so a tool that stops reading cannot stall the
        // timeout loop; dropping stdin afterwards signals EOF.
        if let Some(mut stdin) = child.stdin.take() {
            let prompt = prompt.to_string();
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                    debug!(pid, error = %e, "prompt write interrupted");
                }
            });
        }

        let stdout_handle = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = out.read_to_string(&mut buf);
                buf
            })
        });
        let stderr_handle = child.stderr.take().map(|mut err| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                buf
            })
        });
        let collect = |handle: Option<thread::JoinHandle<String>>| {
            handle.and_then(|h| h.join().ok()).unwrap_or_default()
        };

        let start = Instant::now();
        let timeout = self.timeout();
        let mut next_log = WAIT_LOG_INTERVAL;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    let elapsed = start.elapsed();

                    if self.signal.is_shutdown() {
                        kill_process_tree(pid);
                        let _ = child.wait();
                        PROCESS_REGISTRY.unregister(pid);
                        collect(stdout_handle);
                        collect(stderr_handle);
                        return EngineResult::failure("Shutdown requested", EXIT_INTERRUPTED);
                    }

                    if let Some(limit) = timeout {
                        if elapsed >= limit {
                            kill_process_tree(pid);
                            let _ = child.wait();
                            PROCESS_REGISTRY.unregister(pid);
                            collect(stdout_handle);
                            collect(stderr_handle);
                            return EngineResult::failure(
                                format!("{} timed out after {}s (pid {})", label, elapsed.as_secs(), pid),
                                EXIT_TIMEOUT,
                            );
                        }
                    }

                    if elapsed >= next_log {
                        debug!(pid, label, secs = elapsed.as_secs(), "still waiting for generation");
                        next_log += WAIT_LOG_INTERVAL;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.wait();
                    PROCESS_REGISTRY.unregister(pid);
                    return EngineResult::failure(format!("failed to wait for {}: {}", self.program, e), 1);
                }
            }
        };

        PROCESS_REGISTRY.unregister(pid);
        let stdout = collect(stdout_handle);
        let stderr = collect(stderr_handle);

        if status.success() {
            EngineResult::success(stdout)
        } else {
            let code = status.code().unwrap_or(1);
            let message = if stderr.trim().is_empty() {
                format!("{} exited with code {}", self.program, code)
            } else {
                stderr.trim().to_string()
            };
            EngineResult::failure(message, code)
        }
    }
}

impl Engine for CliEngine {
    fn generate(&self, request: &GenerationRequest) -> EngineResult {
        debug!(
            label = %request.label,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "sampling settings are left to the CLI"
        );
        let prompt = format!("{}\n\n{}", request.system_prompt.trim_end(), request.user_prompt);
        let result = self.run(&prompt, &request.label);
        if !result.success {
            warn!(
                label = %request.label,
                exit_code = result.exit_code,
                error = result.error.as_deref().unwrap_or(""),
                "generation call failed"
            );
        }
        result
    }

    fn probe(&self) -> Result<(), EngineError> {
        if Path::new(&self.program).is_file() || resolve_cli_path(&self.program).is_some() {
            Ok(())
        } else {
            Err(EngineError::Unavailable(format!(
                "'{}' not found on PATH",
                self.program
            )))
        }
    }

    fn engine_type(&self) -> EngineType {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(CliEngine::claude().engine_type(), EngineType::Claude);
        assert_eq!(CliEngine::codex().engine_type(), EngineType::Codex);
        assert_eq!(CliEngine::codex().with_timeout(30).timeout_secs, 30);
    }

    #[test]
    fn test_probe_missing_binary() {
        let engine = CliEngine::new(EngineType::Claude, "no-such-generation-cli-xyz", Vec::<String>::new());
        assert!(matches!(engine.probe(), Err(EngineError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_prompt_is_piped_on_stdin() {
        let engine = CliEngine::new(EngineType::Claude, "cat", Vec::<String>::new());
        assert!(engine.probe().is_ok());

        let result = engine.generate(&GenerationRequest::new("system text", "user text"));
        assert!(result.success, "unexpected failure: {:?}", result);
        assert_eq!(result.output, "system text\n\nuser text");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reports_stderr() {
        let engine = CliEngine::new(
            EngineType::Codex,
            "sh",
            ["-c", "cat >/dev/null; echo boom >&2; exit 3"],
        );
        let result = engine.generate(&GenerationRequest::new("s", "u"));
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let engine = CliEngine::new(EngineType::Claude, "sh", ["-c", "cat >/dev/null; sleep 10"])
            .with_timeout(1);
        let start = Instant::now();
        let result = engine.generate(&GenerationRequest::new("s", "u").with_label("chunk 1/1"));
        assert!(result.timed_out(), "unexpected result: {:?}", result);
        assert!(start.elapsed() < Duration::from_secs(8));
    }

    #[cfg(unix)]
    #[test]
    fn test_shutdown_signal_interrupts_call() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        let engine = CliEngine::new(EngineType::Claude, "sh", ["-c", "cat >/dev/null; sleep 10"])
            .with_signal(signal);
        let result = engine.generate(&GenerationRequest::new("s", "u"));
        assert!(!result.success);
        assert_eq!(result.exit_code, EXIT_INTERRUPTED);
        assert_eq!(result.error.as_deref(), Some("Shutdown requested"));
    }
}

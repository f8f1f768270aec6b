//! Render execution.
//!
//! Drives a scene through either an external ffmpeg-compatible command or a
//! simulated renderer. Both paths share one contract: progress ratios are
//! clamped to `[0, 1]` and strictly increasing, a successful run ends with
//! `1.0`, and cancellation always beats completion when the two race.

use super::ffmpeg::{self, ProgressParser};
use super::scene::SceneSpec;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// How a render ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The artifact was written.
    Completed {
        /// Path of the finished video.
        output: PathBuf,
    },
    /// The job was cancelled; the renderer was killed if it was running.
    Cancelled {
        /// What was being rendered, for the caller's cancellation message.
        subject: String,
    },
    /// The renderer could not produce the artifact.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl RenderOutcome {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Renderer backing a [`RenderPipeline`].
#[derive(Debug, Clone)]
pub enum RendererKind {
    /// Spawn an external command that accepts ffmpeg arguments.
    Command(String),
    /// Sleep through the timeline and write a placeholder artifact.
    Simulated {
        /// Number of progress steps to report.
        steps: u32,
        /// Pause between steps.
        step_delay: Duration,
    },
}

/// Executes recap renders.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    renderer: RendererKind,
}

impl RenderPipeline {
    /// Creates a pipeline over the given renderer.
    #[must_use]
    pub const fn new(renderer: RendererKind) -> Self {
        Self { renderer }
    }

    /// Returns the configured renderer.
    #[must_use]
    pub const fn renderer(&self) -> &RendererKind {
        &self.renderer
    }

    /// Renders a scene to `output`.
    ///
    /// A token cancelled before the call spawns nothing and returns
    /// `Cancelled` immediately. During a run, cancellation kills the
    /// renderer at once instead of draining it, and a cancellation that
    /// arrives while the process is exiting still wins the outcome. The
    /// cancelled outcome names the year it was rendering. `on_progress`
    /// fires for each new ratio.
    pub async fn render<F>(
        &self,
        scene: &SceneSpec,
        output: &Path,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> RenderOutcome
    where
        F: Fn(f64) + Send,
    {
        if cancel.is_cancelled() {
            tracing::debug!(year = scene.year, "render cancelled before start");
            metrics::counter!("render_outcomes_total", "outcome" => "cancelled").increment(1);
            return RenderOutcome::Cancelled {
                subject: recap_subject(scene),
            };
        }

        let started = std::time::Instant::now();
        let outcome = match &self.renderer {
            RendererKind::Command(program) => {
                Self::render_command(program, scene, output, cancel, &on_progress).await
            }
            RendererKind::Simulated { steps, step_delay } => {
                Self::render_simulated(*steps, *step_delay, scene, output, cancel, &on_progress)
                    .await
            }
        };

        tracing::info!(
            year = scene.year,
            cards = scene.card_count(),
            outcome = outcome.label(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "render finished"
        );
        metrics::counter!("render_outcomes_total", "outcome" => outcome.label()).increment(1);
        metrics::histogram!("render_duration_seconds").record(started.elapsed().as_secs_f64());
        outcome
    }

    async fn render_command<F>(
        program: &str,
        scene: &SceneSpec,
        output: &Path,
        cancel: &CancellationToken,
        on_progress: &F,
    ) -> RenderOutcome
    where
        F: Fn(f64) + Send,
    {
        if let Err(reason) = ensure_parent_dir(output).await {
            return RenderOutcome::Failed { reason };
        }

        let args = ffmpeg::recap_args(scene, output);
        let mut child = match Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return RenderOutcome::Failed {
                    reason: format!("spawn {program}: {e}"),
                };
            }
        };

        let Some(stdout) = child.stdout.take() else {
            kill_child(child).await;
            return RenderOutcome::Failed {
                reason: "renderer stdout unavailable".to_string(),
            };
        };
        let mut lines = BufReader::new(stdout).lines();
        let mut parser = ProgressParser::new(scene.duration_secs());

        // Drain the progress stream until the renderer closes stdout.
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    kill_child(child).await;
                    return RenderOutcome::Cancelled {
                        subject: recap_subject(scene),
                    };
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if let Some(ratio) = parser.feed_line(&line) {
                                on_progress(ratio);
                            }
                        }
                        Ok(None) | Err(_) => break,
                    }
                }
            }
        }

        let status = tokio::select! {
            () = cancel.cancelled() => {
                kill_child(child).await;
                return RenderOutcome::Cancelled {
                    subject: recap_subject(scene),
                };
            }
            status = child.wait() => status,
        };

        // The process may have exited in the same instant the token fired;
        // the cancellation still decides the outcome.
        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled {
                subject: recap_subject(scene),
            };
        }

        match status {
            Ok(status) if status.success() => {
                if let Some(ratio) = parser.finish() {
                    on_progress(ratio);
                }
                RenderOutcome::Completed {
                    output: output.to_path_buf(),
                }
            }
            Ok(status) => RenderOutcome::Failed {
                reason: status.code().map_or_else(
                    || "renderer killed by signal".to_string(),
                    |code| format!("renderer exited with status {code}"),
                ),
            },
            Err(e) => RenderOutcome::Failed {
                reason: format!("wait for renderer: {e}"),
            },
        }
    }

    async fn render_simulated<F>(
        steps: u32,
        step_delay: Duration,
        scene: &SceneSpec,
        output: &Path,
        cancel: &CancellationToken,
        on_progress: &F,
    ) -> RenderOutcome
    where
        F: Fn(f64) + Send,
    {
        let steps = steps.max(1);
        for step in 1..=steps {
            tokio::select! {
                () = cancel.cancelled() => {
                    return RenderOutcome::Cancelled {
                        subject: recap_subject(scene),
                    };
                }
                () = tokio::time::sleep(step_delay) => {}
            }
            on_progress((f64::from(step) / f64::from(steps)).clamp(0.0, 1.0));
        }
        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled {
                subject: recap_subject(scene),
            };
        }

        if let Err(reason) = ensure_parent_dir(output).await {
            return RenderOutcome::Failed { reason };
        }
        let placeholder = format!(
            "daybook simulated recap for {} ({} cards)\n",
            scene.year,
            scene.card_count()
        );
        match tokio::fs::write(output, placeholder).await {
            Ok(()) => RenderOutcome::Completed {
                output: output.to_path_buf(),
            },
            Err(e) => RenderOutcome::Failed {
                reason: format!("write {}: {e}", output.display()),
            },
        }
    }
}

/// Returns a fresh artifact filename for a year's recap.
///
/// Names are unique per render so a finished artifact always shows up as an
/// addition in the media directory.
#[must_use]
pub fn artifact_name(year: i32) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("recap-{year}-{}.mp4", &id[..8])
}

/// What a cancelled render was working on, for user-facing messages.
fn recap_subject(scene: &SceneSpec) -> String {
    format!("{} recap", scene.year)
}

async fn ensure_parent_dir(output: &Path) -> std::result::Result<(), String> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

async fn kill_child(mut child: Child) {
    if let Err(e) = child.start_kill() {
        tracing::warn!(error = %e, "failed to kill renderer");
    }
    if let Err(e) = child.wait().await {
        tracing::debug!(error = %e, "renderer wait after kill failed");
    }
}

//! 语音播报
//!
//! 每次播报前先结束上一段仍在进行的播报，并等它的子进程退出，再启动新的朗读进程，
//! 两段朗读不会重叠。播报进程在后台任务里等待，取消令牌触发时 kill。

use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SpeechSection;

/// 去掉 Markdown 符号，只保留可读文本
pub fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_start();
        if line.starts_with("```") {
            continue;
        }
        let line = line.trim_start_matches(['#', '>']).trim_start();
        let line = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .unwrap_or(line);
        let cleaned: String = line
            .chars()
            .filter(|c| !matches!(c, '*' | '_' | '`' | '#' | '|' | '~'))
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(cleaned);
    }
    out
}

/// 平台对应的朗读命令（程序, 参数）
pub fn speech_command(
    os: &str,
    voice: Option<&str>,
    rate: Option<u32>,
    text: &str,
) -> (&'static str, Vec<String>) {
    let mut args = Vec::new();
    if os == "macos" {
        if let Some(v) = voice {
            args.extend(["-v".to_string(), v.to_string()]);
        }
        if let Some(r) = rate {
            args.extend(["-r".to_string(), r.to_string()]);
        }
        args.push(text.to_string());
        ("say", args)
    } else {
        if let Some(v) = voice {
            args.extend(["-v".to_string(), v.to_string()]);
        }
        if let Some(r) = rate {
            args.extend(["-s".to_string(), r.to_string()]);
        }
        args.push(text.to_string());
        ("espeak", args)
    }
}

/// 一段进行中的播报：取消令牌 + 等待子进程的后台任务
struct Playback {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Playback {
    /// 结束播报并等待子进程退出；返回是否确实打断了正在进行的播报
    async fn terminate(self) -> bool {
        let was_running = !self.task.is_finished();
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::debug!(error = %e, "speech playback task failed");
        }
        was_running
    }
}

pub struct SpeechPlayer {
    enabled: bool,
    voice: Option<String>,
    rate: Option<u32>,
    current: Mutex<Option<Playback>>,
}

impl SpeechPlayer {
    pub fn new(cfg: &SpeechSection) -> Self {
        Self {
            enabled: cfg.enabled,
            voice: cfg.voice.clone().filter(|v| !v.trim().is_empty()),
            rate: cfg.rate,
            current: Mutex::new(None),
        }
    }

    pub fn disabled() -> Self {
        Self::new(&SpeechSection::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn is_playing(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| !p.task.is_finished())
    }

    /// 结束正在进行的播报，等子进程退出后才返回
    pub async fn stop(&self) -> bool {
        let previous = self.current.lock().await.take();
        match previous {
            Some(playback) => playback.terminate().await,
            None => false,
        }
    }

    /// 朗读文本：上一段播报结束后才启动新的子进程
    pub async fn speak(&self, text: &str) {
        if !self.enabled {
            return;
        }
        let text = strip_markdown(text);
        if text.is_empty() {
            self.stop().await;
            return;
        }
        let (program, args) =
            speech_command(std::env::consts::OS, self.voice.as_deref(), self.rate, &text);
        self.play(program, &args).await;
    }

    async fn play(&self, program: &str, args: &[String]) {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.terminate().await;
        }

        let mut child = match Command::new(program).args(args).kill_on_drop(true).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program, error = %e, "speech playback failed to start");
                return;
            }
        };
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    if let Err(e) = status {
                        tracing::debug!(error = %e, "speech playback wait failed");
                    }
                }
                _ = cancelled.cancelled() => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!(error = %e, "speech playback kill failed");
                    }
                }
            }
        });
        *current = Some(Playback { token, task });
    }
}

impl Drop for SpeechPlayer {
    fn drop(&mut self) {
        if let Some(playback) = self.current.get_mut().take() {
            playback.token.cancel();
        }
    }
}

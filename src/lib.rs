use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub mod assembler;
pub mod config;
pub mod error;
pub mod executor;
pub mod ffmpeg;
pub mod init;
pub mod paths;
pub mod request;
pub mod script;
pub mod srt;
pub mod toolkit;

pub use assembler::Assembler;
pub use config::Config;
pub use error::AssemblyError;
pub use request::AssemblyRequest;

pub type AssemblyLogHook = Arc<Mutex<dyn Fn(&str) + Send + Sync + 'static>>;

static LOG_HOOK: Lazy<Mutex<Option<AssemblyLogHook>>> = Lazy::new(|| Mutex::new(None));

/// Installs a callback that receives every tagged pipeline line, or removes it with `None`.
pub fn set_log_hook(hook: Option<AssemblyLogHook>) {
    if let Ok(mut guard) = LOG_HOOK.lock() {
        *guard = hook;
    }
}

pub(crate) fn logv(tag: &str, message: &str) {
    match tag {
        "WARN" => tracing::warn!("{}", message),
        _ => tracing::info!("{}", message),
    }

    if let Ok(guard) = LOG_HOOK.lock() {
        if let Some(hook) = guard.as_ref() {
            if let Ok(callback) = hook.lock() {
                let line = format!("[{}] {}", tag, message);
                callback(&line);
            }
        }
    }
}

pub(crate) fn logi(message: impl AsRef<str>) {
    logv("INFO", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    logv("OK", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    logv("WARN", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_hook_receives_tagged_lines() {
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let hook: AssemblyLogHook = Arc::new(Mutex::new(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        }));

        set_log_hook(Some(hook));
        logw("probe degraded");
        logok("encode finished");
        set_log_hook(None);
        logi("not captured");

        let captured = lines.lock().unwrap();
        assert!(captured.contains(&"[WARN] probe degraded".to_string()));
        assert!(captured.contains(&"[OK] encode finished".to_string()));
        assert!(!captured.iter().any(|l| l.contains("not captured")));
    }
}

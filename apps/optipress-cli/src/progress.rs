//! Indeterminate progress indicator
//!
//! The upload has no meaningful progress to report, so the spinner only
//! shows that work is happening and says so in its label.

use std::{
    io::{IsTerminal, Write},
    time::Duration,
};
use tokio::task::JoinHandle;

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
const TICK: Duration = Duration::from_millis(120);

pub struct Spinner {
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning on stderr, or do nothing when stderr is not a terminal
    pub fn start(label: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self { handle: None };
        }

        let line = format!("{} (in progress, duration unknown)", label);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            for frame in FRAMES.iter().cycle() {
                interval.tick().await;
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\r{} {}", frame, line);
                let _ = stderr.flush();
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear its line
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ABOUTME: User-facing CLI output, separate from tracing logs.
// ABOUTME: Normal mode prints progress, quiet mode only results, json mode one event per line.

use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Progress lines plus results.
    Normal,
    /// Results and errors only, for CI logs.
    Quiet,
    /// One JSON object per line.
    Json,
}

pub struct Output {
    mode: OutputMode,
    started: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing; the final success line reports the elapsed time.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started
            .map_or(0.0, |t| t.elapsed().as_secs_f64())
    }

    /// Step-by-step progress. Normal mode only.
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Command data such as listings. Suppressed in json mode.
    pub fn data(&self, line: &str) {
        if self.mode != OutputMode::Json {
            println!("{line}");
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal if self.started.is_some() => {
                println!("{message} ({:.1}s)", self.elapsed_secs());
            }
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => println!("{}", self.event("success", message)),
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => eprintln!("{}", self.event("warning", message)),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => eprintln!("{}", self.event("error", message)),
        }
    }

    fn event(&self, event: &str, message: &str) -> String {
        let event = Event {
            event,
            message,
            duration_secs: self.started.map(|_| self.elapsed_secs()),
        };
        serde_json::to_string(&event).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct Event<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_zero_before_timer_starts() {
        let output = Output::new(OutputMode::Quiet);
        assert_eq!(output.elapsed_secs(), 0.0);
        assert_eq!(output.mode(), OutputMode::Quiet);
    }

    #[test]
    fn json_event_omits_duration_without_timer() {
        let output = Output::new(OutputMode::Json);
        assert_eq!(
            output.event("warning", "lock remains"),
            r#"{"event":"warning","message":"lock remains"}"#
        );
    }

    #[test]
    fn json_event_reports_duration_once_timed() {
        let mut output = Output::new(OutputMode::Json);
        output.start_timer();
        let json: serde_json::Value =
            serde_json::from_str(&output.event("success", "done")).unwrap();
        assert!(json["duration_secs"].is_number());
    }
}

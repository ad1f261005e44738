use crate::report::progress::{ProgressEvent, ProgressSink};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Format a single progress line for display.
#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Scoring row {}/{}...", done, total)
}

pub fn emit_progress_line(line: &str) {
    eprintln!("{}", line);
}

/// Minimum interval between progress updates.
const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

/// Large inputs emit at most every tenth of the rows.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

struct ThrottleState {
    last_emit: Option<Instant>,
}

/// Throttled sink printing to stderr. Always emits the first and the final row.
pub fn default_progress_sink() -> ProgressSink {
    let state = Arc::new(Mutex::new(ThrottleState { last_emit: None }));
    Arc::new(move |ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        let now = Instant::now();
        let step = progress_step(ev.total);
        let should_emit = match state.lock() {
            Ok(mut g) => {
                let emit_edge = ev.done == ev.total || ev.done == 1;
                let emit_step = ev.done % step == 0;
                let interval_ok = g
                    .last_emit
                    .map(|t| {
                        now.saturating_duration_since(t)
                            >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
                    })
                    .unwrap_or(true);
                let ok = emit_edge || (emit_step && interval_ok);
                if ok {
                    g.last_emit = Some(now);
                }
                ok
            }
            Err(_) => true,
        };
        if should_emit {
            emit_progress_line(&format_progress_line(ev.done, ev.total));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_format() {
        assert_eq!(format_progress_line(3, 12), "Scoring row 3/12...");
    }

    #[test]
    fn step_scales_with_total() {
        assert_eq!(progress_step(1), 1);
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(11), 1);
        assert_eq!(progress_step(250), 25);
    }

    #[test]
    fn sink_accepts_events() {
        let sink = default_progress_sink();
        sink(ProgressEvent { done: 0, total: 0 });
        sink(ProgressEvent { done: 1, total: 2 });
        sink(ProgressEvent { done: 2, total: 2 });
    }
}

pub mod console;
pub mod progress;

pub use console::{default_progress_sink, format_progress_line};
pub use progress::{ProgressEvent, ProgressSink};

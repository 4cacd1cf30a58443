//! Operator-facing output: section banners and download progress bars.

use std::sync::{Arc, Mutex};

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use segmux_engine::{ProgressEvent, ProgressHandler};

const BAR_TEMPLATE: &str = "> {msg} Downloaded {bytes} of {total_bytes} ({percent}%) [{bar:30}] {eta}";

/// Print a boxed section title.
pub fn section(title: &str) {
    println!();
    println!("====================================");
    println!("{title}");
    println!("====================================");
}

/// Renders pipeline progress as one bar per track.
#[derive(Clone)]
pub struct ConsoleProgress {
    hidden: bool,
    current: Arc<Mutex<Option<ProgressBar>>>,
}

impl ConsoleProgress {
    pub fn new(hidden: bool) -> Self {
        Self {
            hidden,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handler(&self) -> ProgressHandler {
        let this = self.clone();
        Arc::new(move |event| this.on_event(event))
    }

    fn on_event(&self, event: ProgressEvent) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        match event {
            ProgressEvent::TrackStarted {
                track,
                segments,
                total,
            } => {
                let bar = self.new_bar(total);
                bar.set_message(format!("{track} ({segments} segments)"));
                if let Some(previous) = current.replace(bar) {
                    previous.finish_and_clear();
                }
            }
            ProgressEvent::Bytes {
                downloaded, total, ..
            } => {
                if let Some(bar) = current.as_ref() {
                    bar.set_length(total);
                    bar.set_position(downloaded);
                }
            }
            ProgressEvent::TrackFinished { track } => {
                if let Some(bar) = current.take() {
                    let total = bar.length().unwrap_or(0);
                    bar.finish_with_message(format!("{track} done, {}", HumanBytes(total)));
                }
            }
            ProgressEvent::TrackFailed { .. } => {
                if let Some(bar) = current.take() {
                    bar.finish_and_clear();
                }
            }
            ProgressEvent::Muxing { output } => {
                if !self.hidden {
                    println!("> Merging audio and video into {}", output.display());
                }
            }
        }
    }

    fn new_bar(&self, total: u64) -> ProgressBar {
        let bar = ProgressBar::with_draw_target(Some(total), self.draw_target());
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        }
    }
}

use crate::output::is_quiet;
use indicatif::ProgressBar;
use std::time::Duration;

/// Spinner for the slow phases (discovery, writing artifacts). Hidden when
/// stdout is not a terminal or quiet mode is on.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if is_quiet() || !console::Term::stdout().is_term() {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}

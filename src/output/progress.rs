use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_red, bright_yellow};

/// Spinner shown on stderr while a request is in flight.
pub struct RequestProgress {
    pb: ProgressBar,
    message: String,
}

impl RequestProgress {
    pub fn start(message: impl Into<String>) -> Self {
        let message = message.into();
        let pb = create_spinner(bright_yellow(&message).to_string());
        Self { pb, message }
    }

    pub fn finish(self) {
        self.pb
            .finish_with_message(bright_green(format!("{} ✓", self.message)).to_string());
    }

    pub fn fail(self) {
        self.pb
            .finish_with_message(bright_red(format!("{} ✗", self.message)).to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    // Static template, parsing cannot fail
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

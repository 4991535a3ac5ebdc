use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress for a report run: listing repositories, fetching repository
/// data, computing metrics.
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1(org: &str) -> Self {
        print_phases_header();
        let pb = create_spinner(
            bright_yellow(format!("Phase 1/3: Listing repositories of {org}")).to_string(),
        );
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, repositories: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Listed {repositories} repositories ✓")).to_string(),
        );
        let pb = create_counter(
            repositories as u64,
            bright_yellow("Phase 2/3: Fetching repository data").to_string(),
        );
        Self { pb }
    }

    /// Advances the phase 2 counter by one repository.
    pub fn fetched(&self, repository: &str) {
        self.pb.inc(1);
        self.pb.set_message(
            bright_yellow(format!("Phase 2/3: Fetched {repository}")).to_string(),
        );
    }

    pub fn finish_phase_2(self) {
        self.pb.finish_with_message(
            bright_green("Phase 2/3: Fetched data for all repositories ✓").to_string(),
        );
        eprintln!();
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb.finish_with_message(
            bright_green("Phase 2/3: Fetched data for all repositories ✓").to_string(),
        );
        Self::phase_3()
    }

    /// Starts directly at phase 3 when snapshots come from a file.
    pub fn start_phase_3() -> Self {
        print_phases_header();
        Self::phase_3()
    }

    fn phase_3() -> Self {
        let pb = create_spinner(bright_yellow("Phase 3/3: Computing metrics").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self) {
        self.pb
            .finish_with_message(bright_green("Phase 3/3: Metrics computed ✓").to_string());
        eprintln!();
    }
}

fn print_phases_header() {
    eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn create_counter(len: u64, message: String) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("  {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message(message);
    pb
}

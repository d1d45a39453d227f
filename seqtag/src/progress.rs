use std::io::{stderr, Write};

// Number of updates between two redraws.
const REDRAW_INTERVAL: u64 = 10000;

/// Progress reporter drawn on stderr.
///
/// Drawing only happens when `info` logging is enabled, so library users without a logger
/// installed see nothing. The reporter never affects the operation it observes.
pub struct Progress {
    label: &'static str,
    total: u64,
    current: u64,
    enabled: bool,
}

impl Progress {
    pub fn new(label: &'static str, total: u64) -> Self {
        Self {
            label,
            total,
            current: 0,
            enabled: log::log_enabled!(log::Level::Info),
        }
    }

    pub fn update(&mut self, current: u64) {
        self.current = current;
        if self.enabled && current % REDRAW_INTERVAL == 0 {
            eprint!("{}{}/{}\r", self.label, current, self.total);
            stderr().flush().ok();
        }
    }

    pub fn finish(&self) {
        if self.enabled {
            eprintln!("{}{}/{}", self.label, self.current, self.total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracks_count() {
        let mut progress = Progress::new(" > Test: ", 3);
        progress.update(1);
        progress.update(3);
        progress.finish();

        assert_eq!(3, progress.current);
    }
}

/// Persisted progress: current level, current score, best score.
///
/// ## File format:
///   Key-value lines (`CurrentScore=` / `CurrentLevel=` / `BestScore=`),
///   all defaulting to 0 when absent.
///
/// Loaded at startup and re-read on every reset. Every mutation flushes
/// synchronously — a crash loses at most the in-flight frame's state.
/// A failed write keeps the in-memory value and logs; gameplay continues
/// on last known values.

use std::path::PathBuf;

use log::warn;

pub struct ProgressTracker {
    path: PathBuf,
    current_level: usize,
    current_score: u32,
    best_score: u32,
}

impl ProgressTracker {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut tracker = ProgressTracker {
            path: path.into(),
            current_level: 0,
            current_score: 0,
            best_score: 0,
        };
        tracker.reload();
        tracker
    }

    /// Re-read persisted values. On read failure the in-memory values stand.
    pub fn reload(&mut self) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // First run: defaults.
                self.current_level = 0;
                self.current_score = 0;
                self.best_score = 0;
                return;
            }
            Err(e) => {
                warn!("progress read failed ({}): {e}; keeping in-memory values",
                      self.path.display());
                return;
            }
        };

        for line in content.lines() {
            if let Some(val) = line.strip_prefix("CurrentScore=") {
                self.current_score = val.trim().parse().unwrap_or(0);
            } else if let Some(val) = line.strip_prefix("CurrentLevel=") {
                self.current_level = val.trim().parse().unwrap_or(0);
            } else if let Some(val) = line.strip_prefix("BestScore=") {
                self.best_score = val.trim().parse().unwrap_or(0);
            }
        }
    }

    // ── Accessors ──

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn current_score(&self) -> u32 {
        self.current_score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    // ── Mutations (write-through) ──

    pub fn set_current_level(&mut self, level: usize) {
        self.current_level = level;
        self.flush();
    }

    pub fn set_current_score(&mut self, score: u32) {
        self.current_score = score;
        self.flush();
    }

    /// Raise the best score to the current score if it exceeds it.
    /// Best score is monotonically non-decreasing.
    pub fn settle_best(&mut self) {
        if self.current_score > self.best_score {
            self.best_score = self.current_score;
            self.flush();
        }
    }

    fn flush(&self) {
        let content = format!(
            "CurrentScore={}\nCurrentLevel={}\nBestScore={}\n",
            self.current_score, self.current_level, self.best_score,
        );
        if let Err(e) = std::fs::write(&self.path, content) {
            warn!("progress write failed ({}): {e}; continuing on in-memory values",
                  self.path.display());
        }
    }
}

use indicatif::{ProgressBar, ProgressStyle};

/// Optional per-file progress bar; a no-op when disabled
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Progress bar over `total` files, or a hidden one when `enabled` is false
    #[must_use]
    pub fn bar(total: u64, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{wide_bar:.cyan/blue} {pos}/{len} xml [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    /// Advance by one file
    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Clear the bar from the terminal
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

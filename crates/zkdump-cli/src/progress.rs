//! Progress bar for imports

use indicatif::{ProgressBar, ProgressStyle};

use zkdump_core::tree::ImportProgress;

/// Import progress shown as a terminal bar
///
/// Each processed node advances the bar by one and becomes its message.
pub struct ImportBar {
    bar: ProgressBar,
}

impl ImportBar {
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            bar.set_style(style);
        }
        Self { bar }
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ImportProgress for ImportBar {
    fn node_processed(&self, status: &str) {
        self.bar.set_message(status.to_string());
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_counts_nodes() {
        let bar = ImportBar::new(3, false);
        bar.node_processed("created /a");
        bar.node_processed("created /a/b");
        assert_eq!(bar.bar.position(), 2);
        bar.finish("done");
        assert!(bar.bar.is_finished());
    }
}

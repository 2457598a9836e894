//! Progress bar over processed titles.

use std::sync::Arc;

use citefetch_core::{TitleCallback, TitleOutcome};
use indicatif::{ProgressBar, ProgressStyle};

/// The bar is only drawn for an interactive, non-quiet stderr.
pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool) -> bool {
    stderr_is_terminal && !quiet
}

/// Creates a bar of `total` titles and the callback that advances it.
pub(crate) fn title_progress(total: usize) -> (ProgressBar, TitleCallback) {
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} titles ({elapsed}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let handle = bar.clone();
    let callback: TitleCallback = Arc::new(move |title: &str, outcome: &TitleOutcome| {
        handle.set_message(short_label(title, outcome));
        handle.inc(1);
    });
    (bar, callback)
}

fn short_label(title: &str, outcome: &TitleOutcome) -> String {
    let status = match outcome {
        TitleOutcome::Stored(_) => "stored",
        TitleOutcome::AlreadyPresent(_) => "exists",
        TitleOutcome::FailureLogged(_) => "failed",
    };
    let mut label: String = title.chars().take(48).collect();
    if title.chars().count() > 48 {
        label.push('…');
    }
    format!("[{status}] {label}")
}

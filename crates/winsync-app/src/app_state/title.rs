//! Window title management: reflects this window's place in the roster.

use super::core::SyncApp;

// =============================================================================
// WINDOW TITLE
// =============================================================================

impl SyncApp {
    /// Update the window title with the roster position.
    ///
    /// Format: "{title} [{position}/{count}]"
    pub(super) fn update_window_title(&self) {
        let Some(ref window) = self.window else {
            return;
        };

        let position = self
            .coordinator
            .as_ref()
            .and_then(|c| c.own_index().map(|i| (i, c.windows().len())));
        window.set_title(&window_title(&self.config.window.title, position));
    }
}

pub(super) fn window_title(base: &str, position: Option<(usize, usize)>) -> String {
    match position {
        Some((index, count)) => format!("{base} [{}/{count}]", index + 1),
        None => format!("{base} [connecting]"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

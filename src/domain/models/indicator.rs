#[cfg(test)]
#[path = "indicator_test.rs"]
mod tests;

/// Presentational feedback flags. The two flags never gate each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndicatorState {
    pub user_typing: bool,
    pub assistant_loading: bool,
}

impl IndicatorState {
    pub fn on_user_input_changed(&mut self, text: &str) {
        self.user_typing = !text.is_empty();
    }

    pub fn on_submit(&mut self) {
        self.user_typing = false;
        self.assistant_loading = true;
    }

    pub fn on_settle(&mut self) {
        self.assistant_loading = false;
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

/// Chat enablement state for one client session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub model_id: String,
    pub target_url: String,
    pub enabled: bool,
}

impl Session {
    /// Names of the session fields that still block `start`. The credential is
    /// tracked by the controller and checked separately.
    pub fn missing_fields(&self, require_target_url: bool) -> Vec<&'static str> {
        let mut missing = vec![];
        if self.model_id.trim().is_empty() {
            missing.push("model");
        }
        if require_target_url && self.target_url.trim().is_empty() {
            missing.push("target url");
        }

        return missing;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    Uninitialized,
    AwaitingCredential,
    Idle,
    Busy,
}

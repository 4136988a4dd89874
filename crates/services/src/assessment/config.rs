use std::env;
use std::time::Duration;

/// Quiet period after the last answer before in-progress answers are saved.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub autosave_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
        }
    }
}

impl SessionConfig {
    /// Reads `ASSESS_AUTOSAVE_MS`, falling back to the default for missing or
    /// unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let autosave_delay = env::var("ASSESS_AUTOSAVE_MS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(DEFAULT_AUTOSAVE_DELAY, Duration::from_millis);
        Self { autosave_delay }
    }

    #[must_use]
    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_debounce_is_one_second() {
        assert_eq!(SessionConfig::default().autosave_delay, Duration::from_secs(1));
        let custom = SessionConfig::default().with_autosave_delay(Duration::from_millis(50));
        assert_eq!(custom.autosave_delay, Duration::from_millis(50));
    }
}

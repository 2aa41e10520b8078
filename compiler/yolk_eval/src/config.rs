//! Interpreter configuration.

/// Environment variable overriding [`EvalConfig::max_call_depth`].
///
/// A number sets the limit; `none` or `0` removes it.
pub const MAX_CALL_DEPTH_VAR: &str = "YOLK_MAX_CALL_DEPTH";

const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Knobs for one interpreter and every task it spawns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum nesting of user function calls. `None` is unlimited.
    pub max_call_depth: Option<usize>,
    /// Spawned tasks are named `<prefix><n>`.
    pub task_name_prefix: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
            task_name_prefix: "yolk-task-".to_string(),
        }
    }
}

impl EvalConfig {
    /// Defaults, overridden from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_CALL_DEPTH_VAR) {
            match parse_depth(&raw) {
                Some(depth) => config.max_call_depth = depth,
                None => tracing::warn!(
                    var = MAX_CALL_DEPTH_VAR,
                    value = %raw,
                    "ignoring invalid call depth limit"
                ),
            }
        }
        config
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }
}

/// `Some(None)` for "unlimited", `None` for garbage.
fn parse_depth(raw: &str) -> Option<Option<usize>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("unlimited") {
        return Some(None);
    }
    match raw.parse::<usize>() {
        Ok(0) => Some(None),
        Ok(n) => Some(Some(n)),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_depth() {
        assert_eq!(parse_depth("250"), Some(Some(250)));
        assert_eq!(parse_depth(" none "), Some(None));
        assert_eq!(parse_depth("0"), Some(None));
        assert_eq!(parse_depth("deep"), None);
    }

    #[test]
    fn test_default_is_bounded() {
        let config = EvalConfig::default();
        assert_eq!(config.max_call_depth, Some(DEFAULT_MAX_CALL_DEPTH));
        assert_eq!(config.task_name_prefix, "yolk-task-");
    }
}

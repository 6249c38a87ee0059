//! Process-wide knobs read from the environment once.

use once_cell::sync::OnceCell;

pub const ENV_DEFER_ALL: &str = "EFL_NATIVE_DEFER_ALL";
pub const ENV_DEFER_WARN: &str = "EFL_NATIVE_DEFER_WARN";
pub const ENV_LOG: &str = "EFL_NATIVE_LOG";

const DEFAULT_DEFER_WARN: u32 = 4096;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Queue finalizer frees even when dropped on the main loop thread.
    pub defer_all: bool,
    /// Deferred queue length that triggers a warning.
    pub defer_warn: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            defer_all: false,
            defer_warn: DEFAULT_DEFER_WARN,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn parse_u32_nonzero(v: &str) -> Option<u32> {
    v.trim().parse::<u32>().ok().filter(|&v| v != 0)
}

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

pub(crate) fn env_u32_nonzero(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u32_nonzero(&v))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Config {
        let defaults = Config::default();
        let log_filter = std::env::var(ENV_LOG)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.log_filter);
        Config {
            defer_all: env_bool(ENV_DEFER_ALL, defaults.defer_all),
            defer_warn: env_u32_nonzero(ENV_DEFER_WARN, defaults.defer_warn),
            log_filter,
        }
    }
}

pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

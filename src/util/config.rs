use std::sync::OnceLock;
use std::time::Duration;

const CONFIG_PATH: &str = "bitmapcache.cfg";
const CONFIG_ENV: &str = "BITMAPCACHE_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub fade_enabled: bool,
    pub fade_duration_ms: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { fade_enabled: true, fade_duration_ms: 200 }
    }
}

impl SurfaceConfig {
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.fade_duration_ms))
    }
}

static CONFIG: OnceLock<SurfaceConfig> = OnceLock::new();

pub fn surface_config() -> &'static SurfaceConfig {
    CONFIG.get_or_init(read_config)
}

fn read_config() -> SurfaceConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
    match std::fs::read_to_string(&path) {
        Ok(text) => parse_config(&text),
        Err(_) => SurfaceConfig::default(),
    }
}

/// Parse `key = value` lines. Unknown keys and bad values keep defaults.
pub fn parse_config(text: &str) -> SurfaceConfig {
    let mut cfg = SurfaceConfig::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        if key.eq_ignore_ascii_case("fade_enabled") {
            cfg.fade_enabled = parse_bool(value);
        }
        if key.eq_ignore_ascii_case("fade_duration_ms") {
            match value.parse::<u32>() {
                Ok(ms) => cfg.fade_duration_ms = ms,
                Err(_) => log::warn!("ignoring fade_duration_ms={value:?}"),
            }
        }
    }

    cfg
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value,
        "1" | "true" | "TRUE" | "on" | "ON" | "yes" | "YES"
    )
}

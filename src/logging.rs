use tracing::Level;

pub const LOG_LEVEL_VAR: &str = "FLEET_CALENDAR_LOG";

/// Installs a stderr `fmt` subscriber. The level comes from
/// `FLEET_CALENDAR_LOG` (`error`, `warn`, `info`, `debug`, `trace`) and falls
/// back to `default_level`. Calling this twice is harmless.
pub fn init(default_level: Level) {
    let level = parse_level(std::env::var(LOG_LEVEL_VAR).ok().as_deref()).unwrap_or(default_level);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_level(raw: Option<&str>) -> Option<Level> {
    raw.and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels_only() {
        assert_eq!(parse_level(Some("debug")), Some(Level::DEBUG));
        assert_eq!(parse_level(Some(" WARN ")), Some(Level::WARN));
        assert_eq!(parse_level(Some("loud")), None);
        assert_eq!(parse_level(None), None);
    }
}

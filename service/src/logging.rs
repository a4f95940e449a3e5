use crate::config::{Config, RustEnv};
use log::LevelFilter;
use simplelog::{self, ColorChoice, ConfigBuilder, TerminalMode};

/// Dependency modules whose records are dropped unless the level is Trace.
/// sqlx and sea_orm log every statement, and the websocket stack logs every frame.
const FILTERED_MODULES: &[&str] = &[
    "sqlx",
    "sea_orm",
    "tower",
    "tower_http",
    "hyper",
    "axum",
    "tungstenite",
];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger from the log level and runtime environment in `config`.
    ///
    /// Production output goes to stderr without color so log collectors get plain lines.
    pub fn init_logger(config: &Config) {
        let log_config = Self::build_log_config(Self::should_filter_dependencies(
            config.log_level_filter,
        ));
        let (terminal_mode, color_choice) = Self::terminal_settings(&config.runtime_env);

        simplelog::TermLogger::init(
            Self::convert_level_filter(config.log_level_filter),
            log_config,
            terminal_mode,
            color_choice,
        )
        .expect("Failed to start simplelog");
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn terminal_settings(env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match env {
            RustEnv::Production => (TerminalMode::Stderr, ColorChoice::Never),
            RustEnv::Development | RustEnv::Staging => (TerminalMode::Mixed, ColorChoice::Auto),
        }
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_dependencies_are_filtered() {
        for module in ["sqlx", "sea_orm", "axum", "tungstenite"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
    }

    #[test]
    fn only_trace_level_shows_dependency_logs() {
        assert!(!Logger::should_filter_dependencies(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::should_filter_dependencies(level));
        }
    }

    #[test]
    fn production_logs_to_stderr_without_color() {
        assert!(matches!(
            Logger::terminal_settings(&RustEnv::Production),
            (TerminalMode::Stderr, ColorChoice::Never)
        ));
        assert!(matches!(
            Logger::terminal_settings(&RustEnv::Development),
            (TerminalMode::Mixed, ColorChoice::Auto)
        ));
    }

    #[test]
    fn build_log_config_does_not_panic() {
        let _filtered = Logger::build_log_config(true);
        let _unfiltered = Logger::build_log_config(false);
    }

    #[test]
    fn convert_level_filter_keeps_levels() {
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Warn) as u8,
            simplelog::LevelFilter::Warn as u8
        );
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Trace) as u8,
            simplelog::LevelFilter::Trace as u8
        );
    }
}

pub mod logging {
    use clap::ValueEnum;
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use tracing::level_filters::LevelFilter;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_subscriber::EnvFilter;

    /// Full `EnvFilter` directives; wins over `--log-level`.
    pub const FILTER_ENV: &str = "DASHFRAME_LOG_FILTER";

    /// Targets of the dashframe crates. `--log-level` applies to these;
    /// every other target is capped at `warn`.
    const DASHFRAME_TARGETS: &[&str] = &[
        "dashframe",
        "dashframe_engine",
        "dashframe_client",
        "dashframe_proto",
        "frame_bus",
    ];

    #[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
    pub enum LogLevel {
        Error,
        #[default]
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl LogLevel {
        pub fn to_filter(self) -> LevelFilter {
            match self {
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Warn => LevelFilter::WARN,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    #[derive(Clone, Debug, Default)]
    pub struct LogConfig {
        pub level: LogLevel,
        pub file: Option<PathBuf>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum InitError {
        #[error("logging already initialized")]
        AlreadyInitialized,
        #[error("failed to open log file {path:?}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error("invalid DASHFRAME_LOG_FILTER: {0}")]
        Filter(String),
        #[error("failed to configure logger: {0}")]
        Configure(String),
    }

    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    /// Installs the global subscriber. Later calls are no-ops.
    pub fn init(config: &LogConfig) -> Result<(), InitError> {
        if GUARD.get().is_some() {
            return Ok(());
        }
        let filter = directives(config.level, std::env::var(FILTER_ENV).ok());
        let env_filter =
            EnvFilter::try_new(&filter).map_err(|err| InitError::Filter(err.to_string()))?;

        let (writer, guard) = match &config.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| InitError::Io {
                        path: path.clone(),
                        source,
                    })?;
                tracing_appender::non_blocking(file)
            }
            None => tracing_appender::non_blocking(std::io::stderr()),
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_level(true)
            .with_target(config.level >= LogLevel::Debug)
            .with_thread_names(config.level >= LogLevel::Trace)
            .with_ansi(config.file.is_none())
            .with_writer(writer)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| InitError::Configure(err.to_string()))?;
        GUARD.set(guard).map_err(|_| InitError::AlreadyInitialized)?;

        tracing::debug!(
            target: "dashframe::telemetry",
            filter = %filter,
            file = ?config.file,
            "logging initialized"
        );
        Ok(())
    }

    /// Filter directives for `level`, unless the environment supplied its own.
    pub(crate) fn directives(level: LogLevel, env_override: Option<String>) -> String {
        if let Some(filter) = env_override.filter(|filter| !filter.trim().is_empty()) {
            return filter;
        }
        let ours = level.to_filter();
        let others = ours.min(LevelFilter::WARN);
        let mut filter = others.to_string().to_lowercase();
        if ours > others {
            for target in DASHFRAME_TARGETS {
                filter.push_str(&format!(",{target}={}", ours.to_string().to_lowercase()));
            }
        }
        filter
    }

}

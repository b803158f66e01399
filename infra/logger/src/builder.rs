use crate::error::{LoggerError, LoggerErrorExt};
use crate::{Logger, parse_level};
use conduit_config::LoggingConfig;
use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) console: bool,
    pub(crate) targets: bool,
    pub(crate) directory: Option<PathBuf>,
    pub(crate) level: LevelFilter,
    pub(crate) rotation: Rotation,
    pub(crate) max_files: usize,
    pub(crate) json: bool,
    pub(crate) filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            targets: false,
            directory: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            filter: None,
        }
    }
}

impl TryFrom<&LoggingConfig> for Settings {
    type Error = LoggerError;

    fn try_from(config: &LoggingConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            console: config.console,
            directory: config.directory.clone(),
            level: parse_level(&config.level).context("logging.level")?,
            max_files: config.max_files,
            json: config.json,
            filter: config.filter.clone(),
            ..Self::default()
        })
    }
}

impl Settings {
    /// `filter` directives on top of `level`; without directives, `RUST_LOG` is read.
    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        let Some(filter) = &self.filter else {
            return Ok(builder.from_env_lossy());
        };
        builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("invalid filter '{filter}': {e}").into(),
            context: Some("logging.filter".into()),
        })
    }
}

/// Installs the global subscriber for service `name`.
///
/// Every configuration error is reported before anything is created on disk or
/// registered globally.
pub(crate) fn install(name: String, settings: Settings) -> Result<Logger, LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "logger name cannot be empty".into(),
            context: Some("logging.name".into()),
        });
    }
    if !settings.console && settings.directory.is_none() {
        return Err(LoggerError::InvalidConfiguration {
            message: "no output enabled; turn on the console or set a directory".into(),
            context: None,
        });
    }

    let filter = settings.env_filter()?;
    let console = settings.console.then(|| console_layer(settings.targets));
    let (file, guard) = settings
        .directory
        .as_deref()
        .map(|directory| file_output(&name, directory, &settings))
        .transpose()?
        .unzip();

    tracing_subscriber::registry().with(filter).with(console).with(file).try_init()?;
    tracing::debug!(logger = %name, file = guard.is_some(), "Logging initialized");

    Ok(Logger { name, guard })
}

fn console_layer<S>(targets: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    layer().compact().with_target(targets).with_ansi(true).boxed()
}

/// A rolling file layer under `directory`, plus the guard of its background writer.
fn file_output<S>(
    name: &str,
    directory: &Path,
    settings: &Settings,
) -> Result<(BoxedLayer<S>, WorkerGuard), LoggerError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: Some("logging.max_files".into()),
        });
    }

    fs::create_dir_all(directory).map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some(format!("creating {}", directory.display()).into()),
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(settings.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(settings.max_files)
        .build(directory)?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = layer().with_writer(writer).with_ansi(false);
    let file = if settings.json { file.json().boxed() } else { file.boxed() };
    Ok((file, guard))
}

/// Builder state: no name given yet.
#[derive(Debug)]
pub struct Unnamed;
/// Builder state: named, ready to `init`.
#[derive(Debug)]
pub struct Named(String);
/// Builder state: console only.
#[derive(Debug)]
pub struct ConsoleOnly;
/// Builder state: a log directory was given; file knobs are available.
#[derive(Debug)]
pub struct WithDirectory;

mod private {
    pub trait Sealed {}
}
impl Sealed for Unnamed {}
impl Sealed for Named {}
impl Sealed for ConsoleOnly {}
impl Sealed for WithDirectory {}

/// Configures the process-wide tracing subscriber.
///
/// A name is required before [`LoggerBuilder::init`] becomes available, and
/// file-only settings ([`max_files`](LoggerBuilder::max_files),
/// [`rotation`](LoggerBuilder::rotation), [`json`](LoggerBuilder::json)) only after
/// [`directory`](LoggerBuilder::directory).
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = Unnamed, D: Sealed = ConsoleOnly> {
    pub(crate) settings: Settings,
    name: N,
    output: PhantomData<D>,
}

impl LoggerBuilder {
    pub(crate) fn new() -> Self {
        Self { settings: Settings::default(), name: Unnamed, output: PhantomData }
    }
}

impl<D: Sealed> LoggerBuilder<Unnamed, D> {
    /// Names the service. The name prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named, D> {
        LoggerBuilder { settings: self.settings, name: Named(name.into()), output: PhantomData }
    }
}

impl LoggerBuilder<Named, WithDirectory> {
    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// Writes file records as JSON lines. Console output stays human readable.
    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }
}

impl<D: Sealed> LoggerBuilder<Named, D> {
    /// Default level for targets the filter does not mention.
    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Per-target directives, e.g. `conduit_events=trace,conduit_pipeline=debug`.
    ///
    /// Takes precedence over `RUST_LOG`. An unparsable filter makes
    /// [`LoggerBuilder::init`] fail.
    #[must_use = "the builder does nothing until `init` is called"]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.settings.filter = Some(filter.into());
        self
    }

    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Prints the event target (module path) next to each console record.
    #[must_use = "the builder does nothing until `init` is called"]
    pub const fn targets(mut self, enabled: bool) -> Self {
        self.settings.targets = enabled;
        self
    }

    /// Also write records to rolling files under `directory`.
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<Named, WithDirectory> {
        let mut settings = self.settings;
        settings.directory = Some(directory.into());
        LoggerBuilder { settings, name: self.name, output: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive for as long as file output is needed;
    /// dropping it flushes and stops the background writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`,
    ///   a bad filter, or when neither console nor file output is enabled.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    /// * [`LoggerError::Appender`] or [`LoggerError::Internal`] if the log directory
    ///   cannot be prepared.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: Named(name), .. } = self;
        install(name, settings)
    }
}

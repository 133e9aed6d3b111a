//! Observability setup: structured JSONL logging.
//!
//! Stdout carries command output only (step lines, the summary, `--json`).
//! Logs go to a daily-rolling JSONL file, or to stderr when no log
//! directory is writable.
//!
//! Log file location, first match wins:
//! 1. `BUMPRC_LOG_PATH` (exact file)
//! 2. `BUMPRC_LOG_DIR`
//! 3. `log_dir` from config
//! 4. the platform data dir (`~/.local/share/bumprc/logs` on Linux)
//! 5. the current directory

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use tracing::Event;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use bumprc_core::config;

const ENV_LOG_PATH: &str = "BUMPRC_LOG_PATH";
const ENV_LOG_DIR: &str = "BUMPRC_LOG_DIR";
const LOG_FILE_SUFFIX: &str = ".jsonl";

/// Configuration for observability setup.
#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    /// The service name used in log entries and the log file name.
    pub service: String,
    /// Directory for JSONL log files from config.
    pub log_dir: Option<Utf8PathBuf>,
}

impl ObservabilityConfig {
    /// Service name from the package, log dir from config.
    pub fn from_env_with_overrides(log_dir: Option<Utf8PathBuf>) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            log_dir,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: Utf8PathBuf,
    file_name: String,
}

/// Held for the lifetime of the process so buffered log lines are flushed.
pub struct ObservabilityGuard {
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global subscriber.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> Result<ObservabilityGuard> {
    let (writer, guard) = match resolve_log_target(&cfg.service, cfg.log_dir.as_deref()) {
        Ok(target) => {
            let appender = tracing_appender::rolling::daily(&target.dir, &target.file_name);
            tracing_appender::non_blocking(appender)
        }
        Err(err) => {
            eprintln!("Warning: {err:#}. Falling back to stderr logging.");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(JsonLogLayer::new(writer, cfg.service.clone()))
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::debug!("observability initialized");
    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Build an `EnvFilter` from CLI flags and environment.
///
/// Priority: quiet > `--debug` > verbose count > `RUST_LOG` > config level.
pub fn env_filter(quiet: bool, verbose: u8, debug: bool, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    if debug {
        return EnvFilter::new("trace");
    }
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

// ============================================================================
// JSON Log Layer
// ============================================================================

struct JsonLogLayer<W> {
    writer: W,
    service: String,
}

impl<W> JsonLogLayer<W> {
    const fn new(writer: W, service: String) -> Self {
        Self { writer, service }
    }
}

impl<S, W> tracing_subscriber::Layer<S> for JsonLogLayer<W>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: LayerContext<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = JsonVisitor::default();
            attrs.record(&mut visitor);
            span.extensions_mut().insert(SpanFields(visitor.0));
        }
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: LayerContext<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            let mut extensions = span.extensions_mut();
            match extensions.get_mut::<SpanFields>() {
                Some(fields) => fields.0.extend(visitor.0),
                None => extensions.insert(SpanFields(visitor.0)),
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let meta = event.metadata();
        let mut map = Map::new();
        map.insert("timestamp".into(), Value::String(format_timestamp()));
        map.insert("level".into(), Value::String(meta.level().as_str().to_lowercase()));
        map.insert("service".into(), Value::String(self.service.clone()));
        map.insert("target".into(), Value::String(meta.target().to_string()));

        // Span fields first so event fields win on name clashes.
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    map.insert("span".into(), Value::String(span.name().to_string()));
                    map.extend(fields.0.clone());
                }
            }
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        map.extend(visitor.0);

        let mut writer = self.writer.make_writer();
        if serde_json::to_writer(&mut writer, &Value::Object(map)).is_ok() {
            let _ = writer.write_all(b"\n");
        }
    }
}

#[derive(Clone, Debug)]
struct SpanFields(Map<String, Value>);

#[derive(Default)]
struct JsonVisitor(Map<String, Value>);

impl JsonVisitor {
    fn put(&mut self, field: &tracing::field::Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.put(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(number));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }
}

/// RFC 3339 UTC timestamp with millisecond precision.
fn format_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs();
    let (year, month, day) = days_to_ymd((secs / 86_400) as i64);
    let secs_of_day = secs % 86_400;

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        secs_of_day / 3600,
        (secs_of_day % 3600) / 60,
        secs_of_day % 60,
        now.subsec_millis()
    )
}

/// Days since 1970-01-01 to (year, month, day), per Hinnant's civil calendar.
const fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}

// ============================================================================
// Log Target Resolution
// ============================================================================

fn resolve_log_target(service: &str, config_dir: Option<&Utf8Path>) -> Result<LogTarget> {
    let from_env = |name: &str| {
        std::env::var(name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Utf8PathBuf::from)
    };
    resolve_log_target_with(
        service,
        from_env(ENV_LOG_PATH),
        from_env(ENV_LOG_DIR),
        config_dir.map(Utf8Path::to_path_buf),
    )
}

fn resolve_log_target_with(
    service: &str,
    path_override: Option<Utf8PathBuf>,
    dir_override: Option<Utf8PathBuf>,
    config_dir: Option<Utf8PathBuf>,
) -> Result<LogTarget> {
    if let Some(path) = path_override {
        return log_target_from_path(&path);
    }
    if let Some(dir) = dir_override.or(config_dir) {
        return log_target_from_dir(dir, service);
    }

    let cwd = std::env::current_dir()
        .ok()
        .and_then(|d| Utf8PathBuf::from_path_buf(d).ok());
    config::user_log_dir()
        .into_iter()
        .chain(cwd)
        .find_map(|dir| log_target_from_dir(dir, service).ok())
        .ok_or_else(|| anyhow!("no writable log directory found"))
}

fn log_target_from_dir(dir: Utf8PathBuf, service: &str) -> Result<LogTarget> {
    let target = LogTarget {
        dir,
        file_name: format!("{service}{LOG_FILE_SUFFIX}"),
    };
    ensure_writable(&target)?;
    Ok(target)
}

fn log_target_from_path(path: &Utf8Path) -> Result<LogTarget> {
    let file_name = path
        .file_name()
        .with_context(|| format!("{ENV_LOG_PATH} must include a file name"))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let target = LogTarget {
        dir: dir.to_path_buf(),
        file_name: file_name.to_string(),
    };
    ensure_writable(&target)?;
    Ok(target)
}

fn ensure_writable(target: &LogTarget) -> Result<()> {
    std::fs::create_dir_all(&target.dir)
        .with_context(|| format!("failed to create log directory {}", target.dir))?;
    let path = target.dir.join(&target.file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {path}"))?;
    Ok(())
}

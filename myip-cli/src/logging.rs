//! Log output selected by `LOG_TYPE`.

use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use myip_api::LogFormat;

/// Type-erased output layer.
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Name the process logs under in syslog, the journal and GELF.
#[cfg(unix)]
const IDENTITY: &str = "myip";

/// Human-readable lines on stderr.
pub fn console_layer<S>() -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer().with_writer(std::io::stderr).boxed()
}

/// Builds the output layer for `format`.
///
/// Returns the reason when the sink cannot be set up; the caller decides
/// what to fall back to.
pub fn output_layer<S>(format: LogFormat, log_addr: Option<&str>) -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Console => Ok(console_layer()),
        LogFormat::Json => Ok(fmt::layer().json().with_writer(std::io::stderr).boxed()),
        LogFormat::Syslog => syslog_layer(),
        LogFormat::System => journald_layer(),
        LogFormat::Gelf => gelf_layer(log_addr),
    }
}

#[cfg(unix)]
fn syslog_layer<S>() -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let identity = std::ffi::CStr::from_bytes_with_nul(b"myip\0").map_err(|e| e.to_string())?;
    let (options, facility) = Default::default();
    let syslog = syslog_tracing::Syslog::new(identity, options, facility)
        .ok_or_else(|| "syslog is already claimed by another writer".to_string())?;

    // syslogd stamps its own time
    Ok(fmt::layer()
        .with_writer(syslog)
        .with_ansi(false)
        .without_time()
        .boxed())
}

#[cfg(unix)]
fn journald_layer<S>() -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let journald = tracing_journald::layer()
        .map_err(|e| format!("cannot open the systemd journal: {e}"))?
        .with_syslog_identifier(IDENTITY.to_string());
    Ok(journald.boxed())
}

#[cfg(not(unix))]
fn syslog_layer<S>() -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    Err("syslog is not available on this platform".into())
}

#[cfg(not(unix))]
fn journald_layer<S>() -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    Err("the systemd journal is not available on this platform".into())
}

/// GELF over UDP. Needs a running Tokio runtime for the sender task.
fn gelf_layer<S>(log_addr: Option<&str>) -> Result<BoxedLayer<S>, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let addr = log_addr
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .ok_or_else(|| "GELF address is not specified (LOG_ADDR)".to_string())?;

    let (logger, mut handle) = tracing_gelf::Logger::builder()
        .connect_udp(addr.to_string())
        .map_err(|e| format!("cannot set up GELF output to {addr}: {e:?}"))?;

    tokio::spawn(async move {
        let _errors = handle.connect().await;
    });

    Ok(logger.boxed())
}

use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize tracing for a worker process: `RUST_LOG`-driven filtering,
/// optional daily file rotation via `HM_LOG_DIR`, and a panic hook that
/// routes panics through `tracing::error!`. Idempotent.
pub fn init_tracing(app_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match file_writer(app_name) {
        Some(writer) => {
            let _ = builder.with_writer(writer).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }

    install_panic_hook(app_name);
}

/// Daily-rotated file sink under `HM_LOG_DIR`, or `None` to stay on stdout.
fn file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = PathBuf::from(std::env::var_os("HM_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("cannot create log dir {}: {err}; logging to stdout", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // The guard must outlive the process or buffered lines are lost.
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(writer))
}

fn install_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        let chain_default = std::env::var("HM_LOG_INCLUDE_BACKTRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        panic::set_hook(Box::new(move |info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                application = app_name,
                location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()))
                    .as_deref()
                    .unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );

            if chain_default {
                previous(info);
            }
        }));
    });
}

//! Logging and panic-hook setup, split out of the main loop the way
//! `ox-bin::AppStartup` keeps them out of its runtime logic.

use anyhow::Result;
use std::path::Path;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

pub struct AppStartup {
    pub log_guard: Option<WorkerGuard>,
}

impl Default for AppStartup {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStartup {
    pub fn new() -> Self {
        Self { log_guard: None }
    }

    /// Route `tracing` output to `<cmprdir>/cmpr.log`; the real terminal is
    /// about to be handed to raw mode for the rest of the run.
    pub fn configure_logging(&mut self, cmprdir: &Path) -> Result<()> {
        std::fs::create_dir_all(cmprdir)?;
        let file_appender = tracing_appender::rolling::never(cmprdir, "cmpr.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(()) => self.log_guard = Some(guard),
            Err(_) => {
                // A subscriber is already installed (e.g. repeated calls in tests).
            }
        }
        Ok(())
    }

    pub fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

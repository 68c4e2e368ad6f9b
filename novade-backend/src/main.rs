// NovaDE backend probe
//
// Runs backend autocreation against the current environment with the
// headless-only provider, starts the result and logs what it announces.
// Try it with `WLR_BACKENDS=headless WLR_HEADLESS_OUTPUTS=2`.

use std::rc::Rc;

use anyhow::{Context, Result};
use novade_backend::{autocreate, Backend, BackendConfig, BackendProvider, Display, HeadlessOnlyProvider};
use novade_core::config::{ConfigLoader, CoreConfig};
use novade_core::error::CoreError;
use novade_core::logging::{init_logging, init_minimal_logging};
use tracing::{info, warn};

fn main() -> Result<()> {
    let core_config = init_configured_logging(ConfigLoader::load());

    let config = BackendConfig::from_env()
        .with_session_timeout(core_config.session.activation_timeout());
    info!(?config, "Starting NovaDE backend probe...");

    #[cfg(feature = "udev")]
    log_gpus();

    let display = Display::new("wayland-probe");
    let provider: Rc<dyn BackendProvider> = Rc::new(HeadlessOnlyProvider);
    let multi = autocreate(&display, &provider, &config).context("Failed to create backend")?;

    let _on_output = multi.events().new_output.subscribe(|output| {
        info!(
            name = %output.name,
            width = output.width,
            height = output.height,
            refresh_mhz = output.refresh_mhz,
            "New output"
        );
    });
    let _on_input = multi.events().new_input.subscribe(|device| {
        info!(name = %device.name, kind = %device.kind, "New input device");
    });

    let started = multi.start();
    info!(
        children = multi.len(),
        buffer_caps = ?multi.buffer_caps(),
        clock = ?multi.presentation_clock(),
        clock_id = multi.presentation_clock().as_raw(),
        "Backend probe finished"
    );

    multi.destroy();
    display.destroy();
    started.context("Failed to start backend")?;
    Ok(())
}

/// Installs the configured subscriber, or the minimal one when the
/// configuration could not be loaded. Returns the configuration in effect.
fn init_configured_logging(loaded: std::result::Result<CoreConfig, CoreError>) -> CoreConfig {
    match loaded {
        Ok(config) => {
            if let Err(e) = init_logging(&config.logging, false) {
                init_minimal_logging();
                warn!("Failed to initialize configured logging: {}", e);
            }
            config
        }
        Err(e) => {
            init_minimal_logging();
            warn!("Failed to load configuration, using defaults: {}", e);
            CoreConfig::default()
        }
    }
}

#[cfg(feature = "udev")]
fn log_gpus() {
    use novade_backend::session::gpu::DEFAULT_SEAT;
    use novade_backend::session::udev::find_gpu_paths;
    use novade_backend::MAX_GPUS;

    match find_gpu_paths(DEFAULT_SEAT, MAX_GPUS) {
        Ok(paths) if paths.is_empty() => warn!(seat = DEFAULT_SEAT, "No DRM cards found"),
        Ok(paths) => {
            for (index, path) in paths.iter().enumerate() {
                info!(seat = DEFAULT_SEAT, primary = index == 0, path = %path.display(), "DRM card");
            }
        }
        Err(e) => warn!("Failed to enumerate DRM cards: {}", e),
    }
}

use color_eyre::{eyre::eyre, Result};
use octopad::backend::GilrsBackend;
use octopad::config::{ConfigSource, InputConfig};
use octopad::controller::ControllerSession;
use octopad::driver::{self, FrameReport};
use octopad::logging;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = setup()?;

    info!("Mapping database: {}", config.mapping_db.display());
    let mut session = ControllerSession::new(
        Box::new(GilrsBackend::new()),
        config.mapping_db.clone(),
    );

    // Startup connection events are flushed, so claim whatever is plugged in now
    session.initialize();
    session.open();

    let (report_tx, report_rx) = watch::channel(FrameReport::default());
    let reporter = tokio::spawn(driver::report_inputs(report_rx));

    let frames = driver::run_frames(
        &mut session,
        config.shaping(),
        config.frame_interval(),
        report_tx,
        shutdown_signal(),
    )
    .await;
    info!("Frame loop stopped after {} frames", frames);

    session.deinitialize();
    reporter
        .await
        .map_err(|e| eyre!("Report task failed: {}", e))?;

    Ok(())
}

fn setup() -> Result<InputConfig> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    let (config, source) =
        InputConfig::load().map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    logging::init(config.level()?, config.log_file.as_deref())
        .map_err(|e| eyre!("Failed to open log file: {}", e))?;

    // Anything logged while loading ran before the subscriber existed
    match &source {
        ConfigSource::File(_) => info!("Using {}", source),
        ConfigSource::Defaults(_) => warn!("Using {}", source),
    }

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

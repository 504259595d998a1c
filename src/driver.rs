//! Fixed-rate frame loop standing in for the host's per-frame callback.
//!
//! ```text
//! interval tick ──► get_inputs ──► StickShaping ──► watch::Sender<FrameReport>
//!                                                         │
//!                                      report_inputs ◄────┘
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::controller::{ControllerSession, InputSnapshot, StickShaping};

/// What one frame observed, published only when it differs from the last one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub connected: bool,
    pub device: Option<String>,
    pub snapshot: InputSnapshot,
}

/// Polls the session once and shapes the sticks.
///
/// The snapshot starts zeroed every frame so a vanished controller never
/// leaves buttons stuck down.
pub fn poll_frame(session: &mut ControllerSession, shaping: &StickShaping) -> FrameReport {
    let mut snapshot = InputSnapshot::default();
    let connected = session.get_inputs(&mut snapshot);
    if connected {
        shaping.apply(&mut snapshot);
    }

    FrameReport {
        connected,
        device: session.active_device().map(|device| device.name.clone()),
        snapshot,
    }
}

/// Runs frames every `period` until `shutdown` resolves, returning the number
/// of frames polled. Teardown of the session is left to the caller.
pub async fn run_frames<F>(
    session: &mut ControllerSession,
    shaping: StickShaping,
    period: Duration,
    reports: watch::Sender<FrameReport>,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("Starting frame loop every {:?}", period);
    let mut frames = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested after {} frames", frames);
                break;
            }
            _ = ticker.tick() => {
                frames += 1;
                let report = poll_frame(session, &shaping);
                reports.send_if_modified(move |current| {
                    if *current != report {
                        *current = report;
                        true
                    } else {
                        false
                    }
                });
            }
        }
    }

    frames
}

/// Logs controller changes published by [`run_frames`] until the sender is
/// dropped.
pub async fn report_inputs(mut reports: watch::Receiver<FrameReport>) {
    let mut last_device: Option<String> = None;

    while reports.changed().await.is_ok() {
        let report = reports.borrow_and_update().clone();

        if report.device != last_device {
            match &report.device {
                Some(name) => info!("Controller active: {}", name),
                None => info!("No controller active"),
            }
            last_device = report.device.clone();
        }

        if report.connected {
            if report.snapshot.any_pressed() {
                debug!("Buttons held: {:?}", report.snapshot);
            } else {
                trace!("Inputs: {:?}", report.snapshot);
            }
        }
    }

    debug!("Report channel closed");
}

// Terminal demo: open a monitoring session against a live backend and log
// status transitions and snapshot changes until Ctrl-C.

use qcmon_core::{MonitorConfig, MonitorSession, Severity};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    fmt().compact().init();

    let config = MonitorConfig::from_env();
    let mut session = MonitorSession::open(config)?;

    let mut status = session.status();
    let mut refresh = session.subscribe_refresh();

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(status = ?*status.borrow(), "Connection status");
            }
            msg = refresh.recv() => match msg {
                Ok(channel) => {
                    let snap = session.snapshot().await;
                    info!(
                        channel = ?channel,
                        total_tests = snap.kpis.total_tests,
                        machines = snap.machines.len(),
                        alerts = snap.alerts.total(),
                        severity = ?snap.alerts.highest_severity(),
                        last_updated = snap.last_updated.as_deref().unwrap_or("-"),
                        "Dashboard updated"
                    );
                    if snap.alerts.highest_severity() == Severity::Critical {
                        info!("Critical alert level on the floor");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    session.close();
    Ok(())
}

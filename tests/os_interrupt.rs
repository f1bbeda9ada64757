//! A real SIGINT delivered to the process requests a graceful stop instead
//! of terminating it. Kept in its own test binary so the signal reaches only
//! this test.
#![cfg(unix)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use report_server::events::SERVER_ENDING;
use report_server::host::HostLifetime;
use report_server::lifecycle::ShutdownState;

mod common;

use common::{lifecycle_config, start, Behavior};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_sigint_runs_shutdown_and_process_survives() {
    let h = start(
        lifecycle_config(true, true, Duration::from_millis(20)),
        Behavior::BlockUntilShutdown,
        true,
    );
    let host = Arc::new(HostLifetime::new());
    let listener = h.lifecycle.install(&host).unwrap();

    // No yield before the signal: the handlers must already be installed.
    let status = Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    tokio::time::timeout(WAIT, host.stopping().cancelled())
        .await
        .unwrap();
    assert_eq!(h.lifecycle.coordinator().state(), ShutdownState::Completed);
    assert_eq!(h.scheduler.shutdowns(), 1);
    assert_eq!(h.log.count_diagnostic(SERVER_ENDING), 1);
    assert!(!listener.is_finished());

    listener.abort();
}

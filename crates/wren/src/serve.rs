// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wren serve`: run every configured channel until a shutdown signal.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wren_agent::ChannelSupervisor;
use wren_agent::shutdown::install_signal_handler;
use wren_config::model::WrenConfig;
use wren_core::WrenError;

use crate::runtime::{Runtime, terminal_factory};

pub async fn run_serve(config: WrenConfig) -> Result<(), WrenError> {
    info!(agent = %config.agent.name, "starting wren serve");
    let runtime = Runtime::from_config(config).await?;
    serve_until(&runtime, install_signal_handler()).await
}

/// Runs the gateway channels of an assembled runtime until `shutdown` fires
/// or every channel has ended.
pub async fn serve_until(runtime: &Runtime, shutdown: CancellationToken) -> Result<(), WrenError> {
    let supervisor = gateway_supervisor(runtime);
    let result = supervisor.run_until(shutdown).await;

    let interrupted = runtime.agent.runs().len();
    if interrupted > 0 {
        warn!(runs = interrupted, "shutting down with turns still running");
    }
    runtime.close().await?;
    info!("wren serve stopped");
    result
}

fn gateway_supervisor(runtime: &Runtime) -> ChannelSupervisor {
    let mut supervisor = runtime.supervisor();
    #[cfg(feature = "telegram")]
    supervisor.register("telegram", crate::runtime::telegram_factory());
    supervisor.register("terminal", terminal_factory());
    supervisor
}

// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wren shell`: an interactive session on the terminal channel only.

use wren_agent::shutdown::install_signal_handler;
use wren_config::model::WrenConfig;
use wren_core::WrenError;

use crate::runtime::{Runtime, terminal_factory};

pub async fn run_shell(config: WrenConfig) -> Result<(), WrenError> {
    let runtime = Runtime::from_config(config).await?;
    let mut supervisor = runtime.supervisor();
    supervisor.register("terminal", terminal_factory());

    // Ends when the user quits, which stops the only channel.
    let result = supervisor.run_until(install_signal_handler()).await;
    runtime.close().await?;
    result
}

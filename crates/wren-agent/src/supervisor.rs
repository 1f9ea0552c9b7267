// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel supervision.
//!
//! The [`ChannelSupervisor`] builds every registered channel, runs each in
//! its own task, and reclaims tasks that die. A channel that cannot be built
//! (usually missing configuration) is skipped so the others still start.
//!
//! Lifecycle: `idle -> running -> stopping -> idle`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use wren_config::model::WrenConfig;
use wren_core::{ChannelAdapter, TurnHandler, WrenError};

/// What a [`ChannelFactory`] produces.
pub type FactoryResult = Result<Arc<dyn ChannelAdapter>, WrenError>;

/// Builds a channel from configuration. Returning an error skips the channel.
pub type ChannelFactory =
    Box<dyn Fn(&WrenConfig, Arc<dyn TurnHandler>) -> FactoryResult + Send + Sync>;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupervisorState {
    Idle,
    Running,
    Stopping,
}

struct ChannelSlot {
    name: String,
    adapter: Arc<dyn ChannelAdapter>,
    handle: JoinHandle<Result<(), WrenError>>,
}

/// Starts, watches and stops the configured channels.
pub struct ChannelSupervisor {
    config: Arc<WrenConfig>,
    handler: Arc<dyn TurnHandler>,
    factories: Vec<(String, ChannelFactory)>,
    state: std::sync::Mutex<SupervisorState>,
    slots: Arc<Mutex<Vec<ChannelSlot>>>,
    monitor: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl ChannelSupervisor {
    pub fn new(config: Arc<WrenConfig>, handler: Arc<dyn TurnHandler>) -> Self {
        Self {
            config,
            handler,
            factories: Vec::new(),
            state: std::sync::Mutex::new(SupervisorState::Idle),
            slots: Arc::new(Mutex::new(Vec::new())),
            monitor: Mutex::new(None),
        }
    }

    /// Registers a channel factory. A second factory for the same name is ignored.
    pub fn register(&mut self, name: impl Into<String>, factory: ChannelFactory) -> bool {
        let name = name.into();
        if self.factories.iter().any(|(n, _)| *n == name) {
            debug!(channel = %name, "channel already registered");
            return false;
        }
        self.factories.push((name, factory));
        true
    }

    pub fn state(&self) -> SupervisorState {
        *self.lock_state()
    }

    /// Names of channels whose tasks are still alive.
    pub async fn running_channels(&self) -> Vec<String> {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|s| !s.handle.is_finished())
            .map(|s| s.name.clone())
            .collect()
    }

    /// Builds and starts every registered, non-excluded channel.
    ///
    /// Returns the names of the channels that were started. Fails with
    /// `AlreadyRunning` unless the supervisor is idle.
    pub async fn start_channels(&self) -> Result<Vec<String>, WrenError> {
        {
            let mut state = self.lock_state();
            if *state != SupervisorState::Idle {
                return Err(WrenError::AlreadyRunning);
            }
            *state = SupervisorState::Running;
        }

        let mut started = Vec::new();
        let mut slots = self.slots.lock().await;
        for (name, factory) in &self.factories {
            if self.config.channels.exclude.iter().any(|e| e == name) {
                info!(channel = %name, "channel excluded by configuration");
                continue;
            }
            let adapter = match factory(self.config.as_ref(), Arc::clone(&self.handler)) {
                Ok(adapter) => adapter,
                Err(e) => {
                    warn!(channel = %name, error = %e, "skipping channel that could not be built");
                    continue;
                }
            };

            let task_adapter = Arc::clone(&adapter);
            let handle = tokio::spawn(
                async move { task_adapter.start().await }
                    .instrument(info_span!("channel", channel = %name)),
            );
            info!(channel = %name, "channel started");
            slots.push(ChannelSlot {
                name: name.clone(),
                adapter,
                handle,
            });
            started.push(name.clone());
        }
        drop(slots);

        if started.is_empty() {
            warn!("no channels started");
        }
        self.spawn_monitor().await;
        Ok(started)
    }

    async fn spawn_monitor(&self) {
        let token = CancellationToken::new();
        let slots = Arc::clone(&self.slots);
        let period = Duration::from_secs(self.config.channels.monitor_interval_secs.max(1));
        let monitor_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = monitor_token.cancelled() => break,
                    _ = interval.tick() => reclaim_dead(&slots).await,
                }
            }
            debug!("channel monitor stopped");
        }
        .instrument(info_span!("channel_monitor")));
        *self.monitor.lock().await = Some((token, handle));
    }

    /// Stops every channel and returns the supervisor to idle.
    ///
    /// Stop errors and stop calls that outlast the join timeout are logged,
    /// not returned. Tasks that do not finish within the join timeout are
    /// aborted.
    pub async fn stop_all(&self) {
        {
            let mut state = self.lock_state();
            if *state != SupervisorState::Running {
                let current = *state;
                debug!(state = %current, "stop_all ignored");
                return;
            }
            *state = SupervisorState::Stopping;
        }
        info!("stopping channels");

        if let Some((token, handle)) = self.monitor.lock().await.take() {
            token.cancel();
            let _ = handle.await;
        }

        let join_timeout = Duration::from_secs(self.config.channels.join_timeout_secs);
        let slots: Vec<ChannelSlot> = std::mem::take(&mut *self.slots.lock().await);
        for slot in &slots {
            match tokio::time::timeout(join_timeout, slot.adapter.stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(channel = %slot.name, error = %e, "channel stop failed"),
                Err(_) => warn!(
                    channel = %slot.name,
                    timeout_secs = join_timeout.as_secs(),
                    "channel stop timed out"
                ),
            }
        }

        for mut slot in slots {
            match tokio::time::timeout(join_timeout, &mut slot.handle).await {
                Ok(Ok(Ok(()))) => debug!(channel = %slot.name, "channel stopped"),
                Ok(Ok(Err(e))) => warn!(channel = %slot.name, error = %e, "channel ended with error"),
                Ok(Err(e)) => warn!(channel = %slot.name, error = %e, "channel task failed"),
                Err(_) => {
                    warn!(
                        channel = %slot.name,
                        timeout_secs = join_timeout.as_secs(),
                        "channel did not stop in time, aborting"
                    );
                    slot.handle.abort();
                }
            }
        }

        *self.lock_state() = SupervisorState::Idle;
        info!("all channels stopped");
    }

    /// Returns once no channel task is alive.
    pub async fn wait(&self) {
        loop {
            if self.running_channels().await.is_empty() {
                return;
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    /// Starts the channels, runs until `shutdown` fires or every channel
    /// has ended, then stops everything.
    pub async fn run_until(&self, shutdown: CancellationToken) -> Result<(), WrenError> {
        self.start_channels().await?;
        tokio::select! {
            _ = shutdown.cancelled() => info!("shutdown requested"),
            _ = self.wait() => info!("all channels have ended"),
        }
        self.stop_all().await;
        Ok(())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SupervisorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drops bookkeeping for channel tasks that have ended. A task that ended
/// while its channel still reports running is treated as a crash.
async fn reclaim_dead(slots: &Mutex<Vec<ChannelSlot>>) {
    let mut slots = slots.lock().await;
    let (dead, alive): (Vec<ChannelSlot>, Vec<ChannelSlot>) =
        std::mem::take(&mut *slots).into_iter().partition(|s| s.handle.is_finished());
    *slots = alive;
    drop(slots);

    for slot in dead {
        let outcome = match slot.handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) if e.is_panic() => Some(panic_message(e.into_panic())),
            Err(e) => Some(e.to_string()),
        };
        match outcome {
            Some(message) => {
                let crash = WrenError::ThreadCrash {
                    channel: slot.name.clone(),
                    message,
                };
                error!(channel = %slot.name, error = %crash, "reclaimed crashed channel");
            }
            None if slot.adapter.is_running() => {
                let crash = WrenError::ThreadCrash {
                    channel: slot.name.clone(),
                    message: "receive loop exited while running".into(),
                };
                error!(channel = %slot.name, error = %crash, "reclaimed crashed channel");
            }
            None => info!(channel = %slot.name, "channel exited"),
        }
    }
}

/// Text of a panic payload, for logs and error messages.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

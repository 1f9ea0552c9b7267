// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel supervisor lifecycle with mock channels.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;
use wren_agent::{ChannelFactory, ChannelSupervisor, FactoryResult, SupervisorState};
use wren_config::model::WrenConfig;
use wren_core::{ChannelAdapter, TurnHandler, WrenError};
use wren_test_utils::{ChannelBehavior, MockChannel, MockReply};

use common::{Fixture, fixture};

fn factory_for(channel: Arc<MockChannel>) -> ChannelFactory {
    Box::new(move |_: &WrenConfig, _: Arc<dyn TurnHandler>| -> FactoryResult {
        Ok(Arc::clone(&channel) as Arc<dyn ChannelAdapter>)
    })
}

fn failing_factory() -> ChannelFactory {
    Box::new(|_: &WrenConfig, _: Arc<dyn TurnHandler>| -> FactoryResult {
        Err(WrenError::Config("telegram bot_token is not set".into()))
    })
}

fn supervisor(fx: &Fixture) -> ChannelSupervisor {
    supervisor_with(fx, fx.harness.config.clone())
}

fn supervisor_with(fx: &Fixture, config: WrenConfig) -> ChannelSupervisor {
    let handler: Arc<dyn TurnHandler> = fx.agent.clone();
    ChannelSupervisor::new(Arc::new(config), handler)
}

fn channel(fx: &Fixture, name: &str) -> Arc<MockChannel> {
    Arc::new(MockChannel::new(name, fx.agent.clone()))
}

async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..50 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test]
async fn misconfigured_channel_does_not_block_others() {
    let fx = fixture(vec![], vec![]).await;
    let a = channel(&fx, "alpha");
    let b = channel(&fx, "beta");
    let mut sup = supervisor(&fx);
    sup.register("alpha", factory_for(Arc::clone(&a)));
    sup.register("broken", failing_factory());
    sup.register("beta", factory_for(Arc::clone(&b)));

    let started = sup.start_channels().await.unwrap();
    assert_eq!(started, vec!["alpha", "beta"]);
    assert_eq!(sup.state(), SupervisorState::Running);

    eventually(|| async { a.is_running() && b.is_running() }).await;
    let mut running = sup.running_channels().await;
    running.sort();
    assert_eq!(running, vec!["alpha", "beta"]);

    sup.stop_all().await;
}

#[tokio::test]
async fn second_start_is_rejected() {
    let fx = fixture(vec![], vec![]).await;
    let mut sup = supervisor(&fx);
    sup.register("alpha", factory_for(channel(&fx, "alpha")));

    sup.start_channels().await.unwrap();
    let err = sup.start_channels().await.unwrap_err();
    assert!(matches!(err, WrenError::AlreadyRunning));

    sup.stop_all().await;
    assert_eq!(sup.state(), SupervisorState::Idle);
    // A stopped supervisor can start again.
    sup.start_channels().await.unwrap();
    sup.stop_all().await;
}

#[tokio::test]
async fn duplicate_registration_is_ignored() {
    let fx = fixture(vec![], vec![]).await;
    let mut sup = supervisor(&fx);
    assert!(sup.register("alpha", factory_for(channel(&fx, "alpha"))));
    assert!(!sup.register("alpha", factory_for(channel(&fx, "alpha"))));
}

#[tokio::test]
async fn excluded_channels_are_not_started() {
    let fx = fixture(vec![], vec![]).await;
    let mut config = fx.harness.config.clone();
    config.channels.exclude = vec!["beta".into()];
    let mut sup = supervisor_with(&fx, config);
    sup.register("alpha", factory_for(channel(&fx, "alpha")));
    sup.register("beta", factory_for(channel(&fx, "beta")));

    assert_eq!(sup.start_channels().await.unwrap(), vec!["alpha"]);
    sup.stop_all().await;
}

#[tokio::test]
async fn stop_all_returns_to_idle() {
    let fx = fixture(vec![], vec![]).await;
    let a = channel(&fx, "alpha");
    let mut sup = supervisor(&fx);
    sup.register("alpha", factory_for(Arc::clone(&a)));

    // Stopping an idle supervisor does nothing.
    sup.stop_all().await;
    assert_eq!(sup.state(), SupervisorState::Idle);

    sup.start_channels().await.unwrap();
    eventually(|| async { a.is_running() }).await;
    sup.stop_all().await;

    assert_eq!(sup.state(), SupervisorState::Idle);
    assert!(sup.running_channels().await.is_empty());
    assert!(!a.is_running());
}

#[tokio::test]
#[traced_test]
async fn stuck_channel_is_aborted_after_join_timeout() {
    let fx = fixture(vec![], vec![]).await;
    let stuck = Arc::new(
        MockChannel::new("stuck", fx.agent.clone()).with_behavior(ChannelBehavior::IgnoreStop),
    );
    let mut sup = supervisor(&fx);
    sup.register("stuck", factory_for(stuck));

    sup.start_channels().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), sup.stop_all())
        .await
        .expect("stop_all must not hang on a stuck channel");

    assert_eq!(sup.state(), SupervisorState::Idle);
    assert!(logs_contain("did not stop in time"));
}

#[tokio::test]
#[traced_test]
async fn failing_stop_is_logged_and_others_still_stop() {
    let fx = fixture(vec![], vec![]).await;
    let bad = Arc::new(MockChannel::new("bad", fx.agent.clone()).with_failing_stop());
    let good = channel(&fx, "good");
    let mut sup = supervisor(&fx);
    sup.register("bad", factory_for(bad));
    sup.register("good", factory_for(Arc::clone(&good)));

    sup.start_channels().await.unwrap();
    eventually(|| async { good.is_running() }).await;
    sup.stop_all().await;

    assert!(logs_contain("channel stop failed"));
    assert!(!good.is_running());
    assert_eq!(sup.state(), SupervisorState::Idle);
}

#[tokio::test]
#[traced_test]
async fn hanging_stop_does_not_block_other_channels() {
    let fx = fixture(vec![], vec![]).await;
    let hung = Arc::new(MockChannel::new("hung", fx.agent.clone()).with_hanging_stop());
    let good = channel(&fx, "good");
    let mut sup = supervisor(&fx);
    sup.register("hung", factory_for(hung));
    sup.register("good", factory_for(Arc::clone(&good)));

    sup.start_channels().await.unwrap();
    eventually(|| async { good.is_running() }).await;
    tokio::time::timeout(Duration::from_secs(10), sup.stop_all())
        .await
        .expect("stop_all must not wait on a hanging stop");

    assert!(logs_contain("channel stop timed out"));
    assert!(!good.is_running());
    assert_eq!(sup.state(), SupervisorState::Idle);
}

#[tokio::test]
#[traced_test]
async fn crashed_channel_is_reclaimed_while_others_run() {
    let fx = fixture(vec![], vec![]).await;
    let crashy = Arc::new(
        MockChannel::new("crashy", fx.agent.clone()).with_behavior(ChannelBehavior::Panic),
    );
    let quitter = Arc::new(
        MockChannel::new("quitter", fx.agent.clone()).with_behavior(ChannelBehavior::ExitEarly),
    );
    let steady = channel(&fx, "steady");
    let mut sup = supervisor(&fx);
    sup.register("crashy", factory_for(crashy));
    sup.register("quitter", factory_for(quitter));
    sup.register("steady", factory_for(Arc::clone(&steady)));

    sup.start_channels().await.unwrap();
    eventually(|| async { sup.running_channels().await == vec!["steady"] }).await;
    // The monitor runs once per second.
    eventually(|| async { logs_contain("reclaimed crashed channel") }).await;
    eventually(|| async {
        logs_contain("mock channel 'crashy' crashed")
            && logs_contain("receive loop exited while running")
    })
    .await;

    assert!(steady.is_running());
    assert_eq!(sup.state(), SupervisorState::Running);
    sup.stop_all().await;
}

#[tokio::test]
async fn injected_message_is_answered_through_agent() {
    let fx = fixture(vec![MockReply::text("pong")], vec![]).await;
    let mock = channel(&fx, "mock");
    let mut sup = supervisor(&fx);
    sup.register("mock", factory_for(Arc::clone(&mock)));
    sup.start_channels().await.unwrap();

    mock.inject("chat-1", "ping").unwrap();
    mock.inject("chat-1", "/label work").unwrap();
    eventually(|| async { mock.replies().await.len() == 2 }).await;
    assert_eq!(
        mock.replies().await,
        vec!["pong", "Labelled this conversation 'work'."]
    );

    sup.stop_all().await;
}

#[tokio::test]
async fn run_until_stops_on_shutdown_signal() {
    let fx = fixture(vec![], vec![]).await;
    let a = channel(&fx, "alpha");
    let mut sup = supervisor(&fx);
    sup.register("alpha", factory_for(Arc::clone(&a)));
    let sup = Arc::new(sup);

    let shutdown = CancellationToken::new();
    let task = tokio::spawn({
        let sup = Arc::clone(&sup);
        let shutdown = shutdown.clone();
        async move { sup.run_until(shutdown).await }
    });

    eventually(|| async { a.is_running() }).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run_until should return after shutdown")
        .unwrap()
        .unwrap();
    assert_eq!(sup.state(), SupervisorState::Idle);
    assert!(!a.is_running());
}

#[tokio::test]
async fn run_until_returns_when_every_channel_ends() {
    let fx = fixture(vec![], vec![]).await;
    let quitter = Arc::new(
        MockChannel::new("quitter", fx.agent.clone()).with_behavior(ChannelBehavior::ExitEarly),
    );
    let mut sup = supervisor(&fx);
    sup.register("quitter", factory_for(quitter));

    tokio::time::timeout(Duration::from_secs(5), sup.run_until(CancellationToken::new()))
        .await
        .expect("run_until should notice that nothing is left running")
        .unwrap();
    assert_eq!(sup.state(), SupervisorState::Idle);
}

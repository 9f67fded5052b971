use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use gust_core::event::{
    BanCreateEvent, GuildChannelPinsUpdateEvent, GuildLeaveEvent, PrivateChannelPinsUpdateEvent,
};
use gust_core::model::User;
use gust_core::Snowflake;
use parking_lot::Mutex;
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::diagnostic::FailureCause;

fn shard() -> ShardId {
    ShardId::new(0)
}

fn leave(guild: u64) -> GatewayEvent {
    GuildLeaveEvent {
        shard: shard(),
        guild_id: Snowflake::new(guild),
    }
    .into()
}

fn ban(guild: u64) -> GatewayEvent {
    BanCreateEvent {
        shard: shard(),
        guild_id: Snowflake::new(guild),
        user: User {
            id: Snowflake::new(7),
            username: "mallory".to_string(),
            discriminator: "0001".to_string(),
            avatar: None,
            bot: false,
            system: false,
        },
    }
    .into()
}

fn guild_pins() -> GatewayEvent {
    GuildChannelPinsUpdateEvent {
        shard: shard(),
        channel_id: Snowflake::new(10),
        guild_id: Snowflake::new(1),
        last_pin_timestamp: None,
    }
    .into()
}

fn private_pins() -> GatewayEvent {
    PrivateChannelPinsUpdateEvent {
        shard: shard(),
        channel_id: Snowflake::new(11),
        last_pin_timestamp: None,
    }
    .into()
}

fn running(intents: Intents) -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .configure(intents, RequirementTable::new())
        .unwrap();
    dispatcher.start().unwrap();
    dispatcher
}

#[test]
fn test_subscribe_before_configure_is_rejected() {
    let dispatcher = Dispatcher::new();
    let err = dispatcher
        .subscribe(|_: EventContext<GuildLeaveEvent>| {})
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::invalid_state("subscribe", DispatcherState::Unconfigured)
    );
}

#[test]
fn test_lifecycle_transitions() {
    let dispatcher = Dispatcher::new();
    assert_eq!(dispatcher.state(), DispatcherState::Unconfigured);
    assert_err!(dispatcher.start());

    dispatcher
        .configure(Intents::GUILDS, RequirementTable::new())
        .unwrap();
    assert_eq!(dispatcher.state(), DispatcherState::Configured);
    assert!(
        dispatcher
            .configure(Intents::ALL, RequirementTable::new())
            .is_err()
    );
    assert_eq!(dispatcher.declared_intents(), Intents::GUILDS);

    let err = dispatcher.dispatch(leave(1)).unwrap_err();
    assert_eq!(err, DispatchError::invalid_state("dispatch", DispatcherState::Configured));

    assert_ok!(dispatcher.start());
    assert_ok!(dispatcher.start());
    assert_eq!(dispatcher.state(), DispatcherState::Running);
}

#[test]
fn test_unsatisfiable_subscription_fails() {
    let dispatcher = running(Intents::GUILDS);
    let err = dispatcher
        .subscribe(|_: EventContext<BanCreateEvent>| {})
        .unwrap_err();

    match err {
        DispatchError::UnsatisfiableCapability {
            target,
            declared,
            missing,
            ..
        } => {
            assert_eq!(target, "BanCreate");
            assert_eq!(declared, Intents::GUILDS);
            assert_eq!(missing, Intents::GUILD_BANS);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(dispatcher.listener_count(EventKind::BanCreate), 0);
}

#[test]
fn test_delivery_in_registration_order() {
    let dispatcher = running(Intents::GUILDS);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let seen = Arc::clone(&seen);
        dispatcher
            .subscribe(move |event: EventContext<GuildLeaveEvent>| {
                seen.lock().push((tag, event.guild_id.get()));
            })
            .unwrap();
    }

    assert_eq!(dispatcher.dispatch(leave(5)).unwrap(), 3);
    assert_eq!(
        *seen.lock(),
        vec![("first", 5), ("second", 5), ("third", 5)]
    );
}

#[test]
fn test_filtered_subscription() {
    let dispatcher = running(Intents::GUILDS);
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    dispatcher
        .subscribe_filtered(
            |event: &GuildLeaveEvent| event.guild_id == Snowflake::new(2),
            move |_: EventContext<GuildLeaveEvent>| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();

    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 0);
    assert_eq!(dispatcher.dispatch(leave(2)).unwrap(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsubscribe_during_dispatch_affects_later_events_only() {
    let dispatcher = running(Intents::GUILDS);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let victim: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

    {
        let registry = dispatcher.clone();
        let victim = Arc::clone(&victim);
        let calls = Arc::clone(&calls);
        dispatcher
            .subscribe(move |_: EventContext<GuildLeaveEvent>| {
                calls.lock().push("remover");
                if let Some(handle) = victim.lock().take() {
                    assert!(registry.unsubscribe(&handle));
                }
            })
            .unwrap();
    }

    let handle = {
        let calls = Arc::clone(&calls);
        dispatcher
            .subscribe(move |_: EventContext<GuildLeaveEvent>| {
                calls.lock().push("victim");
            })
            .unwrap()
    };
    *victim.lock() = Some(handle.clone());

    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 2);
    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 1);
    assert_eq!(*calls.lock(), vec!["remover", "victim", "remover"]);

    assert!(!dispatcher.unsubscribe(&handle));
}

#[test]
fn test_failing_listeners_do_not_block_others() {
    let dispatcher = running(Intents::GUILDS);
    let mut diagnostics = dispatcher.diagnostics();
    let reached = Arc::new(AtomicUsize::new(0));

    dispatcher
        .subscribe(|_: EventContext<GuildLeaveEvent>| Err::<(), _>(anyhow::anyhow!("refused")))
        .unwrap();
    dispatcher
        .subscribe(|_: EventContext<GuildLeaveEvent>| -> () { panic!("listener bug") })
        .unwrap();
    {
        let reached = Arc::clone(&reached);
        dispatcher
            .subscribe(move |_: EventContext<GuildLeaveEvent>| {
                reached.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 3);
    assert_eq!(dispatcher.dispatch(leave(2)).unwrap(), 3);
    assert_eq!(reached.load(Ordering::SeqCst), 2);

    match diagnostics.try_recv().unwrap() {
        Diagnostic::ListenerFailure(failure) => {
            assert_eq!(failure.kind, EventKind::GuildLeave);
            assert!(matches!(failure.cause, FailureCause::Error(_)));
            assert_eq!(failure.cause.to_string(), "refused");
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
    match diagnostics.try_recv().unwrap() {
        Diagnostic::ListenerFailure(failure) => {
            assert_eq!(failure.cause.to_string(), "panicked: listener bug");
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
}

#[test]
fn test_events_outside_declared_intents_are_not_delivered() {
    let dispatcher = running(Intents::GUILDS);
    let mut diagnostics = dispatcher.diagnostics();

    assert_eq!(dispatcher.dispatch(ban(1)).unwrap(), 0);
    match diagnostics.try_recv().unwrap() {
        Diagnostic::CapabilityViolation {
            kind, requirement, ..
        } => {
            assert_eq!(kind, EventKind::BanCreate);
            assert_eq!(requirement, Requirement::AllOf(Intents::GUILD_BANS));
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
}

#[test]
fn test_family_subscription_registers_satisfiable_kinds() {
    let dispatcher = running(Intents::PRIVATE_MESSAGES);
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    let handle = dispatcher
        .subscribe_family(
            EventFamily::ChannelPinsUpdate,
            Listener::sync(move |event: &GatewayEvent| {
                assert_eq!(event.kind(), EventKind::PrivateChannelPinsUpdate);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    assert_eq!(handle.kinds(), &[EventKind::PrivateChannelPinsUpdate]);
    assert_eq!(dispatcher.dispatch(guild_pins()).unwrap(), 0);
    assert_eq!(dispatcher.dispatch(private_pins()).unwrap(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(dispatcher.unsubscribe(&handle));
    assert_eq!(dispatcher.listener_count(EventKind::PrivateChannelPinsUpdate), 0);
}

#[test]
fn test_family_subscription_requires_family_intents() {
    let dispatcher = running(Intents::GUILD_BANS);
    let err = dispatcher
        .subscribe_family(EventFamily::Channel, Listener::sync(|_: &GatewayEvent| {}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnsatisfiableCapability { .. }));
}

#[test]
fn test_requirement_override_changes_subscription_check() {
    let dispatcher = Dispatcher::new();
    let table = RequirementTable::new()
        .with_override(EventKind::PrivateChannelPinsUpdate, Requirement::Ungated);
    dispatcher.configure(Intents::NONE, table).unwrap();

    assert_ok!(dispatcher.subscribe(|_: EventContext<PrivateChannelPinsUpdateEvent>| {}));
    assert_eq!(
        dispatcher.required_capabilities(EventKind::PrivateChannelPinsUpdate),
        Requirement::Ungated
    );
}

#[tokio::test]
async fn test_async_listeners_are_drained_on_shutdown() {
    let dispatcher = running(Intents::GUILDS);
    let finished = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&finished);
    dispatcher
        .subscribe_async(move |_: EventContext<GuildLeaveEvent>| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                flag.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 1);
    dispatcher.shutdown().await;

    assert!(finished.load(Ordering::SeqCst));
    assert!(dispatcher.is_shutdown());
    assert!(dispatcher.shutdown_token().is_cancelled());
}

#[tokio::test]
async fn test_async_listener_failure_is_reported() {
    let dispatcher = running(Intents::GUILDS);
    let mut diagnostics = dispatcher.diagnostics();

    dispatcher
        .subscribe_async(|_: EventContext<GuildLeaveEvent>| async {
            Err::<(), _>(anyhow::anyhow!("async refusal"))
        })
        .unwrap();
    dispatcher.dispatch(leave(1)).unwrap();

    match diagnostics.recv().await.unwrap() {
        Diagnostic::ListenerFailure(failure) => {
            assert_eq!(failure.cause.to_string(), "async refusal");
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
}

#[tokio::test]
async fn test_async_listener_panic_is_reported() {
    let dispatcher = running(Intents::GUILDS);
    let mut diagnostics = dispatcher.diagnostics();
    let survived = Arc::new(AtomicBool::new(false));

    dispatcher
        .subscribe_async(|event: EventContext<GuildLeaveEvent>| async move {
            assert_ne!(event.guild_id.get(), 1, "async listener bug");
        })
        .unwrap();
    let flag = Arc::clone(&survived);
    dispatcher
        .subscribe_async(move |_: EventContext<GuildLeaveEvent>| {
            let flag = Arc::clone(&flag);
            async move { flag.store(true, Ordering::SeqCst) }
        })
        .unwrap();

    assert_eq!(dispatcher.dispatch(leave(1)).unwrap(), 2);
    dispatcher.shutdown().await;

    assert!(survived.load(Ordering::SeqCst));
    match diagnostics.try_recv().unwrap() {
        Diagnostic::ListenerFailure(failure) => {
            assert!(matches!(failure.cause, FailureCause::Panic(_)));
            assert!(failure.cause.to_string().contains("async listener bug"));
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
}

#[tokio::test]
async fn test_listener_can_shut_down_its_own_dispatcher() {
    let dispatcher = running(Intents::GUILDS);
    let stopped = Arc::new(AtomicBool::new(false));

    let inner = dispatcher.clone();
    let flag = Arc::clone(&stopped);
    dispatcher
        .subscribe_async(move |_: EventContext<GuildLeaveEvent>| {
            let inner = inner.clone();
            let flag = Arc::clone(&flag);
            async move {
                inner.shutdown().await;
                flag.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    dispatcher.dispatch(leave(1)).unwrap();
    let drained = tokio::time::timeout(Duration::from_secs(2), dispatcher.shutdown()).await;

    assert!(drained.is_ok());
    assert!(stopped.load(Ordering::SeqCst));
    assert!(dispatcher.is_shutdown());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registry_changes_during_dispatch_never_tear_a_snapshot() {
    let dispatcher = running(Intents::GUILDS);
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    dispatcher
        .subscribe(move |_: EventContext<GuildLeaveEvent>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let churn = {
        let dispatcher = dispatcher.clone();
        let calls = Arc::clone(&calls);
        tokio::task::spawn_blocking(move || {
            for _ in 0..500 {
                let counter = Arc::clone(&calls);
                let handle = dispatcher
                    .subscribe(move |_: EventContext<GuildLeaveEvent>| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                assert!(dispatcher.unsubscribe(&handle));
            }
        })
    };

    for guild in 0..500 {
        let before = calls.load(Ordering::SeqCst);
        let delivered = dispatcher.dispatch(leave(guild)).unwrap();
        assert!((1..=2).contains(&delivered), "delivered {delivered}");
        assert_eq!(calls.load(Ordering::SeqCst) - before, delivered);
        tokio::task::yield_now().await;
    }

    churn.await.unwrap();
    assert_eq!(dispatcher.listener_count(EventKind::GuildLeave), 1);
}

#[tokio::test]
async fn test_operations_after_shutdown_are_rejected() {
    let dispatcher = running(Intents::GUILDS);
    dispatcher
        .subscribe(|_: EventContext<GuildLeaveEvent>| {})
        .unwrap();
    dispatcher.shutdown().await;

    assert_eq!(dispatcher.listener_count(EventKind::GuildLeave), 0);
    assert!(dispatcher.dispatch(leave(1)).unwrap_err().is_shutdown());
    assert!(
        dispatcher
            .subscribe(|_: EventContext<GuildLeaveEvent>| {})
            .unwrap_err()
            .is_shutdown()
    );

    // idempotent
    dispatcher.shutdown().await;
}

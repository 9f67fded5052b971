//! Shard pump: feeds one shard's raw payloads through the decoder and into
//! the dispatcher.
//!
//! Payloads from one shard are decoded and dispatched strictly in arrival
//! order. A payload that fails to decode is reported and skipped; it never
//! ends the pump.

use futures::StreamExt;
use gust_core::decode::{self, DecodeContext};
use gust_core::{DecodeError, RawDispatch, ShardFeed, ShardId};
use tracing::{debug, info, trace, warn};

use crate::diagnostic::Diagnostic;
use crate::dispatcher::Dispatcher;

/// Counters returned when a pump stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Payloads decoded and handed to the dispatcher.
    pub dispatched: u64,
    /// Payloads that failed to decode.
    pub decode_failures: u64,
    /// Payloads with an event name the decoder does not handle.
    pub unknown: u64,
}

/// Drives one shard's feed.
#[derive(Debug, Clone)]
pub struct ShardPump {
    dispatcher: Dispatcher,
    context: DecodeContext,
}

impl ShardPump {
    pub fn new(dispatcher: Dispatcher, context: DecodeContext) -> Self {
        Self {
            dispatcher,
            context,
        }
    }

    pub fn shard(&self) -> ShardId {
        self.context.shard()
    }

    /// Runs until the feed ends or the dispatcher shuts down.
    pub async fn run(self, mut feed: ShardFeed) -> PumpStats {
        let shard = self.shard();
        let shutdown = self.dispatcher.shutdown_token();
        let mut stats = PumpStats::default();
        info!(%shard, "shard pump started");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(%shard, "dispatcher shut down, stopping pump");
                    break;
                }
                next = feed.next() => next,
            };

            let Some(raw) = next else {
                debug!(%shard, "shard feed ended");
                break;
            };

            if !self.process(raw, &mut stats) {
                break;
            }
        }

        info!(
            %shard,
            dispatched = stats.dispatched,
            decode_failures = stats.decode_failures,
            unknown = stats.unknown,
            "shard pump stopped"
        );
        stats
    }

    /// Decodes and dispatches one payload. Returns `false` once the
    /// dispatcher no longer accepts events.
    fn process(&self, raw: RawDispatch, stats: &mut PumpStats) -> bool {
        let shard = self.shard();
        let RawDispatch {
            event_name,
            payload,
        } = raw;
        trace!(%shard, event = %event_name, "payload received");

        let event = match decode::decode(&event_name, &payload, &self.context) {
            Ok(event) => event,
            Err(DecodeError::UnknownEvent(name)) => {
                debug!(%shard, event = %name, "ignoring unhandled event");
                stats.unknown += 1;
                return true;
            }
            Err(error) => {
                warn!(%shard, event = %event_name, %error, "payload skipped");
                stats.decode_failures += 1;
                self.dispatcher.report(Diagnostic::DecodeFailure {
                    shard,
                    event_name,
                    error,
                });
                return true;
            }
        };

        match self.dispatcher.dispatch(event) {
            Ok(_) => {
                stats.dispatched += 1;
                true
            }
            Err(error) => {
                debug!(%shard, %error, "dispatcher rejected event");
                !error.is_shutdown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::stream;
    use gust_core::event::{GuildLeaveEvent, GuildUnavailableEvent};
    use gust_core::{EventContext, Intents, RequirementTable};
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;

    fn dispatcher() -> Dispatcher {
        let dispatcher = Dispatcher::new();
        dispatcher
            .configure(Intents::GUILDS, RequirementTable::new())
            .unwrap();
        dispatcher.start().unwrap();
        dispatcher
    }

    fn feed(items: Vec<RawDispatch>) -> ShardFeed {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn test_payloads_are_dispatched_in_order() {
        let dispatcher = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let left = Arc::clone(&seen);
        dispatcher
            .subscribe(move |event: EventContext<GuildLeaveEvent>| {
                left.lock().push(format!("leave {}", event.guild_id));
            })
            .unwrap();
        let outage = Arc::clone(&seen);
        dispatcher
            .subscribe(move |event: EventContext<GuildUnavailableEvent>| {
                outage.lock().push(format!("unavailable {}", event.guild_id));
            })
            .unwrap();

        let pump = ShardPump::new(dispatcher.clone(), DecodeContext::new(ShardId::new(3)));
        let stats = pump
            .run(feed(vec![
                RawDispatch::new("GUILD_DELETE", json!({"id": "1"})),
                RawDispatch::new("GUILD_DELETE", json!({"id": "2", "unavailable": true})),
                RawDispatch::new("GUILD_DELETE", json!({"id": "3"})),
            ]))
            .await;

        assert_eq!(stats.dispatched, 3);
        assert_eq!(
            *seen.lock(),
            vec!["leave 1", "unavailable 2", "leave 3"]
        );
    }

    #[tokio::test]
    async fn test_bad_payloads_are_skipped_and_reported() {
        let dispatcher = dispatcher();
        let mut diagnostics = dispatcher.diagnostics();
        let count = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&count);
        dispatcher
            .subscribe(move |_: EventContext<GuildLeaveEvent>| {
                *counter.lock() += 1;
            })
            .unwrap();

        let pump = ShardPump::new(dispatcher.clone(), DecodeContext::new(ShardId::new(0)));
        let stats = pump
            .run(feed(vec![
                RawDispatch::new("GUILD_DELETE", json!({"id": "not-a-number"})),
                RawDispatch::new("MESSAGE_CREATE", json!({"id": "9"})),
                RawDispatch::new("GUILD_DELETE", json!({"id": "4"})),
            ]))
            .await;

        assert_eq!(
            stats,
            PumpStats {
                dispatched: 1,
                decode_failures: 1,
                unknown: 1,
            }
        );
        assert_eq!(*count.lock(), 1);

        match diagnostics.try_recv().unwrap() {
            Diagnostic::DecodeFailure {
                event_name, error, ..
            } => {
                assert_eq!(event_name, "GUILD_DELETE");
                assert!(error.is_malformed());
            }
            other => panic!("unexpected diagnostic: {other}"),
        }
    }

    #[tokio::test]
    async fn test_slow_async_listener_does_not_hold_back_the_shard() {
        let dispatcher = dispatcher();
        let gate = Arc::new(Notify::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let (release, log) = (Arc::clone(&gate), Arc::clone(&seen));
        dispatcher
            .subscribe_async(move |event: EventContext<GuildLeaveEvent>| {
                let (release, log) = (Arc::clone(&release), Arc::clone(&log));
                async move {
                    let guild = event.guild_id.get();
                    if guild == 1 {
                        release.notified().await;
                    }
                    log.lock().push(guild);
                }
            })
            .unwrap();

        let pump = ShardPump::new(dispatcher.clone(), DecodeContext::new(ShardId::new(0)));
        let stats = pump
            .run(feed(vec![
                RawDispatch::new("GUILD_DELETE", json!({"id": "1"})),
                RawDispatch::new("GUILD_DELETE", json!({"id": "2"})),
            ]))
            .await;
        assert_eq!(stats.dispatched, 2);

        let second = tokio::time::timeout(Duration::from_secs(2), async {
            while !seen.lock().contains(&2) {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(second.is_ok());
        assert_eq!(*seen.lock(), vec![2]);

        gate.notify_one();
        dispatcher.shutdown().await;
        assert_eq!(*seen.lock(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_pump_stops_on_shutdown() {
        let dispatcher = dispatcher();
        let pump = ShardPump::new(dispatcher.clone(), DecodeContext::new(ShardId::new(1)));
        let handle = tokio::spawn(pump.run(stream::pending().boxed()));

        dispatcher.shutdown().await;
        let stats = handle.await.unwrap();
        assert_eq!(stats, PumpStats::default());
    }
}

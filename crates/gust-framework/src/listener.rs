//! Listener plumbing.
//!
//! Listeners are plain closures. A synchronous listener runs inline on the
//! dispatching shard's flow; an asynchronous listener returns a future that
//! is spawned and never awaited by the dispatcher. Both may return `()` or a
//! `Result`, and both are erased into a [`Listener`] before registration.
//!
//! ```rust,ignore
//! // Sync, infallible
//! dispatcher.subscribe(|event: EventContext<GuildUpdateEvent>| {
//!     println!("{} renamed to {}", event.guild_id(), event.guild.name);
//! })?;
//!
//! // Async, fallible
//! dispatcher.subscribe_async(|event: EventContext<BanCreateEvent>| async move {
//!     audit_log(event.user()).await?;
//!     Ok::<_, anyhow::Error>(())
//! })?;
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use gust_core::{Event, EventContext, GatewayEvent};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one listener invocation.
pub type ListenerResult = anyhow::Result<()>;

/// A predicate deciding whether a subscription sees an event.
pub type Predicate = Arc<dyn Fn(&GatewayEvent) -> bool + Send + Sync>;

// ============================================================================
// Return Values
// ============================================================================

/// Return types a listener may produce.
pub trait IntoListenerResult {
    fn into_listener_result(self) -> ListenerResult;
}

impl IntoListenerResult for () {
    fn into_listener_result(self) -> ListenerResult {
        Ok(())
    }
}

impl<E> IntoListenerResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_listener_result(self) -> ListenerResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Erased Listener
// ============================================================================

type SyncFn = dyn Fn(&GatewayEvent) -> ListenerResult + Send + Sync;
type AsyncFn = dyn Fn(GatewayEvent) -> BoxFuture<'static, ListenerResult> + Send + Sync;

/// A type-erased listener over [`GatewayEvent`].
#[derive(Clone)]
pub enum Listener {
    /// Runs inline during dispatch.
    Sync(Arc<SyncFn>),
    /// Spawned as a tracked task during dispatch.
    Async(Arc<AsyncFn>),
}

impl Listener {
    /// Wraps a synchronous listener over any event kind.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&GatewayEvent) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        Self::Sync(Arc::new(move |event: &GatewayEvent| f(event).into_listener_result()))
    }

    /// Wraps an asynchronous listener over any event kind.
    pub fn spawn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(GatewayEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoListenerResult,
    {
        Self::Async(Arc::new(
            move |event: GatewayEvent| -> BoxFuture<'static, ListenerResult> {
                let fut = f(event);
                Box::pin(async move { fut.await.into_listener_result() })
            },
        ))
    }

    /// Wraps a synchronous listener for one concrete kind.
    pub fn typed<E, F, R>(f: F) -> Self
    where
        E: Event,
        F: Fn(EventContext<E>) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        Self::sync(move |event: &GatewayEvent| match E::from_gateway(event) {
            Some(inner) => f(EventContext::new(Arc::clone(inner))).into_listener_result(),
            None => Ok(()),
        })
    }

    /// Wraps an asynchronous listener for one concrete kind.
    pub fn typed_async<E, F, Fut, R>(f: F) -> Self
    where
        E: Event,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoListenerResult,
    {
        Self::Async(Arc::new(
            move |event: GatewayEvent| -> BoxFuture<'static, ListenerResult> {
                match E::from_gateway(&event) {
                    Some(inner) => {
                        let fut = f(EventContext::new(Arc::clone(inner)));
                        Box::pin(async move { fut.await.into_listener_result() })
                    }
                    None => Box::pin(async { Ok(()) }),
                }
            },
        ))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Listener::Sync"),
            Self::Async(_) => f.write_str("Listener::Async"),
        }
    }
}

// ============================================================================
// Supervised Invocation
// ============================================================================

/// How a supervised call failed.
#[derive(Debug)]
pub(crate) enum Failure {
    Error(anyhow::Error),
    Panic(String),
}

/// Runs a synchronous listener, catching panics.
pub(crate) fn call_sync(f: &SyncFn, event: &GatewayEvent) -> Result<(), Failure> {
    match catch_unwind(AssertUnwindSafe(|| f(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(Failure::Error(error)),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

/// Runs an asynchronous listener to completion, catching panics.
pub(crate) async fn call_async(f: &AsyncFn, event: GatewayEvent) -> Result<(), Failure> {
    let fut = match catch_unwind(AssertUnwindSafe(|| f(event))) {
        Ok(fut) => fut,
        Err(payload) => return Err(Failure::Panic(panic_message(payload.as_ref()))),
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(Failure::Error(error)),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

/// Evaluates a predicate; a panicking predicate counts as a failure.
pub(crate) fn check_predicate(predicate: &Predicate, event: &GatewayEvent) -> Result<bool, Failure> {
    catch_unwind(AssertUnwindSafe(|| predicate(event)))
        .map_err(|payload| Failure::Panic(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gust_core::event::GuildLeaveEvent;
    use gust_core::{ShardId, Snowflake};

    fn leave() -> GatewayEvent {
        GuildLeaveEvent {
            shard: ShardId::new(0),
            guild_id: Snowflake::new(1),
        }
        .into()
    }

    #[test]
    fn test_into_listener_result() {
        assert!(().into_listener_result().is_ok());
        assert!(Ok::<(), std::io::Error>(()).into_listener_result().is_ok());
        assert!(Err::<(), _>(anyhow::anyhow!("boom")).into_listener_result().is_err());
    }

    #[test]
    fn test_sync_panic_is_caught() {
        let listener = Listener::sync(|_: &GatewayEvent| -> () { panic!("listener exploded") });
        let Listener::Sync(f) = listener else { unreachable!() };
        match call_sync(f.as_ref(), &leave()) {
            Err(Failure::Panic(message)) => assert_eq!(message, "listener exploded"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_typed_listener_ignores_other_kinds() {
        let listener = Listener::typed(|_: EventContext<gust_core::event::GuildUpdateEvent>| {
            Err::<(), _>(anyhow::anyhow!("should not run"))
        });
        let Listener::Sync(f) = listener else { unreachable!() };
        assert!(call_sync(f.as_ref(), &leave()).is_ok());
    }

    #[tokio::test]
    async fn test_async_error_is_reported() {
        let listener = Listener::spawn(|_: GatewayEvent| async { Err::<(), _>(anyhow::anyhow!("nope")) });
        let Listener::Async(f) = listener else { unreachable!() };
        match call_async(f.as_ref(), leave()).await {
            Err(Failure::Error(error)) => assert_eq!(error.to_string(), "nope"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

//! Centralized tracing initialization for the emulator and its tools.
//!
//! Uses a thread-local subscriber so it does not collide with the global
//! subscriber that the dora runtime installs for its own logs.

use std::cell::RefCell;
use tracing::dispatcher::DefaultGuard;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

thread_local! {
    static THREAD_GUARD: RefCell<Option<DefaultGuard>> = const { RefCell::new(None) };
}

/// Initialize tracing with a thread-local subscriber.
///
/// - Respects RUST_LOG environment variable (defaults to "info")
/// - Outputs compact logs without target, file or line metadata
///
/// The returned guard must be kept in scope for the duration of the program.
///
/// # Example
/// ```no_run
/// use binpicking_lib::init_tracing;
///
/// fn main() {
///     let _guard = init_tracing();
///     // Node code here
/// }
/// ```
pub fn init_tracing() -> DefaultGuard {
    tracing::dispatcher::set_default(&tracing_dispatch())
}

/// Build the subscriber as a shareable [`Dispatch`].
///
/// Threads spawned later (runtime workers) do not inherit a thread-local
/// subscriber, so they need to install this dispatch themselves.
pub fn tracing_dispatch() -> Dispatch {
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(fmt_layer);

    Dispatch::new(subscriber)
}

/// Make `dispatch` the current thread's subscriber until
/// [`release_thread_dispatch`] runs on the same thread.
///
/// Meant for runtime `on_thread_start` hooks, where no scope can hold the
/// guard.
pub fn install_thread_dispatch(dispatch: &Dispatch) {
    // Guards restore what they replaced, so the old one goes first
    release_thread_dispatch();
    let guard = tracing::dispatcher::set_default(dispatch);
    THREAD_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));
}

/// Drop the guard left by [`install_thread_dispatch`], if any.
pub fn release_thread_dispatch() {
    let guard = THREAD_GUARD.with(|slot| slot.borrow_mut().take());
    drop(guard);
}

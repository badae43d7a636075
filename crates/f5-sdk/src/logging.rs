// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Logger handle injected into every client.
//!
//! Events are emitted with the `tracing` macros. Which subscriber receives
//! them is decided by the [`Logger`] handed to the client at construction;
//! public operations run inside [`Logger::scope`]. The default handle
//! discards everything.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Environment variable consulted by [`Logger::stderr`] when no filter is given.
pub const LOG_ENV: &str = "F5_SDK_LOG";

#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

impl Logger {
    /// Discard all events.
    pub fn noop() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Forward to whatever dispatcher is active on the calling thread.
    pub fn current() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(|dispatch| dispatch.clone()),
        }
    }

    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// Human-readable logs on stderr.
    ///
    /// `directives` uses `EnvFilter` syntax (`"f5_sdk=debug"`). When `None`,
    /// the `F5_SDK_LOG` variable is read, falling back to `info`.
    pub fn stderr(directives: Option<&str>) -> Self {
        let filter = match directives {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        };
        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(true);

        let subscriber = tracing_subscriber::Registry::default().with(fmt).with(filter);
        Self::from_dispatch(Dispatch::new(subscriber))
    }

    /// Run `f` with this logger as the thread's default dispatcher.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

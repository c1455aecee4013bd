//! The step interpreter (spec §4.6): runs one action end-to-end against a
//! [`BrowserAdapter`], applying version overrides, retry/fallback/onError,
//! recursion and resource limits, tracing and redaction, and dry-run
//! planning, to produce an [`sar_types::ActionResult`].
//!
//! Everything above the adapter seam is synchronous and deterministic
//! (expression evaluation, selector-alias lookup, param validation); only
//! [`dispatch::dispatch`] ever suspends, matching spec §5's "suspension
//! points" note.

pub mod adapter;
pub mod attempt;
pub mod context;
pub mod dispatch;
pub mod executor;
pub mod limits;
pub mod locator;
pub mod plan;
pub mod redact;
pub mod resolver;
pub mod retry;
pub mod trace;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use adapter::{AdapterError, BrowserAdapter, FindQuery, FindQueryType, WaitCondition, WaitSpec};
pub use executor::Executor;
pub use limits::Limits;
pub use locator::Locator;

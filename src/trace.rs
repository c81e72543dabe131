//! Optional instrumentation for the tick loop and matchers.
//!
//! Matching is hot-path code, so spans and events compile away entirely
//! unless the `tracing` feature is on. Call sites use `trace_span!` and
//! `trace_event!` unconditionally; the disabled arms still evaluate field
//! expressions so both builds see the same borrows.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in span guard for builds without the `tracing` feature, so call
/// sites can chain `.entered()` either way.
#[cfg(not(feature = "tracing"))]
pub(crate) struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    #[inline]
    pub(crate) fn entered(self) -> Self {
        self
    }
}

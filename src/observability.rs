use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("stratus_tutor.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("stratus_tutor.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("stratus_tutor.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("stratus_tutor.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("stratus_tutor.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("stratus_tutor.stream.bytes");
pub(crate) static STREAM_CHUNKS: Counter = Counter::new("stratus_tutor.stream.chunks");
pub(crate) static STREAM_DURATION: Moments =
    Moments::new("stratus_tutor.stream.duration_seconds");

pub(crate) static SESSION_STARTS: Counter = Counter::new("stratus_tutor.session.starts");
pub(crate) static SESSION_START_ERRORS: Counter =
    Counter::new("stratus_tutor.session.start_errors");
pub(crate) static SESSION_EXCHANGES: Counter = Counter::new("stratus_tutor.session.exchanges");
pub(crate) static SESSION_EXCHANGE_ERRORS: Counter =
    Counter::new("stratus_tutor.session.exchange_errors");
pub(crate) static SESSION_INTERRUPTS: Counter = Counter::new("stratus_tutor.session.interrupts");
pub(crate) static SESSION_REJECTED_SENDS: Counter =
    Counter::new("stratus_tutor.session.rejected_sends");
pub(crate) static SESSION_STALE_CHUNKS: Counter =
    Counter::new("stratus_tutor.session.stale_chunks");
pub(crate) static SESSION_RESETS: Counter = Counter::new("stratus_tutor.session.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_CHUNKS);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&SESSION_STARTS);
    collector.register_counter(&SESSION_START_ERRORS);
    collector.register_counter(&SESSION_EXCHANGES);
    collector.register_counter(&SESSION_EXCHANGE_ERRORS);
    collector.register_counter(&SESSION_INTERRUPTS);
    collector.register_counter(&SESSION_REJECTED_SENDS);
    collector.register_counter(&SESSION_STALE_CHUNKS);
    collector.register_counter(&SESSION_RESETS);
}

use crate::entities::{Output, ProtoStub};

/// Storage for RPC stubs keyed by service and method
///
/// Implementations must tolerate `add` while lookups are being served.
pub trait Repository: Send + Sync {
    /// Store a stub, replacing any earlier stub for the same method
    fn add(&self, stub: ProtoStub);

    /// Find the output for a method. `input` is the canonical JSON form of
    /// the decoded request and does not take part in selection.
    fn lookup(&self, service: &str, method: &str, input: Option<&str>) -> Option<Output>;
}

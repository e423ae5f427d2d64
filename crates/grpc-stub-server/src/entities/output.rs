use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

use crate::error::InvalidStub;

const CODE_NAMES: [&str; 17] = [
    "OK",
    "CANCELLED",
    "UNKNOWN",
    "INVALID_ARGUMENT",
    "DEADLINE_EXCEEDED",
    "NOT_FOUND",
    "ALREADY_EXISTS",
    "PERMISSION_DENIED",
    "RESOURCE_EXHAUSTED",
    "FAILED_PRECONDITION",
    "ABORTED",
    "OUT_OF_RANGE",
    "UNIMPLEMENTED",
    "INTERNAL",
    "UNAVAILABLE",
    "DATA_LOSS",
    "UNAUTHENTICATED",
];

/// Canonical gRPC status code carried by an error stub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(i32);

impl StatusCode {
    pub const NOT_FOUND: StatusCode = StatusCode(5);
    pub const UNIMPLEMENTED: StatusCode = StatusCode(12);

    pub fn new(value: i32) -> Option<Self> {
        (0..CODE_NAMES.len() as i32)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Look up a code by its canonical name, e.g. `NOT_FOUND`
    pub fn from_name(name: &str) -> Option<Self> {
        CODE_NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|index| Self(index as i32))
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn name(self) -> &'static str {
        CODE_NAMES[self.0 as usize]
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i32),
            Name(String),
        }

        let code = match Repr::deserialize(deserializer)? {
            Repr::Number(value) => StatusCode::new(value).ok_or(value.to_string()),
            Repr::Name(name) => StatusCode::from_name(&name).ok_or(name),
        };
        code.map_err(|raw| serde::de::Error::custom(InvalidStub::UnknownCode(raw)))
    }
}

/// Ordered responses for a server-streaming stub
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawStream")]
pub struct Stream {
    items: Vec<Value>,
    delay: Duration,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStream {
    #[serde(default)]
    data: Vec<Value>,
    /// Milliseconds to wait after each item
    #[serde(default)]
    delay: u64,
}

impl Stream {
    pub fn new(items: Vec<Value>, delay: Duration) -> Result<Self, InvalidStub> {
        if items.is_empty() {
            return Err(InvalidStub::EmptyStream);
        }
        Ok(Self { items, delay })
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl TryFrom<RawStream> for Stream {
    type Error = InvalidStub;

    fn try_from(raw: RawStream) -> Result<Self, InvalidStub> {
        Stream::new(raw.data, Duration::from_millis(raw.delay))
    }
}

/// The stored response for an RPC stub
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawOutput")]
pub enum Output {
    /// A single response message, written as protobuf JSON
    Payload(Value),
    /// A status returned to the caller as-is
    Status { code: StatusCode, message: String },
    /// A sequence of response messages
    Stream(Stream),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    data: Option<Value>,
    code: Option<StatusCode>,
    error: Option<String>,
    stream: Option<Stream>,
}

impl Output {
    pub fn payload(value: Value) -> Self {
        Output::Payload(value)
    }

    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Output::Status {
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Output::Payload(_) => "data",
            Output::Status { .. } => "error",
            Output::Stream(_) => "stream",
        }
    }
}

impl TryFrom<RawOutput> for Output {
    type Error = InvalidStub;

    fn try_from(raw: RawOutput) -> Result<Self, InvalidStub> {
        let is_status = raw.code.is_some() || raw.error.is_some();
        match (raw.data, is_status, raw.stream) {
            (Some(data), false, None) => Ok(Output::Payload(data)),
            (None, true, None) => Ok(Output::Status {
                code: raw.code.unwrap_or(StatusCode::UNIMPLEMENTED),
                message: raw.error.unwrap_or_default(),
            }),
            (None, false, Some(stream)) => Ok(Output::Stream(stream)),
            (None, false, None) => Err(InvalidStub::EmptyOutput),
            _ => Err(InvalidStub::AmbiguousOutput),
        }
    }
}

/// A stub record: the response for one method of one service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawProtoStub")]
pub struct ProtoStub {
    pub service: String,
    pub method: String,
    pub output: Output,
}

#[derive(Deserialize)]
struct RawProtoStub {
    #[serde(default)]
    service: String,
    #[serde(default)]
    method: String,
    output: Output,
}

impl ProtoStub {
    pub fn new(service: impl Into<String>, method: impl Into<String>, output: Output) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            output,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidStub> {
        if self.service.is_empty() {
            return Err(InvalidStub::MissingService);
        }
        if self.method.is_empty() {
            return Err(InvalidStub::MissingMethod);
        }
        Ok(())
    }
}

impl TryFrom<RawProtoStub> for ProtoStub {
    type Error = InvalidStub;

    fn try_from(raw: RawProtoStub) -> Result<Self, InvalidStub> {
        let stub = ProtoStub::new(raw.service, raw.method, raw.output);
        stub.validate()?;
        Ok(stub)
    }
}

use futures::future::{self, BoxFuture, Ready};
use futures::stream::{self, BoxStream, StreamExt};
use prost_reflect::{DynamicMessage, MessageDescriptor};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tonic::server::{
    ClientStreamingService, ServerStreamingService, StreamingService, UnaryService,
};
use tonic::{Code, Request, Response, Status, Streaming};

use crate::entities::{message, MethodPath, Output};
use crate::use_cases::ports::Repository;

pub(super) type ReplyStream = BoxStream<'static, Result<DynamicMessage, Status>>;

/// One inbound call, resolved against the registry
#[derive(Clone)]
pub(super) struct Call {
    path: MethodPath,
    output: MessageDescriptor,
    stubs: Arc<dyn Repository>,
    deadline: Option<Instant>,
}

impl Call {
    pub(super) fn new(
        path: MethodPath,
        output: MessageDescriptor,
        stubs: Arc<dyn Repository>,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            path,
            output,
            stubs,
            deadline,
        }
    }

    fn lookup(&self, input: Option<&str>) -> Result<Output, Status> {
        self.stubs
            .lookup(&self.path.service, &self.path.method, input)
            .ok_or_else(|| {
                tracing::error!(service = %self.path.service, method = %self.path.method, "No stub configured");
                Status::not_found("No stub configured")
            })
    }

    fn match_key(&self, input: &DynamicMessage) -> Result<String, Status> {
        let key = message::to_json(input).map_err(|err| {
            tracing::error!(error = %err, "Failed to marshall input");
            Status::invalid_argument("Failed to marshall input")
        })?;
        tracing::info!(input = %key, "Received message");
        Ok(key)
    }

    fn reply(&self, value: &Value) -> Result<DynamicMessage, Status> {
        decode_reply(&self.output, value)
    }

    fn unary(&self, input: DynamicMessage) -> Result<DynamicMessage, Status> {
        let key = self.match_key(&input)?;
        match self.lookup(Some(&key))? {
            Output::Payload(value) => self.reply(&value),
            Output::Status { code, message } => Err(Status::new(Code::from_i32(code.value()), message)),
            Output::Stream(_) => Err(Status::unimplemented("")),
        }
    }

    fn server_stream(&self, input: DynamicMessage) -> Result<ReplyStream, Status> {
        let key = self.match_key(&input)?;
        let replies = match self.lookup(Some(&key))? {
            Output::Payload(value) => Replies::new(self.output.clone(), vec![value], Duration::ZERO, self.deadline),
            Output::Status { code, message } => {
                return Err(Status::new(Code::from_i32(code.value()), message))
            }
            Output::Stream(stream) => Replies::new(
                self.output.clone(),
                stream.items().to_vec(),
                stream.delay(),
                self.deadline,
            ),
        };
        Ok(replies.into_stream())
    }

    async fn client_stream(
        &self,
        mut inbound: Streaming<DynamicMessage>,
    ) -> Result<DynamicMessage, Status> {
        // The stub is resolved before draining so a missing stub fails fast.
        let output = self.lookup(None)?;

        loop {
            match inbound.message().await {
                Ok(Some(input)) => {
                    self.match_key(&input)?;
                }
                Ok(None) => {
                    tracing::info!("Stream closed by client");
                    break;
                }
                Err(status)
                    if matches!(status.code(), Code::Cancelled | Code::DeadlineExceeded) =>
                {
                    tracing::info!("Stream closed by client");
                    break;
                }
                Err(status) => {
                    tracing::error!(error = %status, "Failed to receive input message");
                    return Err(Status::invalid_argument("Failed to receive input message"));
                }
            }
        }

        match output {
            Output::Payload(value) => {
                let reply = self.reply(&value)?;
                tracing::info!(output = %value, "Sending success response");
                Ok(reply)
            }
            Output::Status { code, message } => {
                let status = Status::new(Code::from_i32(code.value()), message);
                tracing::info!(error = %status, "Sending error response");
                Err(status)
            }
            Output::Stream(_) => Err(Status::unimplemented("")),
        }
    }
}

fn decode_reply(descriptor: &MessageDescriptor, value: &Value) -> Result<DynamicMessage, Status> {
    message::from_json(descriptor, value).map_err(|err| {
        tracing::error!(error = %err, "Failed to unmarshal response");
        Status::internal("Failed to unmarshal response")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Send,
    Wait,
    Done,
}

/// Sends stored replies in order, pausing `delay` after each one.
///
/// Dropping the stream (client cancel or disconnect) drops any pending wait.
struct Replies {
    descriptor: MessageDescriptor,
    items: VecDeque<Value>,
    delay: Duration,
    deadline: Option<Instant>,
    phase: Phase,
}

impl Replies {
    fn new(
        descriptor: MessageDescriptor,
        items: Vec<Value>,
        delay: Duration,
        deadline: Option<Instant>,
    ) -> Self {
        Self {
            descriptor,
            items: items.into(),
            delay,
            deadline,
            phase: Phase::Send,
        }
    }

    fn into_stream(self) -> ReplyStream {
        stream::unfold(self, |mut replies| async move {
            let item = replies.next().await?;
            Some((item, replies))
        })
        .boxed()
    }

    async fn next(&mut self) -> Option<Result<DynamicMessage, Status>> {
        loop {
            match self.phase {
                Phase::Done => return None,
                Phase::Wait => {
                    if let Err(status) = self.wait().await {
                        self.phase = Phase::Done;
                        return Some(Err(status));
                    }
                    self.phase = Phase::Send;
                }
                Phase::Send => {
                    if self.expired() {
                        self.phase = Phase::Done;
                        return Some(Err(deadline_exceeded()));
                    }
                    let Some(value) = self.items.pop_front() else {
                        self.phase = Phase::Done;
                        return None;
                    };
                    let reply = decode_reply(&self.descriptor, &value);
                    self.phase = match reply {
                        Err(_) => Phase::Done,
                        Ok(_) if self.delay.is_zero() => Phase::Send,
                        Ok(_) => Phase::Wait,
                    };
                    return Some(reply);
                }
            }
        }
    }

    async fn wait(&self) -> Result<(), Status> {
        tracing::info!(delay_ms = self.delay.as_millis() as u64, "Sleeping");
        let sleep = tokio::time::sleep(self.delay);
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = tokio::time::sleep_until(deadline) => Err(deadline_exceeded()),
                _ = sleep => Ok(()),
            },
            None => {
                sleep.await;
                Ok(())
            }
        }
    }

    fn expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| deadline <= Instant::now())
    }
}

impl Drop for Replies {
    fn drop(&mut self) {
        if self.phase != Phase::Done {
            tracing::info!(remaining = self.items.len(), "Stream closed by client");
        }
    }
}

fn deadline_exceeded() -> Status {
    Status::deadline_exceeded("Deadline exceeded")
}

/// Parse a `grpc-timeout` header value such as `250m` or `3S`
pub(super) fn parse_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

pub(super) struct UnaryStub(pub(super) Call);

impl UnaryService<DynamicMessage> for UnaryStub {
    type Response = DynamicMessage;
    type Future = Ready<Result<Response<DynamicMessage>, Status>>;

    fn call(&mut self, request: Request<DynamicMessage>) -> Self::Future {
        future::ready(self.0.unary(request.into_inner()).map(Response::new))
    }
}

pub(super) struct ServerStreamStub(pub(super) Call);

impl ServerStreamingService<DynamicMessage> for ServerStreamStub {
    type Response = DynamicMessage;
    type ResponseStream = ReplyStream;
    type Future = Ready<Result<Response<ReplyStream>, Status>>;

    fn call(&mut self, request: Request<DynamicMessage>) -> Self::Future {
        future::ready(self.0.server_stream(request.into_inner()).map(Response::new))
    }
}

/// Bidirectional calls reply from the first inbound message and ignore the rest
pub(super) struct BidiStub(pub(super) Call);

impl StreamingService<DynamicMessage> for BidiStub {
    type Response = DynamicMessage;
    type ResponseStream = ReplyStream;
    type Future = BoxFuture<'static, Result<Response<ReplyStream>, Status>>;

    fn call(&mut self, request: Request<Streaming<DynamicMessage>>) -> Self::Future {
        let call = self.0.clone();
        Box::pin(async move {
            let mut inbound = request.into_inner();
            let input = match inbound.message().await {
                Ok(Some(input)) => input,
                Ok(None) => return Err(Status::invalid_argument("Failed to receive input message")),
                Err(status) => {
                    tracing::error!(error = %status, "Failed to receive input message");
                    return Err(Status::invalid_argument("Failed to receive input message"));
                }
            };
            call.server_stream(input).map(Response::new)
        })
    }
}

pub(super) struct ClientStreamStub(pub(super) Call);

impl ClientStreamingService<DynamicMessage> for ClientStreamStub {
    type Response = DynamicMessage;
    type Future = BoxFuture<'static, Result<Response<DynamicMessage>, Status>>;

    fn call(&mut self, request: Request<Streaming<DynamicMessage>>) -> Self::Future {
        let call = self.0.clone();
        Box::pin(async move { call.client_stream(request.into_inner()).await.map(Response::new) })
    }
}

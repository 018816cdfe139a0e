use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use wirecall_frame::{ops, Frame, DEFAULT_MAX_PAYLOAD};

use crate::error::{Result, RpcError};

/// A remote operation implementation.
///
/// Receives the raw request payload and returns the raw response payload.
/// Handlers are shared read-only across all worker threads.
pub trait Handler: Send + Sync {
    fn handle(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

impl<F> Handler for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    fn handle(&self, payload: &[u8]) -> Result<Vec<u8>> {
        self(payload)
    }
}

/// Configuration for dispatch behavior.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Simulated processing time applied to every request before the
    /// handler runs. A scheduling/testing knob, zero by default.
    pub work_delay: Duration,

    /// Upper bound on ECHO reply size. Inputs longer than the cap are
    /// truncated to it, never zero-padded.
    pub echo_reply_cap: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            work_delay: Duration::ZERO,
            echo_reply_cap: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Maps opcodes to handlers.
///
/// Populated once at startup and read-only afterward; servers share one
/// instance across all workers behind an `Arc`.
pub struct Dispatcher {
    handlers: HashMap<u32, Box<dyn Handler>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher with the built-in operations (ADD, ECHO).
    pub fn new(config: DispatcherConfig) -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
            config: config.clone(),
        };
        dispatcher.register(ops::ADD, add);
        let cap = config.echo_reply_cap;
        dispatcher.register(ops::ECHO, move |payload: &[u8]| echo(payload, cap));
        dispatcher
    }

    /// Create a dispatcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DispatcherConfig::default())
    }

    /// Register (or replace) the handler for an opcode.
    pub fn register(&mut self, opcode: u32, handler: impl Handler + 'static) {
        self.handlers.insert(opcode, Box::new(handler));
    }

    /// Returns true if this dispatcher answers the opcode.
    pub fn knows(&self, opcode: u32) -> bool {
        self.handlers.contains_key(&opcode)
    }

    /// Dispatch one request frame to its handler.
    ///
    /// The response frame echoes the request opcode. An unknown opcode or
    /// a payload violating the handler's contract is an error; the caller
    /// sends no response in that case.
    pub fn dispatch(&self, request: &Frame) -> Result<Frame> {
        if !self.config.work_delay.is_zero() {
            std::thread::sleep(self.config.work_delay);
        }

        let handler = self
            .handlers
            .get(&request.opcode)
            .ok_or(RpcError::UnknownOpcode(request.opcode))?;

        debug!(
            opcode = request.opcode,
            op = ops::op_name(request.opcode),
            len = request.payload.len(),
            "dispatching request"
        );

        let reply = handler.handle(request.payload.as_ref())?;
        Ok(Frame::new(request.opcode, reply))
    }

    /// Current dispatch configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

/// ADD: two big-endian i32 in, their sum out. Wraps on overflow.
fn add(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() != 8 {
        return Err(RpcError::BadPayload {
            opcode: ops::ADD,
            len: payload.len(),
        });
    }
    let a = i32::from_be_bytes(payload[0..4].try_into().unwrap());
    let b = i32::from_be_bytes(payload[4..8].try_into().unwrap());
    Ok(a.wrapping_add(b).to_be_bytes().to_vec())
}

/// ECHO: input copied verbatim, truncated to the reply cap.
fn echo(payload: &[u8], cap: usize) -> Result<Vec<u8>> {
    let n = payload.len().min(cap);
    Ok(payload[..n].to_vec())
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use wirecall_frame::ops::{ADD, ECHO};

    use super::*;

    fn add_frame(a: i32, b: i32) -> Frame {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&a.to_be_bytes());
        payload.extend_from_slice(&b.to_be_bytes());
        Frame::new(ADD, payload)
    }

    fn sum_of(frame: &Frame) -> i32 {
        i32::from_be_bytes(frame.payload.as_ref().try_into().unwrap())
    }

    #[test]
    fn add_sums_and_echoes_opcode() {
        let dispatcher = Dispatcher::with_defaults();
        let response = dispatcher.dispatch(&add_frame(7, 35)).unwrap();

        assert_eq!(response.opcode, ADD);
        assert_eq!(response.payload.len(), 4);
        assert_eq!(sum_of(&response), 42);
    }

    #[test]
    fn add_negative_operands() {
        let dispatcher = Dispatcher::with_defaults();
        let response = dispatcher.dispatch(&add_frame(-50, 8)).unwrap();
        assert_eq!(sum_of(&response), -42);
    }

    #[test]
    fn add_wraps_on_overflow() {
        let dispatcher = Dispatcher::with_defaults();

        let response = dispatcher.dispatch(&add_frame(i32::MAX, 1)).unwrap();
        assert_eq!(sum_of(&response), i32::MIN);

        let response = dispatcher.dispatch(&add_frame(i32::MIN, -1)).unwrap();
        assert_eq!(sum_of(&response), i32::MAX);
    }

    #[test]
    fn add_rejects_wrong_payload_length() {
        let dispatcher = Dispatcher::with_defaults();
        let err = dispatcher
            .dispatch(&Frame::new(ADD, &b"\x00\x00\x00\x01"[..]))
            .unwrap_err();
        assert!(matches!(err, RpcError::BadPayload { opcode: ADD, len: 4 }));
    }

    #[test]
    fn echo_is_identity() {
        let dispatcher = Dispatcher::with_defaults();
        let response = dispatcher.dispatch(&Frame::new(ECHO, &b"ping"[..])).unwrap();

        assert_eq!(response.opcode, ECHO);
        assert_eq!(response.payload.as_ref(), b"ping");
        assert_eq!(response.payload.len(), 4);
    }

    #[test]
    fn echo_accepts_empty_payload() {
        let dispatcher = Dispatcher::with_defaults();
        let response = dispatcher.dispatch(&Frame::new(ECHO, &b""[..])).unwrap();
        assert!(response.payload.is_empty());
    }

    #[test]
    fn echo_truncates_to_reply_cap_without_padding() {
        let dispatcher = Dispatcher::new(DispatcherConfig {
            echo_reply_cap: 4,
            ..DispatcherConfig::default()
        });

        let response = dispatcher
            .dispatch(&Frame::new(ECHO, &b"123456"[..]))
            .unwrap();
        assert_eq!(response.payload.as_ref(), b"1234");
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let dispatcher = Dispatcher::with_defaults();
        let err = dispatcher.dispatch(&Frame::new(99, &b""[..])).unwrap_err();
        assert!(matches!(err, RpcError::UnknownOpcode(99)));
    }

    #[test]
    fn registered_handler_is_dispatched() {
        let mut dispatcher = Dispatcher::with_defaults();
        dispatcher.register(7, |payload: &[u8]| Ok(payload.iter().rev().copied().collect()));

        assert!(dispatcher.knows(7));
        let response = dispatcher.dispatch(&Frame::new(7, &b"abc"[..])).unwrap();
        assert_eq!(response.payload.as_ref(), b"cba");
    }

    #[test]
    fn work_delay_is_applied() {
        let dispatcher = Dispatcher::new(DispatcherConfig {
            work_delay: Duration::from_millis(40),
            ..DispatcherConfig::default()
        });

        let start = Instant::now();
        dispatcher.dispatch(&Frame::new(ECHO, &b"x"[..])).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}

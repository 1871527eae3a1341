use crate::common::function::FunctionCode;
use crate::config::{BufferConfig, CrcStrategy};
use crate::constants::address::BROADCAST;
use crate::constants::frame::{ADDRESS_LENGTH, MIN_FRAME_LENGTH};
use crate::error::InternalError;
use crate::exception::ExceptionCode;
use crate::serial::frame::{FrameAccumulator, RtuDisplay};
use crate::server::handler::DeviceContext;
use crate::server::request::{Reply, Request, RequestDisplay};
use crate::server::response::{ResponseDisplay, ResponseWriter};
use crate::server::statistics::Counter;
use crate::types::UnitId;

use scursor::ReadCursor;

/// Result of processing a frame addressed to this device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A normal response is ready to transmit
    Success,
    /// An exception response is ready to transmit
    Exception(ExceptionCode),
    /// A broadcast was executed, nothing will be transmitted
    ///
    /// Carries the exception the request would have been answered with, if any.
    Broadcast(Option<ExceptionCode>),
}

/// Per-transaction state: the receive accumulator and the transmit buffer
///
/// The transport feeds received bytes with [`ingest`](Self::ingest), calls
/// [`process`](Self::process) once the inter-frame silence is detected and then drains the
/// response with [`next_output_byte`](Self::next_output_byte). Every call runs to completion
/// without blocking. Several operations may serve the same device in turn, each one borrowing
/// the [`DeviceContext`] while it is attached.
pub struct Operation<'a> {
    context: Option<&'a mut DeviceContext>,
    rx: FrameAccumulator,
    tx: ResponseWriter,
    remaining: usize,
}

impl<'a> Operation<'a> {
    /// Create an operation that is not attached to any device
    pub fn new(buffers: BufferConfig) -> Result<Self, InternalError> {
        buffers.validate()?;
        Ok(Self {
            context: None,
            rx: FrameAccumulator::new(buffers.rx_capacity, CrcStrategy::default()),
            tx: ResponseWriter::new(buffers.tx_capacity),
            remaining: 0,
        })
    }

    /// Create an operation serving `context`
    pub fn with_context(
        context: &'a mut DeviceContext,
        buffers: BufferConfig,
    ) -> Result<Self, InternalError> {
        let mut operation = Self::new(buffers)?;
        operation.attach(context);
        Ok(operation)
    }

    /// Attach a device context, replacing the current one
    pub fn attach(&mut self, context: &'a mut DeviceContext) {
        self.rx.set_strategy(context.config().crc);
        self.context = Some(context);
    }

    /// Detach and return the current device context
    pub fn detach(&mut self) -> Option<&'a mut DeviceContext> {
        self.context.take()
    }

    /// The attached device context
    pub fn context(&self) -> Option<&DeviceContext> {
        self.context.as_deref()
    }

    /// Feed one received byte
    ///
    /// Fails with [`InternalError::ReceiveOverflow`] when the receive buffer fills up. The
    /// partial frame is discarded and the next byte starts a new frame.
    pub fn ingest(&mut self, byte: u8) -> Result<(), InternalError> {
        self.rx.ingest(byte)
    }

    /// Number of bytes accumulated since the last call to [`process`](Self::process)
    pub fn received_len(&self) -> usize {
        self.rx.len()
    }

    /// Validate and execute the accumulated frame, building the response
    ///
    /// The receive buffer is always emptied, except when no context is attached. Any
    /// response that was not fully drained is dropped.
    pub fn process(&mut self) -> Result<Outcome, InternalError> {
        let context = match self.context.as_deref_mut() {
            Some(x) => x,
            None => return Err(InternalError::NoContext),
        };

        self.tx.discard();
        self.remaining = 0;

        let result = Self::process_frame(context, &self.rx, &mut self.tx);
        self.rx.reset();

        if result.is_ok() {
            self.remaining = self.tx.as_slice().len();
        }

        result
    }

    /// Next response byte in wire order
    ///
    /// Fails with [`InternalError::MessageEnded`] once the whole response has been returned.
    pub fn next_output_byte(&mut self) -> Result<u8, InternalError> {
        let response = self.tx.as_slice();
        let index = response.len() - self.remaining;
        match response.get(index) {
            Some(byte) if self.remaining > 0 => {
                self.remaining -= 1;
                Ok(*byte)
            }
            _ => Err(InternalError::MessageEnded),
        }
    }

    /// Response bytes that have not been drained yet
    pub fn pending_output(&self) -> &[u8] {
        let response = self.tx.as_slice();
        &response[response.len() - self.remaining..]
    }

    /// The complete response built by the last call to [`process`](Self::process)
    pub fn response(&self) -> &[u8] {
        self.tx.as_slice()
    }

    fn process_frame(
        context: &mut DeviceContext,
        rx: &FrameAccumulator,
        tx: &mut ResponseWriter,
    ) -> Result<Outcome, InternalError> {
        let config = *context.config();
        let frame = rx.frame();

        if frame.len() < MIN_FRAME_LENGTH {
            context.count(Counter::InvalidReceived);
            tracing::warn!(
                "discarding frame of {} bytes, minimum length is {}",
                frame.len(),
                MIN_FRAME_LENGTH
            );
            return Err(InternalError::InvalidPacket(frame.len()));
        }

        context.count(Counter::AnyReceived);

        if config.decode.frame.enabled() {
            tracing::info!("RTU RX - {}", RtuDisplay::new(config.decode.frame, frame));
        }

        if rx.residual() != 0 {
            context.count(Counter::InvalidReceived);
            tracing::warn!("discarding frame with CRC residual {:#06X}", rx.residual());
            return Err(InternalError::Crc {
                residual: rx.residual(),
            });
        }

        let (address, function, payload) = match frame {
            [address, function, payload @ .., _, _] => (*address, *function, payload),
            _ => return Err(InternalError::InvalidPacket(frame.len())),
        };

        let broadcast = if address == context.address().value {
            false
        } else if address == BROADCAST {
            let accepted = FunctionCode::get(function)
                .map(FunctionCode::accepts_broadcast)
                .unwrap_or(false);
            if !accepted {
                tracing::warn!("ignoring broadcast of function code {:#04X}", function);
                return Err(InternalError::BroadcastNotSupported(function));
            }
            true
        } else {
            tracing::debug!("ignoring frame for device {}", UnitId::new(address));
            return Err(InternalError::AddressNotMatch(UnitId::new(address)));
        };

        context.count(Counter::AddressedReceived);
        tx.begin(context.address(), function)?;

        let reply = match FunctionCode::get(function) {
            None => {
                tracing::warn!("received unknown function code {:#04X}", function);
                Reply::Exception(ExceptionCode::IllegalFunction)
            }
            Some(function) if !context.serves(function, sub_function(payload)) => {
                tracing::warn!("no callback bound for {}", function);
                Reply::Unbound
            }
            Some(function) => {
                let mut cursor = ReadCursor::new(payload);
                match Request::parse(function, &mut cursor) {
                    Ok(request) => {
                        if config.decode.app.enabled() {
                            tracing::info!(
                                "PDU RX - {}",
                                RequestDisplay::new(config.decode.app, &request)
                            );
                        }
                        request.execute(context, tx)?
                    }
                    Err(ex) => {
                        tracing::warn!("malformed {} request", function);
                        Reply::Exception(ex)
                    }
                }
            }
        };

        let exception = match reply {
            Reply::Complete => None,
            Reply::Exception(ex) => Some(ex),
            Reply::Unbound => {
                context.count(Counter::InvalidReceived);
                Some(ExceptionCode::IllegalFunction)
            }
        };

        if let Some(ex) = exception {
            tx.write_exception(ex)?;
            context.count(Counter::ErrorSent);
        }

        if broadcast {
            tx.discard();
            return Ok(Outcome::Broadcast(exception));
        }

        if exception.is_none() {
            context.count(Counter::OkSent);
        }

        if config.decode.app.enabled() {
            let body = tx.as_slice().get(ADDRESS_LENGTH..).unwrap_or_default();
            tracing::info!("PDU TX - {}", ResponseDisplay::new(config.decode.app, body));
        }

        tx.finish(config.crc)?;

        if config.decode.frame.enabled() {
            tracing::info!(
                "RTU TX - {}",
                RtuDisplay::new(config.decode.frame, tx.as_slice())
            );
        }

        Ok(match exception {
            None => Outcome::Success,
            Some(ex) => Outcome::Exception(ex),
        })
    }
}

/// leading u16 of the payload, the sub-function of a diagnostics request
fn sub_function(payload: &[u8]) -> Option<u16> {
    ReadCursor::new(payload).read_u16_be().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, StatisticsConfig};
    use crate::server::handler::ReadHandler;
    use crate::types::AddressRange;

    struct Holding([u8; 10]);

    impl ReadHandler for Holding {
        fn read(&mut self, range: AddressRange) -> Result<Option<&[u8]>, ExceptionCode> {
            let begin = 2 * range.start as usize;
            let end = begin + 2 * range.count as usize;
            match self.0.get(begin..end) {
                Some(x) => Ok(Some(x)),
                None => Err(ExceptionCode::IllegalDataAddress),
            }
        }
    }

    fn device() -> DeviceContext {
        DeviceContext::new(UnitId::new(1), DeviceConfig::default())
            .with_read_holding_registers(Holding([0, 1, 0, 2, 0, 3, 0, 4, 0, 5]))
    }

    fn feed(operation: &mut Operation, frame: &[u8]) {
        for byte in frame {
            operation.ingest(*byte).unwrap();
        }
    }

    fn drain(operation: &mut Operation) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Ok(byte) = operation.next_output_byte() {
            bytes.push(byte);
        }
        bytes
    }

    #[test]
    fn detached_operation_reports_no_context() {
        let mut operation = Operation::new(BufferConfig::default()).unwrap();
        feed(&mut operation, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]);
        assert_eq!(operation.process(), Err(InternalError::NoContext));
        assert_eq!(operation.received_len(), 8);
        assert!(operation.context().is_none());
    }

    #[test]
    fn rejects_undersized_buffers() {
        assert_eq!(
            Operation::new(BufferConfig::new(8, 256)).err(),
            Some(InternalError::InsufficientWriteSpace(16, 8))
        );
    }

    #[test]
    fn drains_response_in_wire_order() {
        let mut context = device();
        let mut operation = Operation::with_context(&mut context, BufferConfig::default()).unwrap();

        feed(&mut operation, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]);
        assert_eq!(operation.process(), Ok(Outcome::Success));
        assert_eq!(operation.received_len(), 0);
        assert_eq!(operation.next_output_byte(), Ok(0x01));
        assert_eq!(
            operation.pending_output(),
            &[0x03, 0x04, 0x00, 0x01, 0x00, 0x02, 0x2A, 0x32]
        );
        assert_eq!(
            drain(&mut operation),
            vec![0x03, 0x04, 0x00, 0x01, 0x00, 0x02, 0x2A, 0x32]
        );
        assert_eq!(
            operation.next_output_byte(),
            Err(InternalError::MessageEnded)
        );
        assert_eq!(operation.response().len(), 9);
    }

    #[test]
    fn processing_again_without_new_bytes_is_invalid() {
        let mut context = device();
        let mut operation = Operation::with_context(&mut context, BufferConfig::default()).unwrap();

        feed(&mut operation, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]);
        assert_eq!(operation.process(), Ok(Outcome::Success));
        assert_eq!(operation.process(), Err(InternalError::InvalidPacket(0)));
        assert!(operation.pending_output().is_empty());

        let stats = operation.detach().unwrap().statistics().unwrap();
        assert_eq!(stats.any_received(), 1);
        assert_eq!(stats.invalid_received(), 1);
    }

    #[test]
    fn attach_applies_crc_strategy() {
        let mut context = DeviceContext::new(
            UnitId::new(1),
            DeviceConfig::default()
                .crc(CrcStrategy::Bitwise)
                .statistics(StatisticsConfig::Disabled),
        )
        .with_read_holding_registers(Holding([0; 10]));

        let mut operation = Operation::new(BufferConfig::default()).unwrap();
        operation.attach(&mut context);
        feed(&mut operation, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]);
        assert_eq!(operation.process(), Ok(Outcome::Success));
        assert_eq!(
            drain(&mut operation),
            vec![0x01, 0x03, 0x02, 0x00, 0x00, 0xB8, 0x44]
        );
    }

    #[test]
    fn exception_response_for_out_of_range_read() {
        let mut context = device();
        let mut operation = Operation::with_context(&mut context, BufferConfig::default()).unwrap();

        feed(&mut operation, &[0x01, 0x03, 0x12, 0x34, 0x00, 0x05, 0xC1, 0x7F]);
        assert_eq!(
            operation.process(),
            Ok(Outcome::Exception(ExceptionCode::IllegalDataAddress))
        );
        assert_eq!(drain(&mut operation), vec![0x01, 0x83, 0x02, 0xC0, 0xF1]);
    }
}

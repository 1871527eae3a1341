use crate::common::function::FunctionCode;
use crate::config::{DeviceConfig, StatisticsConfig};
use crate::constants;
use crate::exception::ExceptionCode;
use crate::server::statistics::{Counter, Statistics};
use crate::types::{AddressRange, UnitId};

/// Application callback that answers a read request
///
/// The engine never owns register storage, the handler returns a view of its own data
/// which is copied into the response.
pub trait ReadHandler: Send {
    /// Read `range.count` items starting at `range.start`
    ///
    /// Return `Ok(Some(bytes))` with the encoded data, `Ok(None)` if the device could not
    /// produce any data (answered as [`ExceptionCode::DeviceFailure`]) or an exception.
    fn read(&mut self, range: AddressRange) -> Result<Option<&[u8]>, ExceptionCode>;
}

/// Application callback that performs a write request
pub trait WriteHandler: Send {
    /// Write the request data
    ///
    /// For multiple writes `data` holds the bytes following the byte-count field. For single
    /// writes `range.count` carries the raw value field and `data` its two bytes.
    fn write(&mut self, range: AddressRange, data: &[u8]) -> Result<(), ExceptionCode>;
}

/// Application callback for diagnostic sub-functions the engine does not answer itself
pub trait DiagnosticHandler: Send {
    /// Answer a diagnostic sub-function, the returned word is sent back as the data field
    fn diagnostic(&mut self, sub_function: u16, data: u16) -> Result<u16, ExceptionCode>;
}

impl<F> WriteHandler for F
where
    F: FnMut(AddressRange, &[u8]) -> Result<(), ExceptionCode> + Send,
{
    fn write(&mut self, range: AddressRange, data: &[u8]) -> Result<(), ExceptionCode> {
        self(range, data)
    }
}

impl<F> DiagnosticHandler for F
where
    F: FnMut(u16, u16) -> Result<u16, ExceptionCode> + Send,
{
    fn diagnostic(&mut self, sub_function: u16, data: u16) -> Result<u16, ExceptionCode> {
        self(sub_function, data)
    }
}

/// One slave device: its address, the bound callbacks and its statistics
///
/// The context is long-lived and shared by every [`Operation`](crate::Operation) that
/// serves the device. Callbacks that are not bound answer with
/// [`ExceptionCode::IllegalFunction`].
pub struct DeviceContext {
    address: UnitId,
    config: DeviceConfig,
    read_coils: Option<Box<dyn ReadHandler>>,
    read_discrete_inputs: Option<Box<dyn ReadHandler>>,
    read_holding_registers: Option<Box<dyn ReadHandler>>,
    read_input_registers: Option<Box<dyn ReadHandler>>,
    write_single_coil: Option<Box<dyn WriteHandler>>,
    write_single_register: Option<Box<dyn WriteHandler>>,
    write_multiple_coils: Option<Box<dyn WriteHandler>>,
    write_multiple_registers: Option<Box<dyn WriteHandler>>,
    diagnostics: Option<Box<dyn DiagnosticHandler>>,
    statistics: Option<Statistics>,
}

impl DeviceContext {
    /// Create a context with no callbacks bound
    pub fn new(address: UnitId, config: DeviceConfig) -> Self {
        if address.is_broadcast() {
            tracing::warn!("device address {} is reserved for broadcast", address);
        }

        let statistics = match config.statistics {
            StatisticsConfig::Disabled => None,
            StatisticsConfig::Enabled { .. } => Some(Statistics::default()),
        };

        Self {
            address,
            config,
            read_coils: None,
            read_discrete_inputs: None,
            read_holding_registers: None,
            read_input_registers: None,
            write_single_coil: None,
            write_single_register: None,
            write_multiple_coils: None,
            write_multiple_registers: None,
            diagnostics: None,
            statistics,
        }
    }

    /// Bind the read coils (0x01) callback
    pub fn with_read_coils<T: ReadHandler + 'static>(mut self, handler: T) -> Self {
        self.read_coils = Some(Box::new(handler));
        self
    }

    /// Bind the read discrete inputs (0x02) callback
    pub fn with_read_discrete_inputs<T: ReadHandler + 'static>(mut self, handler: T) -> Self {
        self.read_discrete_inputs = Some(Box::new(handler));
        self
    }

    /// Bind the read holding registers (0x03) callback
    pub fn with_read_holding_registers<T: ReadHandler + 'static>(mut self, handler: T) -> Self {
        self.read_holding_registers = Some(Box::new(handler));
        self
    }

    /// Bind the read input registers (0x04) callback
    pub fn with_read_input_registers<T: ReadHandler + 'static>(mut self, handler: T) -> Self {
        self.read_input_registers = Some(Box::new(handler));
        self
    }

    /// Bind the write single coil (0x05) callback
    pub fn with_write_single_coil<T: WriteHandler + 'static>(mut self, handler: T) -> Self {
        self.write_single_coil = Some(Box::new(handler));
        self
    }

    /// Bind the write single register (0x06) callback
    pub fn with_write_single_register<T: WriteHandler + 'static>(mut self, handler: T) -> Self {
        self.write_single_register = Some(Box::new(handler));
        self
    }

    /// Bind the write multiple coils (0x0F) callback
    pub fn with_write_multiple_coils<T: WriteHandler + 'static>(mut self, handler: T) -> Self {
        self.write_multiple_coils = Some(Box::new(handler));
        self
    }

    /// Bind the write multiple registers (0x10) callback, the only one reachable by broadcast
    pub fn with_write_multiple_registers<T: WriteHandler + 'static>(
        mut self,
        handler: T,
    ) -> Self {
        self.write_multiple_registers = Some(Box::new(handler));
        self
    }

    /// Bind the diagnostics (0x08) callback
    pub fn with_diagnostics<T: DiagnosticHandler + 'static>(mut self, handler: T) -> Self {
        self.diagnostics = Some(Box::new(handler));
        self
    }

    /// Unicast address of the device
    pub fn address(&self) -> UnitId {
        self.address
    }

    /// Configuration the context was created with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Counters, `None` when statistics are disabled
    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub(crate) fn count(&mut self, counter: Counter) {
        if let Some(stats) = self.statistics.as_mut() {
            stats.increment(counter);
        }
    }

    /// value reported for a statistics sub-function, `None` if outside the reserved range
    pub(crate) fn statistics_value(&self, sub_function: u16) -> Option<u16> {
        let stats = self.statistics.as_ref()?;
        let base = match self.config.statistics {
            StatisticsConfig::Enabled { base_address } => base_address,
            StatisticsConfig::Disabled => return None,
        };

        let offset = sub_function.checked_sub(base)?;
        if offset >= constants::diagnostics::STATISTICS_COUNT {
            return None;
        }

        Some(
            Counter::from_offset(offset)
                .map(|counter| stats.get(counter))
                .unwrap_or(0),
        )
    }

    /// true if a request for `function` can be answered without a missing callback
    ///
    /// diagnostics are always served for the echo and statistics sub-functions, the
    /// sub-function is `None` when the frame is too short to carry one
    pub(crate) fn serves(&self, function: FunctionCode, sub_function: Option<u16>) -> bool {
        match function {
            FunctionCode::ReadCoils => self.read_coils.is_some(),
            FunctionCode::ReadDiscreteInputs => self.read_discrete_inputs.is_some(),
            FunctionCode::ReadHoldingRegisters => self.read_holding_registers.is_some(),
            FunctionCode::ReadInputRegisters => self.read_input_registers.is_some(),
            FunctionCode::WriteSingleCoil => self.write_single_coil.is_some(),
            FunctionCode::WriteSingleRegister => self.write_single_register.is_some(),
            FunctionCode::WriteMultipleCoils => self.write_multiple_coils.is_some(),
            FunctionCode::WriteMultipleRegisters => self.write_multiple_registers.is_some(),
            FunctionCode::Diagnostics => match sub_function {
                Some(constants::diagnostics::RETURN_QUERY_DATA) | None => true,
                Some(sub) => {
                    self.statistics_value(sub).is_some() || self.diagnostics.is_some()
                }
            },
        }
    }

    pub(crate) fn read_handler(
        &mut self,
        function: FunctionCode,
    ) -> Option<&mut (dyn ReadHandler + 'static)> {
        let handler = match function {
            FunctionCode::ReadCoils => &mut self.read_coils,
            FunctionCode::ReadDiscreteInputs => &mut self.read_discrete_inputs,
            FunctionCode::ReadHoldingRegisters => &mut self.read_holding_registers,
            FunctionCode::ReadInputRegisters => &mut self.read_input_registers,
            _ => return None,
        };
        handler.as_deref_mut()
    }

    pub(crate) fn write_handler(
        &mut self,
        function: FunctionCode,
    ) -> Option<&mut (dyn WriteHandler + 'static)> {
        let handler = match function {
            FunctionCode::WriteSingleCoil => &mut self.write_single_coil,
            FunctionCode::WriteSingleRegister => &mut self.write_single_register,
            FunctionCode::WriteMultipleCoils => &mut self.write_multiple_coils,
            FunctionCode::WriteMultipleRegisters => &mut self.write_multiple_registers,
            _ => return None,
        };
        handler.as_deref_mut()
    }

    pub(crate) fn diagnostic_handler(&mut self) -> Option<&mut (dyn DiagnosticHandler + 'static)> {
        self.diagnostics.as_deref_mut()
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("statistics", &self.statistics)
            .finish_non_exhaustive()
    }
}

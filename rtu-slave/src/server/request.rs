use crate::common::function::FunctionCode;
use crate::constants::diagnostics::RETURN_QUERY_DATA;
use crate::decode::AppDecodeLevel;
use crate::error::InternalError;
use crate::exception::ExceptionCode;
use crate::server::handler::DeviceContext;
use crate::server::response::ResponseWriter;
use crate::types::AddressRange;

use scursor::ReadCursor;

/// A request parsed from the payload of a validated frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Request<'a> {
    Read {
        function: FunctionCode,
        range: AddressRange,
    },
    WriteSingle {
        function: FunctionCode,
        range: AddressRange,
        value: &'a [u8],
    },
    WriteMultiple {
        function: FunctionCode,
        range: AddressRange,
        values: &'a [u8],
    },
    Diagnostic {
        sub_function: u16,
        data: u16,
    },
}

/// How a request was answered
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    /// the response body has been written
    Complete,
    /// the request must be answered with this exception
    Exception(ExceptionCode),
    /// no callback is bound for the request
    Unbound,
}

fn malformed<E>(_: E) -> ExceptionCode {
    ExceptionCode::IllegalDataValue
}

impl<'a> Request<'a> {
    /// parse the bytes following the function code, trailing bytes are ignored
    pub(crate) fn parse(
        function: FunctionCode,
        cursor: &mut ReadCursor<'a>,
    ) -> Result<Self, ExceptionCode> {
        match function {
            FunctionCode::ReadCoils
            | FunctionCode::ReadDiscreteInputs
            | FunctionCode::ReadHoldingRegisters
            | FunctionCode::ReadInputRegisters => Ok(Request::Read {
                function,
                range: parse_range(cursor)?,
            }),
            FunctionCode::WriteSingleCoil | FunctionCode::WriteSingleRegister => {
                let start = cursor.read_u16_be().map_err(malformed)?;
                let value = cursor.read_bytes(2).map_err(malformed)?;
                Ok(Request::WriteSingle {
                    function,
                    range: AddressRange::new(start, u16::from_be_bytes([value[0], value[1]])),
                    value,
                })
            }
            FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
                let range = parse_range(cursor)?;
                let byte_count = cursor.read_u8().map_err(malformed)?;
                let values = cursor.read_bytes(byte_count as usize).map_err(malformed)?;
                Ok(Request::WriteMultiple {
                    function,
                    range,
                    values,
                })
            }
            FunctionCode::Diagnostics => Ok(Request::Diagnostic {
                sub_function: cursor.read_u16_be().map_err(malformed)?,
                data: cursor.read_u16_be().map_err(malformed)?,
            }),
        }
    }

    pub(crate) fn get_function(&self) -> FunctionCode {
        match self {
            Request::Read { function, .. } => *function,
            Request::WriteSingle { function, .. } => *function,
            Request::WriteMultiple { function, .. } => *function,
            Request::Diagnostic { .. } => FunctionCode::Diagnostics,
        }
    }

    /// run the request against the bound callbacks, writing the success body
    pub(crate) fn execute(
        &self,
        context: &mut DeviceContext,
        writer: &mut ResponseWriter,
    ) -> Result<Reply, InternalError> {
        match *self {
            Request::Read { function, range } => {
                let handler = match context.read_handler(function) {
                    Some(x) => x,
                    None => return Ok(Reply::Unbound),
                };
                let data = match handler.read(range) {
                    Ok(Some(data)) => data,
                    Ok(None) => return Ok(Reply::Exception(ExceptionCode::DeviceFailure)),
                    Err(ex) => return Ok(Reply::Exception(ex)),
                };
                let length = match u8::try_from(data.len()) {
                    Ok(x) if 1 + data.len() <= writer.remaining() => x,
                    _ => {
                        tracing::warn!(
                            "{} answer of {} bytes does not fit the response frame",
                            function,
                            data.len()
                        );
                        return Ok(Reply::Exception(ExceptionCode::IllegalDataAddress));
                    }
                };
                writer.push_u8(length)?;
                writer.extend(data)?;
            }
            Request::WriteSingle {
                function,
                range,
                value: data,
            }
            | Request::WriteMultiple {
                function,
                range,
                values: data,
            } => {
                let handler = match context.write_handler(function) {
                    Some(x) => x,
                    None => return Ok(Reply::Unbound),
                };
                if let Err(ex) = handler.write(range, data) {
                    return Ok(Reply::Exception(ex));
                }
                writer.push_u16(range.start)?;
                writer.push_u16(range.count)?;
            }
            Request::Diagnostic { sub_function, data } => {
                let answer = if sub_function == RETURN_QUERY_DATA {
                    data
                } else if let Some(value) = context.statistics_value(sub_function) {
                    value
                } else {
                    let handler = match context.diagnostic_handler() {
                        Some(x) => x,
                        None => return Ok(Reply::Unbound),
                    };
                    match handler.diagnostic(sub_function, data) {
                        Ok(x) => x,
                        Err(ex) => return Ok(Reply::Exception(ex)),
                    }
                };
                writer.push_u16(sub_function)?;
                writer.push_u16(answer)?;
            }
        }

        Ok(Reply::Complete)
    }
}

fn parse_range(cursor: &mut ReadCursor) -> Result<AddressRange, ExceptionCode> {
    Ok(AddressRange::new(
        cursor.read_u16_be().map_err(malformed)?,
        cursor.read_u16_be().map_err(malformed)?,
    ))
}

pub(crate) struct RequestDisplay<'a, 'b> {
    request: &'a Request<'b>,
    level: AppDecodeLevel,
}

impl<'a, 'b> RequestDisplay<'a, 'b> {
    pub(crate) fn new(level: AppDecodeLevel, request: &'a Request<'b>) -> Self {
        Self { request, level }
    }
}

impl std::fmt::Display for RequestDisplay<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.request.get_function())?;

        if self.level.data_headers() {
            match self.request {
                Request::Read { range, .. } => {
                    write!(f, " {range}")?;
                }
                Request::WriteSingle { range, .. } => {
                    write!(f, " address: {:#06X} value: {:#06X}", range.start, range.count)?;
                }
                Request::WriteMultiple { range, values, .. } => {
                    write!(f, " {range} (byte count = {})", values.len())?;
                }
                Request::Diagnostic { sub_function, data } => {
                    write!(f, " sub-function: {sub_function:#06X} data: {data:#06X}")?;
                }
            }
        }

        if self.level.data_values() {
            if let Request::WriteMultiple { values, .. } = self.request {
                crate::common::format::format_bytes(f, values)?;
            }
        }

        Ok(())
    }
}

//! Command-line simulator that feeds hex-encoded request frames through the RTU slave engine
//!
//! The device is backed by an in-memory register bank shared by all of its callbacks, so
//! writes are visible to later reads in the same run.

use std::num::ParseIntError;
use std::sync::{Arc, Mutex};

use clap::{Parser, ValueEnum};

use rtu_slave::*;

const BANK_SIZE: usize = 100;

type WriteResult = Result<(), ExceptionCode>;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("bad hex frame: {0}")]
    BadHex(String),
    #[error("engine error: {0}")]
    Engine(#[from] InternalError),
}

#[derive(Copy, Clone, ValueEnum)]
enum AppDecode {
    Nothing,
    Function,
    Headers,
    Values,
}

#[derive(Copy, Clone, ValueEnum)]
enum FrameDecode {
    Nothing,
    Header,
    Payload,
}

#[derive(Parser)]
#[command(name = "rtu-slave-simulator")]
#[command(about = "Feeds hex-encoded Modbus RTU requests through a simulated slave device")]
struct Cli {
    #[arg(short = 'a', long, default_value = "1", help = "unit id of the simulated device")]
    address: u8,

    #[arg(short = 'c', long, help = "append the CRC to each frame before feeding it")]
    append_crc: bool,

    #[arg(long, help = "compute CRCs bit by bit instead of with the lookup table")]
    bitwise_crc: bool,

    #[arg(
        long,
        default_value = "0xAA00",
        value_parser = parse_u16,
        help = "first diagnostic sub-function of the statistics range"
    )]
    statistics_base: u16,

    #[arg(long, help = "do not keep statistics counters")]
    no_statistics: bool,

    #[arg(
        short = 'd',
        long,
        value_enum,
        default_value_t = AppDecode::Headers,
        help = "application layer decoding"
    )]
    decode: AppDecode,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value_t = FrameDecode::Nothing,
        help = "frame layer decoding"
    )]
    frame_decode: FrameDecode,

    #[arg(required = true, help = "request frames in hex, e.g. 010300000001")]
    frames: Vec<String>,
}

/// Data shared by every callback of the simulated device
struct Bank {
    coils: Vec<bool>,
    discrete_inputs: Vec<bool>,
    holding_registers: Vec<u16>,
    input_registers: Vec<u16>,
}

impl Bank {
    fn new() -> Self {
        Self {
            coils: vec![false; BANK_SIZE],
            discrete_inputs: (0..BANK_SIZE).map(|i| i % 2 == 0).collect(),
            holding_registers: vec![0; BANK_SIZE],
            input_registers: (0..BANK_SIZE as u16).collect(),
        }
    }
}

#[derive(Copy, Clone)]
enum Table {
    Coils,
    DiscreteInputs,
    HoldingRegisters,
    InputRegisters,
}

/// Serves reads of one table, encoding the values into a scratch buffer it owns
struct BankReader {
    bank: Arc<Mutex<Bank>>,
    table: Table,
    scratch: Vec<u8>,
}

impl BankReader {
    fn new(bank: &Arc<Mutex<Bank>>, table: Table) -> Self {
        Self {
            bank: bank.clone(),
            table,
            scratch: Vec::new(),
        }
    }
}

fn select<T>(values: &[T], range: AddressRange) -> Result<&[T], ExceptionCode> {
    if range.count == 0 {
        return Err(ExceptionCode::IllegalDataValue);
    }
    let start = range.start as usize;
    let end = start + range.count as usize;
    values.get(start..end).ok_or(ExceptionCode::IllegalDataAddress)
}

fn pack_bits(bits: &[bool], output: &mut Vec<u8>) {
    for chunk in bits.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, bit)| if *bit { acc | (1 << i) } else { acc });
        output.push(byte);
    }
}

impl ReadHandler for BankReader {
    fn read(&mut self, range: AddressRange) -> Result<Option<&[u8]>, ExceptionCode> {
        let bank = self.bank.lock().map_err(|_| ExceptionCode::DeviceFailure)?;
        self.scratch.clear();
        match self.table {
            Table::Coils => pack_bits(select(&bank.coils, range)?, &mut self.scratch),
            Table::DiscreteInputs => {
                pack_bits(select(&bank.discrete_inputs, range)?, &mut self.scratch)
            }
            Table::HoldingRegisters => {
                for value in select(&bank.holding_registers, range)? {
                    self.scratch.extend_from_slice(&value.to_be_bytes());
                }
            }
            Table::InputRegisters => {
                for value in select(&bank.input_registers, range)? {
                    self.scratch.extend_from_slice(&value.to_be_bytes());
                }
            }
        }
        Ok(Some(&self.scratch))
    }
}

fn create_device(address: UnitId, config: DeviceConfig, bank: &Arc<Mutex<Bank>>) -> DeviceContext {
    let single_coil = bank.clone();
    let single_register = bank.clone();
    let multiple_coils = bank.clone();
    let multiple_registers = bank.clone();

    DeviceContext::new(address, config)
        .with_read_coils(BankReader::new(bank, Table::Coils))
        .with_read_discrete_inputs(BankReader::new(bank, Table::DiscreteInputs))
        .with_read_holding_registers(BankReader::new(bank, Table::HoldingRegisters))
        .with_read_input_registers(BankReader::new(bank, Table::InputRegisters))
        .with_write_single_coil(move |range: AddressRange, _: &[u8]| -> WriteResult {
            let value = match range.count {
                0xFF00 => true,
                0x0000 => false,
                _ => return Err(ExceptionCode::IllegalDataValue),
            };
            let mut bank = single_coil.lock().map_err(|_| ExceptionCode::DeviceFailure)?;
            match bank.coils.get_mut(range.start as usize) {
                Some(coil) => *coil = value,
                None => return Err(ExceptionCode::IllegalDataAddress),
            }
            Ok(())
        })
        .with_write_single_register(move |range: AddressRange, _: &[u8]| -> WriteResult {
            let mut bank = single_register
                .lock()
                .map_err(|_| ExceptionCode::DeviceFailure)?;
            match bank.holding_registers.get_mut(range.start as usize) {
                Some(register) => *register = range.count,
                None => return Err(ExceptionCode::IllegalDataAddress),
            }
            Ok(())
        })
        .with_write_multiple_coils(move |range: AddressRange, data: &[u8]| -> WriteResult {
            let count = range.count as usize;
            if count == 0 || data.len() < count.div_ceil(8) {
                return Err(ExceptionCode::IllegalDataValue);
            }
            let mut bank = multiple_coils
                .lock()
                .map_err(|_| ExceptionCode::DeviceFailure)?;
            let start = range.start as usize;
            let coils = bank
                .coils
                .get_mut(start..start + count)
                .ok_or(ExceptionCode::IllegalDataAddress)?;
            for (i, coil) in coils.iter_mut().enumerate() {
                *coil = data[i / 8] & (1 << (i % 8)) != 0;
            }
            Ok(())
        })
        .with_write_multiple_registers(move |range: AddressRange, data: &[u8]| -> WriteResult {
            let count = range.count as usize;
            if count == 0 || data.len() != 2 * count {
                return Err(ExceptionCode::IllegalDataValue);
            }
            let mut bank = multiple_registers
                .lock()
                .map_err(|_| ExceptionCode::DeviceFailure)?;
            let start = range.start as usize;
            let registers = bank
                .holding_registers
                .get_mut(start..start + count)
                .ok_or(ExceptionCode::IllegalDataAddress)?;
            for (register, bytes) in registers.iter_mut().zip(data.chunks_exact(2)) {
                *register = u16::from_be_bytes([bytes[0], bytes[1]]);
            }
            Ok(())
        })
        .with_diagnostics(|sub_function: u16, data: u16| match sub_function {
            // restart communications, nothing to restart in the simulator
            0x0001 => Ok(data),
            _ => Err(ExceptionCode::IllegalFunction),
        })
}

fn parse_u16(value: &str) -> Result<u16, ParseIntError> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, Error> {
    let digits: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != ',')
        .collect();

    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(Error::BadHex(text.to_string()));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let byte: String = pair.iter().collect();
            u8::from_str_radix(&byte, 16).map_err(|_| Error::BadHex(text.to_string()))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<String>>()
        .join(" ")
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let app = match cli.decode {
        AppDecode::Nothing => AppDecodeLevel::Nothing,
        AppDecode::Function => AppDecodeLevel::FunctionCode,
        AppDecode::Headers => AppDecodeLevel::DataHeaders,
        AppDecode::Values => AppDecodeLevel::DataValues,
    };
    let frame = match cli.frame_decode {
        FrameDecode::Nothing => FrameDecodeLevel::Nothing,
        FrameDecode::Header => FrameDecodeLevel::Header,
        FrameDecode::Payload => FrameDecodeLevel::Payload,
    };
    let crc = if cli.bitwise_crc {
        CrcStrategy::Bitwise
    } else {
        CrcStrategy::Table
    };
    let statistics = if cli.no_statistics {
        StatisticsConfig::Disabled
    } else {
        StatisticsConfig::Enabled {
            base_address: cli.statistics_base,
        }
    };

    let config = DeviceConfig::default()
        .crc(crc)
        .statistics(statistics)
        .decode(DecodeLevel::new(app, frame));

    let bank = Arc::new(Mutex::new(Bank::new()));
    let mut device = create_device(UnitId::new(cli.address), config, &bank);
    let mut operation = Operation::with_context(&mut device, BufferConfig::default())?;

    for text in &cli.frames {
        let mut request = parse_hex(text)?;
        if cli.append_crc {
            let crc = crc16(&request);
            request.extend_from_slice(&crc.to_le_bytes());
        }

        for byte in &request {
            if let Err(err) = operation.ingest(*byte) {
                tracing::warn!("{}", err);
            }
        }

        match operation.process() {
            Ok(outcome) => {
                let mut response = Vec::new();
                while let Ok(byte) = operation.next_output_byte() {
                    response.push(byte);
                }
                match outcome {
                    Outcome::Broadcast(_) => {
                        println!("{} => (broadcast, no response)", to_hex(&request))
                    }
                    _ => println!("{} => {}", to_hex(&request), to_hex(&response)),
                }
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => println!("{} => (no response: {})", to_hex(&request), err),
        }
    }

    if let Some(stats) = operation.context().and_then(|device| device.statistics()) {
        println!(
            "statistics: any received = {} addressed = {} ok sent = {} errors sent = {} invalid = {}",
            stats.any_received(),
            stats.addressed_received(),
            stats.ok_sent(),
            stats.error_sent(),
            stats.invalid_received(),
        );
    }

    Ok(())
}

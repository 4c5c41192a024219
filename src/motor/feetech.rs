// Feetech STS3215 serial bus and per-wheel driver
//
// Protocol is similar to Dynamixel Protocol 1.0:
// Packet format: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum]
//
// Several wheels share one bus, so FeetechMotor holds the bus behind
// Rc<RefCell<..>> and is bound to its motor id by PortInit::init.

use serialport::SerialPort;
use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Write};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result as MotionResult};

use super::driver::{MotorDriver, PortInit};
use super::info::Speed;

pub const DEFAULT_BAUDRATE: u32 = 1_000_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

const HEADER: [u8; 2] = [0xFF, 0xFF];

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
}

/// RAM-area registers used for velocity control
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    OperatingMode = 33,   // 1 byte: 0=position, 1=velocity, 2=PWM, 3=step
    TorqueEnable = 40,    // 1 byte
    GoalVelocity = 46,    // 2 bytes, sign-magnitude
    Lock = 55,            // 1 byte
    PresentVelocity = 58, // 2 bytes, sign-magnitude, read-only
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatingMode {
    Position = 0,
    Velocity = 1,
}

#[derive(Debug, thiserror::Error)]
pub enum FeetechError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from motor {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for motor {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Motor {id} returned error status: 0x{status:02X}")]
    MotorError { id: u8, status: u8 },

    #[error("Timeout waiting for response from motor {id}")]
    Timeout { id: u8 },
}

pub type Result<T> = std::result::Result<T, FeetechError>;

/// Half-duplex packet bus over any byte stream (a serial port in production)
pub struct FeetechBus<P = Box<dyn SerialPort>> {
    port: P,
}

impl FeetechBus {
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening motor bus on {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }
}

impl<P: Read + Write> FeetechBus<P> {
    pub fn from_port(port: P) -> Self {
        Self { port }
    }

    /// Inverted low byte of the sum, header excluded
    fn checksum(data: &[u8]) -> u8 {
        let sum: u32 = data.iter().map(|&b| b as u32).sum();
        !(sum as u8)
    }

    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity(6 + params.len());
        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.push((params.len() + 2) as u8); // instruction + params + checksum
        packet.push(instruction as u8);
        packet.extend_from_slice(params);
        packet.push(Self::checksum(&packet[2..]));
        packet
    }

    fn transact(&mut self, id: u8, instruction: Instruction, params: &[u8]) -> Result<Vec<u8>> {
        let packet = Self::build_packet(id, instruction, params);
        self.port.write_all(&packet)?;
        self.port.flush()?;
        self.read_response(id)
    }

    /// Read a status packet and return its parameters
    fn read_response(&mut self, expected_id: u8) -> Result<Vec<u8>> {
        let mut head = [0u8; 4]; // header, id, length
        self.port.read_exact(&mut head).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                FeetechError::Timeout { id: expected_id }
            } else {
                FeetechError::Io(e)
            }
        })?;

        if head[..2] != HEADER {
            return Err(FeetechError::InvalidResponse {
                id: expected_id,
                reason: format!("Invalid header: {:02X?}", &head[..2]),
            });
        }

        let (id, length) = (head[2], head[3] as usize);
        if id != expected_id {
            return Err(FeetechError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }
        if length < 2 {
            return Err(FeetechError::InvalidResponse {
                id,
                reason: format!("Length {} too short for a status packet", length),
            });
        }

        // status byte + params + checksum
        let mut body = vec![0u8; length];
        self.port.read_exact(&mut body)?;

        let (payload, checksum) = body.split_at(length - 1);
        let mut summed = vec![id, length as u8];
        summed.extend_from_slice(payload);
        if Self::checksum(&summed) != checksum[0] {
            return Err(FeetechError::ChecksumMismatch { id });
        }

        if payload[0] != 0 {
            return Err(FeetechError::MotorError {
                id,
                status: payload[0],
            });
        }

        Ok(payload[1..].to_vec())
    }

    pub fn ping(&mut self, id: u8) -> Result<bool> {
        match self.transact(id, Instruction::Ping, &[]) {
            Ok(_) => Ok(true),
            Err(FeetechError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn write_u8(&mut self, id: u8, register: Register, value: u8) -> Result<()> {
        debug!("Write u8 to motor {}: reg={:?}, value={}", id, register, value);
        self.transact(id, Instruction::Write, &[register as u8, value])?;
        Ok(())
    }

    pub fn write_u16(&mut self, id: u8, register: Register, value: u16) -> Result<()> {
        debug!("Write u16 to motor {}: reg={:?}, value={}", id, register, value);
        let [lo, hi] = value.to_le_bytes();
        self.transact(id, Instruction::Write, &[register as u8, lo, hi])?;
        Ok(())
    }

    pub fn read_u16(&mut self, id: u8, register: Register) -> Result<u16> {
        let response = self.transact(id, Instruction::Read, &[register as u8, 2])?;
        match response.as_slice() {
            [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(FeetechError::InvalidResponse {
                id,
                reason: format!("Expected 2 bytes, got {}", response.len()),
            }),
        }
    }

    pub fn enable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 1)?;
        self.write_u8(id, Register::Lock, 1)
    }

    pub fn disable_torque(&mut self, id: u8) -> Result<()> {
        self.write_u8(id, Register::TorqueEnable, 0)?;
        self.write_u8(id, Register::Lock, 0)
    }

    /// Torque must be disabled first
    pub fn set_operating_mode(&mut self, id: u8, mode: OperatingMode) -> Result<()> {
        self.write_u8(id, Register::OperatingMode, mode as u8)
    }

    pub fn set_velocity(&mut self, id: u8, velocity: i16) -> Result<()> {
        self.write_u16(id, Register::GoalVelocity, encode_sign_magnitude(velocity))
    }

    pub fn get_velocity(&mut self, id: u8) -> Result<i16> {
        let raw = self.read_u16(id, Register::PresentVelocity)?;
        Ok(decode_sign_magnitude(raw))
    }
}

/// Bit 15 = sign (1 = negative), bits 0-14 = magnitude
fn encode_sign_magnitude(value: i16) -> u16 {
    let magnitude = value.unsigned_abs().min(0x7FFF);
    if value < 0 { 0x8000 | magnitude } else { magnitude }
}

fn decode_sign_magnitude(raw: u16) -> i16 {
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 { -magnitude } else { magnitude }
}

pub type SharedBus<P = Box<dyn SerialPort>> = Rc<RefCell<FeetechBus<P>>>;

/// One wheel on a shared Feetech bus, raw speed in steps/s
pub struct FeetechMotor<P: Read + Write = Box<dyn SerialPort>> {
    bus: SharedBus<P>,
    id: Option<u8>,
}

impl<P: Read + Write> FeetechMotor<P> {
    /// Unbound motor; call `PortInit::init` with its bus id before use
    pub fn new(bus: SharedBus<P>) -> Self {
        Self { bus, id: None }
    }

    pub fn id(&self) -> Option<u8> {
        self.id
    }

    fn bound_id(&self) -> MotionResult<u8> {
        self.id.ok_or_else(|| {
            Error::InvalidResource("Feetech motor used before being bound to a bus id".into())
        })
    }
}

impl<P: Read + Write> fmt::Debug for FeetechMotor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeetechMotor").field("id", &self.id).finish()
    }
}

impl<P: Read + Write> MotorDriver for FeetechMotor<P> {
    fn set_speed_raw(&mut self, speed: Speed) -> MotionResult<()> {
        let id = self.bound_id()?;
        let raw = speed.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        self.bus.borrow_mut().set_velocity(id, raw)?;
        Ok(())
    }

    fn speed_raw(&self) -> MotionResult<Speed> {
        let id = self.bound_id()?;
        Ok(self.bus.borrow_mut().get_velocity(id)? as Speed)
    }
}

impl<P: Read + Write> PortInit<u8> for FeetechMotor<P> {
    /// Ping the motor, switch it to velocity mode and enable torque
    fn init(&mut self, id: u8) -> MotionResult<()> {
        let mut bus = self.bus.borrow_mut();
        if !bus.ping(id)? {
            warn!("Motor {} not responding to ping", id);
            return Err(FeetechError::Timeout { id }.into());
        }

        bus.disable_torque(id)?;
        bus.set_operating_mode(id, OperatingMode::Velocity)?;
        bus.enable_torque(id)?;

        debug!("Motor {} ready for velocity control", id);
        self.id = Some(id);
        Ok(())
    }
}

impl<P: Read + Write> Drop for FeetechMotor<P> {
    fn drop(&mut self) {
        // Leave the wheel stopped when the driver goes away
        if let Some(id) = self.id {
            if let Ok(mut bus) = self.bus.try_borrow_mut() {
                if let Err(e) = bus.set_velocity(id, 0) {
                    warn!("Failed to stop motor {} on drop: {}", id, e);
                }
            }
        }
    }
}

use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};

use crate::protocol::frame::FrameError;

use super::{DiagnosticCode, Position};

/// Round fuel level to two decimals.
#[inline]
pub fn round_fuel(fuel: f64) -> f64 {
    (fuel * 100.0).round() / 100.0
}

/// Vehicle telemetry reading.
///
/// One reading is produced for every simulation tick. The reading is a
/// snapshot and is never changed after it has been assembled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Trip offset at which the reading was taken.
    pub offset: Duration,
    /// Engine speed in RPM.
    pub rpm: u16,
    /// Road speed in km/h.
    pub speed: u16,
    /// Fuel level in percent, rounded to two decimals.
    pub fuel: f64,
    /// Engine coolant temperature in degrees Celsius.
    pub engine_temperature: i16,
    /// Active diagnostic trouble code.
    pub dtc: Option<DiagnosticCode>,
    /// Vehicle position.
    pub position: Position,
}

impl Reading {
    /// Whether a diagnostic trouble code is asserted.
    #[inline]
    pub fn has_fault(&self) -> bool {
        self.dtc.is_some()
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "T+{}s RPM: {} Speed: {} km/h Fuel: {:.2}% Engine temperature: {}°C DTC: {} {}",
            self.offset.as_secs(),
            self.rpm,
            self.speed,
            self.fuel,
            self.engine_temperature,
            self.dtc
                .map(|code| code.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.position
        )
    }
}

impl TryFrom<Vec<u8>> for Reading {
    type Error = FrameError;

    fn try_from(buffer: Vec<u8>) -> Result<Self, Self::Error> {
        if buffer.len() != Self::SIZE {
            return Err(FrameError::InvalidPayload);
        }

        let mut buf = &buffer[..];

        let offset = Duration::from_millis(buf.get_u64());
        let rpm = buf.get_u16();
        let speed = buf.get_u16();
        let fuel = buf.get_f64();
        let engine_temperature = buf.get_i16();

        let mut code = [0u8; DiagnosticCode::SIZE];
        buf.copy_to_slice(&mut code);
        let dtc = if code == [0u8; DiagnosticCode::SIZE] {
            None
        } else {
            Some(DiagnosticCode::try_from(&code[..]).map_err(|_| FrameError::InvalidPayload)?)
        };

        let position = Position::new(buf.get_f64(), buf.get_f64(), buf.get_f64());

        Ok(Self {
            offset,
            rpm,
            speed,
            fuel,
            engine_temperature,
            dtc,
            position,
        })
    }
}

impl Reading {
    const SIZE: usize = 8 + 2 + 2 + 8 + 2 + DiagnosticCode::SIZE + 3 * 8;
}

impl crate::protocol::Packetize for Reading {
    const MESSAGE_TYPE: u8 = 0x50;
    const MESSAGE_SIZE: Option<usize> = Some(Self::SIZE);

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);

        buf.put_u64(self.offset.as_millis() as u64);
        buf.put_u16(self.rpm);
        buf.put_u16(self.speed);
        buf.put_f64(self.fuel);
        buf.put_i16(self.engine_temperature);
        match &self.dtc {
            Some(code) => buf.put(&code.as_bytes()[..]),
            None => buf.put(&[0u8; DiagnosticCode::SIZE][..]),
        }
        buf.put_f64(self.position.latitude);
        buf.put_f64(self.position.longitude);
        buf.put_f64(self.position.altitude);

        buf.to_vec()
    }
}

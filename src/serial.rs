use core::fmt;

use cortex_m::peripheral::ITM;
use embedded_hal::serial;

use crate::hal;

/// Text output routed to USART1, the wiring used on this board
pub type SerialUsart1 = Serial<hal::serial::Tx<hal::pac::USART1>>;

/// Output sink selected at construction time
///
/// Only these two sinks exist, so a closed enum is used instead of
/// dynamic dispatch.
enum Sink<TX> {
    /// UART transmitter
    Uart(TX),
    /// ITM stimulus port 0 (SWO trace output)
    Itm(ITM),
}

/// Byte/text output with a fixed destination
///
/// Routes all bytes either to a UART transmitter or to the ITM trace port,
/// chosen once when the instance is created. Implements [`core::fmt::Write`]
/// so it can be used with `write!`/`writeln!`.
pub struct Serial<TX> {
    sink: Sink<TX>,
}

impl<TX> Serial<TX>
where
    TX: serial::Write<u8>,
{
    /// Output through the given UART transmitter
    pub fn uart(tx: TX) -> Self {
        Self { sink: Sink::Uart(tx) }
    }

    /// Output through ITM stimulus port 0
    pub fn itm(itm: ITM) -> Self {
        Self { sink: Sink::Itm(itm) }
    }

    /// Send all bytes to the configured sink, blocking until done
    ///
    /// UART errors propagate; ITM writes cannot fail.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TX::Error> {
        match &mut self.sink {
            Sink::Uart(tx) => {
                for &byte in data {
                    nb::block!(tx.write(byte))?;
                }
            }
            Sink::Itm(itm) => cortex_m::itm::write_all(&mut itm.stim[0], data),
        }
        Ok(())
    }
}

impl<TX> fmt::Write for Serial<TX>
where
    TX: serial::Write<u8>,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

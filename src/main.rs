#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use stm32f1xx_hal as hal;
use powermon as lib;

use core::fmt::Write;

use cortex_m_rt::entry;
use hal::i2c::{BlockingI2c, Mode as I2cMode};
use hal::prelude::*;
use hal::serial::{Config, Serial};

use lib::ina226::{Averaging, ConversionTime, Ina226, Mode, DEFAULT_ADDRESS};

// Shunt fitted on the board and the largest load current we expect
const R_SHUNT: f32 = 0.1;
const MAX_CURRENT: f32 = 3.2;

#[entry]
fn main() -> ! {
    let dp = hal::pac::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(72.MHz())
        .pclk1(36.MHz())
        .freeze(&mut flash.acr);
    let mut afio = dp.AFIO.constrain();
    let mut gpioa = dp.GPIOA.split();
    let mut gpiob = dp.GPIOB.split();

    // USART1 on PA9/PA10 for readings output
    let tx_pin = gpioa.pa9.into_alternate_push_pull(&mut gpioa.crh);
    let rx_pin = gpioa.pa10;
    let uart = Serial::new(
        dp.USART1,
        (tx_pin, rx_pin),
        &mut afio.mapr,
        Config::default().baudrate(115_200.bps()),
        &clocks,
    );
    let (tx, _rx) = uart.split();
    let mut out = lib::serial::Serial::uart(tx);

    // I2C1 on PB6/PB7 to the power monitor
    let scl = gpiob.pb6.into_alternate_open_drain(&mut gpiob.crl);
    let sda = gpiob.pb7.into_alternate_open_drain(&mut gpiob.crl);
    let i2c = BlockingI2c::i2c1(
        dp.I2C1,
        (scl, sda),
        &mut afio.mapr,
        I2cMode::standard(100.kHz()),
        clocks,
        1000,
        10,
        1000,
        1000,
    );

    let mut monitor = Ina226::new(i2c, DEFAULT_ADDRESS);

    monitor
        .configure(
            Averaging::X16,
            ConversionTime::Us1100,
            ConversionTime::Us1100,
            Mode::ShuntBusContinuous,
        )
        .unwrap();
    monitor.calibrate(R_SHUNT, MAX_CURRENT).unwrap();

    let cal = monitor.calibration().unwrap();
    defmt::info!(
        "power monitor calibrated: register={=u16} max_current={=f32}A",
        cal.register_value,
        cal.max_current(),
    );

    loop {
        let volts = monitor.read_bus_voltage().unwrap();
        let amps = monitor.read_shunt_current().unwrap();
        let watts = monitor.read_bus_power().unwrap();
        writeln!(out, "{:.3} V  {:.3} A  {:.3} W\r", volts, amps, watts).ok();

        // ~1 s between readings
        cortex_m::asm::delay(72_000_000);
    }
}

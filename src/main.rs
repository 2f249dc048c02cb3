//! Line tracer firmware for an RP2040 board.
//!
//! The timer interrupt drives every sub-task, the ADC FIFO interrupt stores conversions, and the
//! foreground loop only runs the operator menu.
#![no_std]
#![no_main]
#![warn(missing_docs)]

use cortex_m::singleton;
use defmt::{debug, error, info};
#[allow(unused_imports)]
use defmt_rtt as _;
#[allow(unused_imports)]
use panic_probe as _;
use rp2040_hal::{
    adc::AdcPin,
    clocks::init_clocks_and_plls,
    entry,
    fugit::ExtU32,
    gpio::Pins,
    pac,
    pac::interrupt,
    timer::{Alarm, Alarm0},
    Adc, Sio, Timer, Watchdog,
};

use linetracer::{
    board::{BoardRobot, FifoAdc, ScanFifo},
    config::{Config, TICK_PERIOD_US},
    context::RobotContext,
    display::LogDisplay,
    input::EdgeButtons,
    interrupt::Shared,
    menu::Menu,
    pwm::PinPort,
};

/// Second-stage bootloader, from [rp2040-boot2](https://docs.rs/rp2040-boot2)
#[link_section = ".boot2"]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;
/// External high-speed crystal on the pico board is 12Mhz
pub const XOSC_FREQ_HZ: u32 = 12_000_000;

/// Robot context for access in interrupts
static ROBOT: Shared<BoardRobot> = Shared::new();
/// Alarm generating the scheduler tick
static TICK_ALARM: Shared<Alarm0> = Shared::new();

/// Device bring-up, then the foreground menu loop
#[entry]
fn main() -> ! {
    info!("Line tracer startup");
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let sio = Sio::new(pac.SIO);

    let clocks = init_clocks_and_plls(
        XOSC_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();
    let pins = Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // Motor drive lines, all low
    let port = PinPort::new([
        pins.gpio10.into_push_pull_output().into_dyn_pin(),
        pins.gpio11.into_push_pull_output().into_dyn_pin(),
        pins.gpio12.into_push_pull_output().into_dyn_pin(),
        pins.gpio13.into_push_pull_output().into_dyn_pin(),
    ]);

    let mut page_button = pins.gpio14.into_pull_up_input();
    page_button.set_schmitt_enabled(true); // Debouncing
    let mut action_button = pins.gpio15.into_pull_up_input();
    action_button.set_schmitt_enabled(true);
    let buttons = EdgeButtons::new(
        [page_button.into_dyn_pin(), action_button.into_dyn_pin()],
        true,
    );

    // Sensors on ADC0..ADC3. The FIFO is built on the first scan trigger.
    let adc = singleton!(: Adc = Adc::new(pac.ADC, &mut pac.RESETS)).unwrap();
    let sensors = [
        AdcPin::new(pins.gpio26.into_floating_input().into_dyn_pin()).unwrap(),
        AdcPin::new(pins.gpio27.into_floating_input().into_dyn_pin()).unwrap(),
        AdcPin::new(pins.gpio28.into_floating_input().into_dyn_pin()).unwrap(),
        AdcPin::new(pins.gpio29.into_floating_input().into_dyn_pin()).unwrap(),
    ];

    debug!("critical_section: transfer robot context to mutex");
    ROBOT.install(RobotContext::new(
        Config::default(),
        FifoAdc::new(ScanFifo::new(adc, sensors)),
        port,
        buttons,
    ));

    // Scheduler tick
    let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);
    let mut alarm = timer.alarm_0().unwrap();
    alarm.schedule(TICK_PERIOD_US.micros()).unwrap();
    alarm.enable_interrupt();
    TICK_ALARM.install(alarm);

    info!("System initialization complete, awaiting background calibration");
    unsafe {
        pac::NVIC::unmask(pac::Interrupt::ADC_IRQ_FIFO);
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_0);
    }

    let mut menu = Menu::new();
    let mut display = LogDisplay::new();
    loop {
        cortex_m::asm::wfi();
        match ROBOT.with(|robot| robot.service_menu(&mut menu, &mut display)) {
            Ok(Some(true)) => display.flush(),
            Ok(_) => {}
            Err(err) => error!("menu skipped: {}", err),
        }
    }
}

/// Scheduler tick. Re-arms the alarm, then runs every due sub-task.
#[interrupt]
fn TIMER_IRQ_0() {
    let rearmed = TICK_ALARM.with(|alarm| {
        alarm.clear_interrupt();
        alarm.schedule(TICK_PERIOD_US.micros())
    });
    if !matches!(rearmed, Ok(Some(Ok(())))) {
        error!("tick alarm could not be re-armed");
    }

    if let Err(err) = ROBOT.with(|robot| robot.tick()) {
        error!("tick dropped: {}", err);
    }
}

/// Group conversion complete
#[interrupt]
fn ADC_IRQ_FIFO() {
    if let Err(err) = ROBOT.with(|robot| robot.on_conversion_complete()) {
        error!("conversion dropped: {}", err);
    }
}

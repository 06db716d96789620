//! Integration tests for AS5045 driver using mocked pins.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use as5045_ssi::{As5045, Clock, Config, Direction, Error, RotarySensor};
use embedded_hal_mock::eh1::{
    MockError,
    delay::NoopDelay,
    digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
};

type Sensor = As5045<PinMock, PinMock, PinMock, NoopDelay, ScriptedClock>;

/// Clock returning pre-recorded timestamps in order.
struct ScriptedClock(VecDeque<u32>);

impl ScriptedClock {
    fn new(timestamps: &[u32]) -> Self {
        Self(timestamps.iter().copied().collect())
    }
}

impl Clock for ScriptedClock {
    fn now_micros(&mut self) -> u32 {
        self.0.pop_front().expect("clock read more often than scripted")
    }
}

/// Helper to build an 18-bit frame with even parity.
fn frame(position: u16, status: u8) -> u32 {
    let bits = (u32::from(position & 0x0FFF) << 6) | (u32::from(status & 0x1F) << 1);
    bits | (bits.count_ones() % 2)
}

/// Frame of a healthy sensor: offset compensation finished, no alarms.
fn good_frame(position: u16) -> u32 {
    frame(position, 0b1_0000)
}

/// Expected line activity, one list per pin.
#[derive(Default)]
struct Bus {
    cs: Vec<PinTransaction>,
    clk: Vec<PinTransaction>,
    data: Vec<PinTransaction>,
}

impl Bus {
    /// Chip-select deasserted, clock idle high.
    fn park(mut self) -> Self {
        self.cs.push(PinTransaction::set(PinState::High));
        self.clk.push(PinTransaction::set(PinState::High));
        self
    }

    /// One full 18-clock transaction shifting out `frame`, MSB first.
    fn read(mut self, frame: u32) -> Self {
        self.cs.push(PinTransaction::set(PinState::Low));
        self.clk.push(PinTransaction::set(PinState::Low));
        for bit in (0..18).rev() {
            self.clk.push(PinTransaction::set(PinState::High));
            let level = if (frame >> bit) & 1 == 1 {
                PinState::High
            } else {
                PinState::Low
            };
            self.data.push(PinTransaction::get(level));
            self.clk.push(PinTransaction::set(PinState::Low));
        }
        self.clk.push(PinTransaction::set(PinState::High));
        self.cs.push(PinTransaction::set(PinState::High));
        self
    }

    /// `init` parks the bus and then takes one sample.
    fn init(self, position: u16) -> Self {
        self.park().read(good_frame(position))
    }

    fn positions(self, positions: &[u16]) -> Self {
        positions
            .iter()
            .fold(self, |bus, &position| bus.read(good_frame(position)))
    }

    fn sensor(&self, clock: ScriptedClock, config: Config) -> Sensor {
        As5045::new(
            PinMock::new(&self.cs),
            PinMock::new(&self.clk),
            PinMock::new(&self.data),
            NoopDelay::new(),
            clock,
            config,
        )
    }
}

fn finish(sensor: Sensor) {
    let (mut cs, mut clk, mut data) = sensor.release();
    cs.done();
    clk.done();
    data.done();
}

fn assert_close(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn reads_frame_msb_first() {
    let raw = frame(0xA5C, 0b1_0110);
    let bus = Bus::default().read(raw);
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    let read = sensor.read_frame().unwrap();
    assert_eq!(read.raw(), raw);
    assert_eq!(read.position(), 0xA5C);
    assert!(read.ocf());
    assert!(read.lin());
    assert!(read.mag_inc());

    finish(sensor);
}

#[test]
fn extracts_12_bit_position() {
    let bus = Bus::default().positions(&[0, 0x0FFF, 0x0800]);
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    assert_eq!(sensor.raw_count().unwrap(), 0);
    assert_eq!(sensor.raw_count().unwrap(), 0x0FFF);
    assert_eq!(sensor.raw_count().unwrap(), 0x0800);

    finish(sensor);
}

#[test]
fn init_seeds_tracker_from_first_sample() {
    let bus = Bus::default().init(1234);
    let mut sensor = bus.sensor(ScriptedClock::new(&[5_000]), Config::default());

    sensor.init().unwrap();

    let tracker = sensor.tracker();
    assert_eq!(tracker.previous_raw(), 1234);
    assert_eq!(tracker.previous_timestamp(), 5_000);
    assert_eq!(tracker.full_turn_offset(), 0.0);
    assert_eq!(tracker.zero_offset(), 0);

    finish(sensor);
}

#[test]
fn tracks_wrap_through_zero() {
    let bus = Bus::default()
        .init(0)
        .positions(&[1024, 2048, 3072, 4090, 5]);
    let clock = ScriptedClock::new(&[0, 1_000, 2_000, 3_000, 4_000, 5_000]);
    let mut sensor = bus.sensor(clock, Config::default());

    sensor.init().unwrap();
    for _ in 0..4 {
        sensor.velocity().unwrap();
        assert_eq!(sensor.tracker().full_turn_offset(), 0.0);
    }

    let velocity = sensor.velocity().unwrap();
    assert_eq!(sensor.tracker().full_turn_offset(), TAU);
    assert_close(
        sensor.tracker().previous_angle(),
        TAU + 5.0 / 4096.0 * TAU,
        1e-5,
    );
    // 4090 -> 4096 + 5 is 11 counts in 1 ms
    assert_close(velocity, 11.0 / 4096.0 * TAU / 1e-3, 1e-2);

    finish(sensor);
}

#[test]
fn relative_zero_then_angle_reads_zero() {
    for direction in [Direction::Cw, Direction::Ccw] {
        let bus = Bus::default().init(100).positions(&[3000, 3000, 3000]);
        let config = Config {
            direction,
            ..Config::default()
        };
        let mut sensor = bus.sensor(ScriptedClock::new(&[0]), config);

        sensor.init().unwrap();
        let before = sensor.angle().unwrap();
        let removed = sensor.calibrate_relative_zero().unwrap();

        assert_close(removed, -before, 1e-6);
        assert_close(sensor.angle().unwrap(), 0.0, 1e-6);

        finish(sensor);
    }
}

#[test]
fn absolute_zero_restores_sensor_reference() {
    let bus = Bus::default().init(1024).positions(&[1024, 1024]);
    let mut sensor = bus.sensor(ScriptedClock::new(&[0]), Config::default());

    sensor.init().unwrap();
    sensor.calibrate_relative_zero().unwrap();

    let shift = sensor.calibrate_absolute_zero();
    assert_close(shift, -TAU / 4.0, 1e-6);
    assert_close(sensor.angle().unwrap(), TAU / 4.0, 1e-6);

    finish(sensor);
}

#[test]
fn checked_frame_accepts_healthy_sample() {
    let bus = Bus::default().read(good_frame(0x123));
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    let frame = sensor.checked_frame().unwrap();
    assert_eq!(frame.position(), 0x123);

    finish(sensor);
}

#[test]
fn checked_frame_detects_parity_error() {
    // Flip the parity bit of a valid frame
    let bad = good_frame(0x123) ^ 1;
    let bus = Bus::default().read(bad);
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    assert!(matches!(sensor.checked_frame(), Err(Error::ParityError)));

    finish(sensor);
}

#[test]
fn checked_frame_detects_sensor_status() {
    // CORDIC overflow, then offset compensation still running
    let bus = Bus::default()
        .read(frame(0x123, 0b1_1000))
        .read(frame(0x123, 0b0_0000));
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    assert!(matches!(sensor.checked_frame(), Err(Error::SensorError)));
    assert!(matches!(sensor.checked_frame(), Err(Error::SensorError)));

    finish(sensor);
}

#[test]
fn angle_ignores_frame_integrity() {
    let bus = Bus::default().init(0).read(frame(0x400, 0b0_1000) ^ 1);
    let mut sensor = bus.sensor(ScriptedClock::new(&[0]), Config::default());

    sensor.init().unwrap();
    assert_close(sensor.angle().unwrap(), TAU / 4.0, 1e-6);

    finish(sensor);
}

#[test]
fn reads_diagnostics() {
    let bus = Bus::default().read(frame(0x0FFF, 0b1_0011));
    let mut sensor = bus.sensor(ScriptedClock::new(&[]), Config::default());

    let diag = sensor.diagnostics().unwrap();
    assert_eq!(diag.raw(), 0b1_0011);
    assert!(diag.offset_comp_finished());
    assert!(!diag.magnetic_field_ok());
    assert!(!diag.is_valid());

    finish(sensor);
}

#[test]
fn close_is_idempotent() {
    let bus = Bus::default().init(0).park();
    let mut sensor = bus.sensor(ScriptedClock::new(&[0]), Config::default());

    sensor.init().unwrap();
    sensor.close().unwrap();
    sensor.close().unwrap();

    finish(sensor);
}

#[test]
fn propagates_pin_error() {
    let cs = [PinTransaction::set(PinState::Low)];
    let clk = [
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
    ];
    let data = [PinTransaction::get(PinState::High)
        .with_error(MockError::Io(std::io::ErrorKind::NotConnected))];

    let mut sensor = As5045::new(
        PinMock::new(&cs),
        PinMock::new(&clk),
        PinMock::new(&data),
        NoopDelay::new(),
        ScriptedClock::new(&[]),
        Config::default(),
    );

    assert!(matches!(sensor.angle(), Err(Error::Pin(_))));

    finish(sensor);
}

/// Zero a sensor through the capability contract only.
fn zero<S: RotarySensor>(sensor: &mut S) -> Result<f32, S::Error> {
    sensor.init()?;
    sensor.calibrate_relative_zero()?;
    sensor.angle()
}

#[test]
fn implements_rotary_sensor() {
    let bus = Bus::default().init(2000).positions(&[2001, 2001]);
    let mut sensor = bus.sensor(ScriptedClock::new(&[0]), Config::default());

    assert!(RotarySensor::has_absolute_zero(&sensor));
    assert!(!RotarySensor::needs_absolute_zero_search(&sensor));
    assert_close(zero(&mut sensor).unwrap(), 0.0, 1e-6);

    finish(sensor);
}

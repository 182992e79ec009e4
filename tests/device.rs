//! A small real-time clock driver, assembled from field descriptors
//!
//! The register map follows the DS3231: time at 0x00, two alarms, control and
//! status registers, the aging offset and a 10-bit temperature reading.

use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

use regfield::{
    Access, AddressMode, Alarm, AlarmCodec, AlarmFrequency, AlarmLayout, AlarmRegister, BitField,
    ConfigError, DateTime, DateTimeCodec, DateTimeRegister, Error, FieldConfig, I2cAccessor,
    MultiBitField, RegisterAccessor, Weekday,
};

const DEVICE_ADDRESS: u8 = 0x68;

struct Rtc<A> {
    accessor: A,
    clock: DateTimeRegister,
    alarm1: AlarmRegister,
    alarm2: AlarmRegister,
    alarm1_interrupt: BitField,
    interrupt_control: BitField,
    alarm1_flag: BitField,
    busy: BitField,
    aging_offset: MultiBitField<i8>,
    temperature: MultiBitField<i16>,
}

impl<A> Rtc<A>
where
    A: RegisterAccessor,
{
    fn new(accessor: A) -> Result<Self, ConfigError> {
        let alarm1 = AlarmCodec::new(AlarmLayout::default())?;
        let alarm2 = AlarmCodec::new(AlarmLayout {
            has_seconds: false,
            ..AlarmLayout::default()
        })?;
        let temperature = FieldConfig {
            access: Access::ReadOnly,
            register_width: 2,
            lsb_first: false,
        };

        Ok(Rtc {
            accessor,
            clock: DateTimeRegister::rw(0x00, DateTimeCodec::default()),
            alarm1: AlarmRegister::rw(0x07, alarm1),
            alarm2: AlarmRegister::rw(0x0b, alarm2),
            alarm1_interrupt: BitField::rw(0x0e, 0)?,
            interrupt_control: BitField::rw(0x0e, 2)?,
            alarm1_flag: BitField::rw(0x0f, 0)?,
            busy: BitField::ro(0x0f, 2)?,
            aging_offset: MultiBitField::rw(0x10, 0, 8)?,
            temperature: MultiBitField::new(0x11, 6, 10, temperature)?,
        })
    }

    /// Temperature in degrees Celsius
    fn temperature(&mut self) -> Result<f32, Error<A::Error>> {
        let quarters = self.temperature.get(&mut self.accessor)?;
        Ok(quarters as f32 / 4.0)
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Nack;

struct Memory {
    bytes: [u8; 0x13],
    fail: bool,
}

impl Memory {
    fn new() -> Self {
        let mut bytes = [0; 0x13];
        // Power-on state of the control register
        bytes[0x0e] = 0x1c;

        Memory { bytes, fail: false }
    }
}

impl RegisterAccessor for Memory {
    type Error = Nack;

    fn address_mode(&self) -> AddressMode {
        AddressMode::default()
    }

    fn read_register(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), Error<Nack>> {
        if self.fail {
            return Err(Error::Bus(Nack));
        }

        let start = address as usize;
        buffer.copy_from_slice(&self.bytes[start..start + buffer.len()]);
        Ok(())
    }

    fn write_register(&mut self, address: u32, buffer: &[u8]) -> Result<(), Error<Nack>> {
        if self.fail {
            return Err(Error::Bus(Nack));
        }

        let start = address as usize;
        self.bytes[start..start + buffer.len()].copy_from_slice(buffer);
        Ok(())
    }
}

fn noon() -> DateTime {
    DateTime {
        year: 2023,
        month: 12,
        day: 31,
        weekday: Weekday::Sunday,
        hour: 12,
        minute: 0,
        second: 30,
    }
}

#[test]
fn keeps_time() {
    let mut rtc = Rtc::new(Memory::new()).unwrap();

    rtc.clock.set(&mut rtc.accessor, &noon()).unwrap();

    assert_eq!(
        &rtc.accessor.bytes[..7],
        &[0x30, 0x00, 0x12, 0x07, 0x31, 0x12, 0x23]
    );
    assert_eq!(rtc.clock.get(&mut rtc.accessor).unwrap(), noon());
}

#[test]
fn sets_both_alarms() {
    let mut rtc = Rtc::new(Memory::new()).unwrap();
    let daily = Alarm::at(&noon(), AlarmFrequency::Daily);
    // The second alarm has no seconds byte.
    let weekly = Alarm {
        second: None,
        ..Alarm::at(&noon(), AlarmFrequency::Weekly)
    };

    rtc.alarm1.set(&mut rtc.accessor, &daily).unwrap();
    rtc.alarm2.set(&mut rtc.accessor, &weekly).unwrap();

    assert_eq!(&rtc.accessor.bytes[0x07..0x0b], &[0x30, 0x00, 0x12, 0x80]);
    assert_eq!(&rtc.accessor.bytes[0x0b..0x0e], &[0x00, 0x12, 0x47]);

    let alarm1 = rtc.alarm1.get(&mut rtc.accessor).unwrap();
    let alarm2 = rtc.alarm2.get(&mut rtc.accessor).unwrap();
    assert_eq!(alarm1.frequency(), AlarmFrequency::Daily);
    assert_eq!(alarm2, weekly);
    assert_eq!(alarm2.frequency(), AlarmFrequency::Weekly);

    let minutely = Alarm::at(&noon(), AlarmFrequency::Minutely);
    assert!(matches!(
        rtc.alarm2.set(&mut rtc.accessor, &minutely),
        Err(Error::ValueOutOfRange)
    ));
    assert_eq!(&rtc.accessor.bytes[0x0b..0x0e], &[0x00, 0x12, 0x47]);
}

#[test]
fn interrupt_bits_share_a_register() {
    let mut rtc = Rtc::new(Memory::new()).unwrap();

    rtc.alarm1_interrupt.set(&mut rtc.accessor, true).unwrap();

    assert_eq!(rtc.accessor.bytes[0x0e], 0x1d);
    assert!(rtc.interrupt_control.get(&mut rtc.accessor).unwrap());

    rtc.accessor.bytes[0x0f] = 0x01;
    assert!(rtc.alarm1_flag.get(&mut rtc.accessor).unwrap());
    rtc.alarm1_flag.set(&mut rtc.accessor, false).unwrap();
    assert_eq!(rtc.accessor.bytes[0x0f], 0x00);
}

#[test]
fn read_only_status_bit() {
    let mut rtc = Rtc::new(Memory::new()).unwrap();
    rtc.accessor.fail = true;

    // Rejected before the bus is touched, so the failing bus doesn't matter.
    assert!(matches!(
        rtc.busy.set(&mut rtc.accessor, true),
        Err(Error::ReadOnly)
    ));
    assert!(matches!(
        rtc.busy.get(&mut rtc.accessor),
        Err(Error::Bus(Nack))
    ));
}

#[test]
fn signed_fields() {
    let mut rtc = Rtc::new(Memory::new()).unwrap();

    rtc.aging_offset.set(&mut rtc.accessor, -3).unwrap();
    assert_eq!(rtc.accessor.bytes[0x10], 0xfd);
    assert_eq!(rtc.aging_offset.get(&mut rtc.accessor).unwrap(), -3);

    rtc.accessor.bytes[0x11] = 0x19;
    rtc.accessor.bytes[0x12] = 0x40;
    assert_eq!(rtc.temperature().unwrap(), 25.25);

    rtc.accessor.bytes[0x11] = 0xfe;
    rtc.accessor.bytes[0x12] = 0x40;
    assert_eq!(rtc.temperature().unwrap(), -1.75);
}

#[test]
fn runs_on_i2c() {
    let expectations = [
        I2cTransaction::write_read(DEVICE_ADDRESS, vec![0x0e], vec![0x1c]),
        I2cTransaction::write(DEVICE_ADDRESS, vec![0x0e, 0x1d]),
        I2cTransaction::write_read(DEVICE_ADDRESS, vec![0x11], vec![0x19, 0x40]),
    ];
    let mut i2c = I2cMock::new(&expectations);

    let accessor = I2cAccessor::new(i2c.clone(), DEVICE_ADDRESS, AddressMode::default());
    let mut rtc = Rtc::new(accessor).unwrap();

    rtc.alarm1_interrupt.set(&mut rtc.accessor, true).unwrap();
    assert_eq!(rtc.temperature().unwrap(), 25.25);

    i2c.done();
}

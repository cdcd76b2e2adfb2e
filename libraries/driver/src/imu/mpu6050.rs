use hal::{BusAdapter, BusResult};

use crate::imu::{AccelSample, AccelerometerChip};

// MPU6050 I2C addresses (depends on AD0 pin state)
pub const MPU6050_I2C_ADDR_PRIMARY: u8 = 0x68;
pub const MPU6050_I2C_ADDR_SECONDARY: u8 = 0x69;

// Register addresses
pub const MPU6050_REG_SMPLRT_DIV: u8 = 0x19;
pub const MPU6050_REG_CONFIG: u8 = 0x1A;
pub const MPU6050_REG_GYRO_CONFIG: u8 = 0x1B;
pub const MPU6050_REG_ACCEL_CONFIG: u8 = 0x1C;
pub const MPU6050_REG_INT_ENABLE: u8 = 0x38;
pub const MPU6050_REG_ACCEL_XOUT_H: u8 = 0x3B;
pub const MPU6050_REG_ACCEL_YOUT_H: u8 = 0x3D;
pub const MPU6050_REG_ACCEL_ZOUT_H: u8 = 0x3F;
pub const MPU6050_REG_GYRO_XOUT_H: u8 = 0x43;
pub const MPU6050_REG_GYRO_YOUT_H: u8 = 0x45;
pub const MPU6050_REG_GYRO_ZOUT_H: u8 = 0x47;
pub const MPU6050_REG_PWR_MGMT_1: u8 = 0x6B;

// Sample rate = gyro output rate / (1 + SMPLRT_DIV)
pub const MPU6050_SMPLRT_DIV_8: u8 = 7;

// PWR_MGMT_1: SLEEP cleared, CLKSEL = 1
pub const MPU6050_PWR_WAKE_CLKSEL_1: u8 = 0x01;

// CONFIG: digital low-pass filter setting
pub const MPU6050_DLPF_CFG_5: u8 = 0x05;

// ACCEL_CONFIG / GYRO_CONFIG full-scale selections (FS_SEL in bits 4:3)
pub const MPU6050_ACCEL_FS_2G: u8 = 0x00;
pub const MPU6050_ACCEL_FS_4G: u8 = 0x08;
pub const MPU6050_ACCEL_FS_8G: u8 = 0x10;
pub const MPU6050_ACCEL_FS_16G: u8 = 0x18;
pub const MPU6050_GYRO_FS_500DPS: u8 = 0x08;

// INT_ENABLE: data ready interrupt
pub const MPU6050_INT_DATA_RDY_EN: u8 = 0x01;

// Sensitivity at the ±2g range; each FS_SEL step halves it
const MPU6050_COUNTS_PER_G_2G: f64 = 16384.0;

/// Sensitivity at the ±8g range used by default
pub const MPU6050_COUNTS_PER_G_8G: f64 = 4096.0;

/// Accelerometer output registers in X, Y, Z order
pub const MPU6050_ACCEL_AXES: [u8; 3] = [
    MPU6050_REG_ACCEL_XOUT_H,
    MPU6050_REG_ACCEL_YOUT_H,
    MPU6050_REG_ACCEL_ZOUT_H,
];

/// Configuration for MPU6050 sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mpu6050Config {
    /// I2C address of the MPU6050 (0x68 or 0x69)
    pub i2c_addr: u8,

    /// SMPLRT_DIV register value
    pub sample_rate_div: u8,

    /// PWR_MGMT_1 register value
    pub power_mgmt: u8,

    /// CONFIG register value
    pub dlpf: u8,

    /// ACCEL_CONFIG register value; also determines the scale factor
    pub accel_range: u8,

    /// GYRO_CONFIG register value
    pub gyro_range: u8,

    /// INT_ENABLE register value
    pub int_enable: u8,
}

impl Default for Mpu6050Config {
    fn default() -> Self {
        Self {
            i2c_addr: MPU6050_I2C_ADDR_PRIMARY,
            sample_rate_div: MPU6050_SMPLRT_DIV_8,
            power_mgmt: MPU6050_PWR_WAKE_CLKSEL_1,
            dlpf: MPU6050_DLPF_CFG_5,
            accel_range: MPU6050_ACCEL_FS_8G,
            gyro_range: MPU6050_GYRO_FS_500DPS,
            int_enable: MPU6050_INT_DATA_RDY_EN,
        }
    }
}

impl Mpu6050Config {
    /// Register writes performed by initialization, in bus order
    pub fn init_sequence(&self) -> [(u8, u8); 6] {
        [
            (MPU6050_REG_SMPLRT_DIV, self.sample_rate_div),
            (MPU6050_REG_PWR_MGMT_1, self.power_mgmt),
            (MPU6050_REG_CONFIG, self.dlpf),
            (MPU6050_REG_ACCEL_CONFIG, self.accel_range),
            (MPU6050_REG_GYRO_CONFIG, self.gyro_range),
            (MPU6050_REG_INT_ENABLE, self.int_enable),
        ]
    }

    /// Counts per g for the configured accelerometer range
    pub fn counts_per_g(&self) -> f64 {
        let fs_sel = (self.accel_range >> 3) & 0x03;
        MPU6050_COUNTS_PER_G_2G / f64::from(1u16 << fs_sel)
    }
}

/// Combine a high/low register pair into a signed sample.
///
/// The device stores two's complement, high byte first: an unsigned value
/// above 32767 represents `value - 65536`.
pub fn decode_raw(high: u8, low: u8) -> i16 {
    i16::from_be_bytes([high, low])
}

/// Convert a raw sample at the ±8g range to g
pub fn raw_to_g(raw: i16) -> f64 {
    raw as f64 / MPU6050_COUNTS_PER_G_8G
}

/// Convert g at the ±8g range back to the nearest raw sample, saturating
pub fn g_to_raw(g: f64) -> i16 {
    let counts = (g * MPU6050_COUNTS_PER_G_8G).round();
    counts.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// MPU6050 accelerometer implementation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mpu6050 {
    /// MPU6050 configuration
    config: Mpu6050Config,
}

impl Default for Mpu6050 {
    fn default() -> Self {
        Self::new_with_config(Mpu6050Config::default())
    }
}

impl Mpu6050 {
    /// Create a new MPU6050 driver at `addr` with the default configuration
    pub fn new(addr: u8) -> Self {
        Self::new_with_config(Mpu6050Config {
            i2c_addr: addr,
            ..Mpu6050Config::default()
        })
    }

    /// Create a new MPU6050 driver with custom configuration
    pub fn new_with_config(config: Mpu6050Config) -> Self {
        Self { config }
    }

    /// I2C address of the device
    pub fn address(&self) -> u8 {
        self.config.i2c_addr
    }

    /// Active configuration
    pub fn config(&self) -> &Mpu6050Config {
        &self.config
    }
}

impl AccelerometerChip for Mpu6050 {
    fn initialize<B: BusAdapter>(&self, bus: &mut B) -> BusResult<()> {
        for (register, value) in self.config.init_sequence() {
            bus.write_register(self.config.i2c_addr, register, value)?;
        }
        Ok(())
    }

    fn read_axis_raw<B: BusAdapter>(&self, bus: &mut B, high_register: u8) -> BusResult<i16> {
        let high = bus.read_register(self.config.i2c_addr, high_register)?;
        let low = bus.read_register(self.config.i2c_addr, high_register.wrapping_add(1))?;
        Ok(decode_raw(high, low))
    }

    fn counts_per_g(&self) -> f64 {
        self.config.counts_per_g()
    }

    fn read_acceleration<B: BusAdapter>(&self, bus: &mut B) -> BusResult<AccelSample> {
        let [x, y, z] = MPU6050_ACCEL_AXES;
        Ok(AccelSample::new(
            self.read_axis(bus, x)?,
            self.read_axis(bus, y)?,
            self.read_axis(bus, z)?,
        ))
    }

    fn chip_name(&self) -> &'static str {
        "MPU6050"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::{MockBus, Transaction};

    fn selected_bus() -> MockBus {
        let mut bus = MockBus::fully_populated(0x70, MPU6050_I2C_ADDR_PRIMARY);
        bus.write_byte(0x70, 0x01).unwrap();
        bus.clear_transactions();
        bus
    }

    #[test]
    fn test_decode_twos_complement() {
        assert_eq!(decode_raw(0x00, 0x00), 0);
        assert_eq!(decode_raw(0x7F, 0xFF), 32767);
        assert_eq!(decode_raw(0x80, 0x00), -32768);
        assert_eq!(decode_raw(0xFF, 0xFF), -1);
        assert_eq!(decode_raw(0x10, 0x00), 4096);
    }

    #[test]
    fn test_scale_is_exact_division() {
        assert_eq!(raw_to_g(4096), 1.0);
        assert_eq!(raw_to_g(-1), -1.0 / 4096.0);
        assert_eq!(raw_to_g(0), 0.0);
        assert_eq!(raw_to_g(i16::MIN), -8.0);
    }

    #[test]
    fn test_encode_then_decode_reproduces_raw() {
        for raw in [-32768i16, -4097, -1, 0, 1, 2048, 4096, 32767] {
            let g = raw_to_g(raw);
            let [high, low] = g_to_raw(g).to_be_bytes();
            assert_eq!(decode_raw(high, low), raw, "raw {} via {} g", raw, g);
        }
        assert_eq!(g_to_raw(100.0), i16::MAX, "out of range should saturate");
    }

    #[test]
    fn test_counts_per_g_follows_range() {
        let mut config = Mpu6050Config::default();
        assert_eq!(config.counts_per_g(), MPU6050_COUNTS_PER_G_8G);
        config.accel_range = MPU6050_ACCEL_FS_2G;
        assert_eq!(config.counts_per_g(), 16384.0);
        config.accel_range = MPU6050_ACCEL_FS_4G;
        assert_eq!(config.counts_per_g(), 8192.0);
        config.accel_range = MPU6050_ACCEL_FS_16G;
        assert_eq!(config.counts_per_g(), 2048.0);
    }

    #[test]
    fn test_initialize_writes_sequence_in_order() {
        let mut bus = selected_bus();
        let imu = Mpu6050::default();

        imu.initialize(&mut bus).unwrap();

        let expected: Vec<_> = [
            (0x19, 7),
            (0x6B, 1),
            (0x1A, 0x05),
            (0x1C, 0x10),
            (0x1B, 0x08),
            (0x38, 1),
        ]
        .iter()
        .map(|&(register, value)| Transaction::WriteRegister {
            address: 0x68,
            register,
            value,
        })
        .collect();
        assert_eq!(bus.transactions(), expected.as_slice());
    }

    #[test]
    fn test_initialize_stops_at_first_failure() {
        let mut bus = MockBus::new(0x70);
        let imu = Mpu6050::default();

        let result = imu.initialize(&mut bus);
        assert!(result.is_err());
        assert_eq!(bus.transactions().len(), 1, "no writes after the failed one");
    }

    #[test]
    fn test_read_axis_reads_high_then_low() {
        let mut bus = selected_bus();
        bus.set_pair(0, 0x68, MPU6050_REG_ACCEL_YOUT_H, 0xFF, 0xFF);
        let imu = Mpu6050::default();

        let g = imu.read_axis(&mut bus, MPU6050_REG_ACCEL_YOUT_H).unwrap();
        assert_eq!(g, -1.0 / 4096.0);
        assert_eq!(
            bus.transactions(),
            &[
                Transaction::ReadRegister { address: 0x68, register: 0x3D },
                Transaction::ReadRegister { address: 0x68, register: 0x3E },
            ]
        );
    }

    #[test]
    fn test_read_acceleration() {
        let mut bus = selected_bus();
        bus.set_pair(0, 0x68, MPU6050_REG_ACCEL_XOUT_H, 0x10, 0x00)
            .set_pair(0, 0x68, MPU6050_REG_ACCEL_YOUT_H, 0xFF, 0xFF)
            .set_pair(0, 0x68, MPU6050_REG_ACCEL_ZOUT_H, 0x00, 0x00);
        let imu = Mpu6050::default();

        let sample = imu.read_acceleration(&mut bus).unwrap();
        assert_eq!(sample.x, 1.0);
        assert_eq!(sample.y, -0.000244140625);
        assert_eq!(sample.z, 0.0);
        assert_eq!(bus.transactions().len(), 6);
    }

    #[test]
    fn test_read_failure_is_returned() {
        let mut bus = selected_bus();
        bus.fail_next_reads(1);
        let imu = Mpu6050::new(MPU6050_I2C_ADDR_PRIMARY);

        let result = imu.read_acceleration(&mut bus);
        assert_eq!(result, Err(hal::BusError::Timeout { address: 0x68 }));
    }
}

//! MPU-6050 register map (the subset this firmware touches)

/// Default I2C address with AD0 tied low
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Lowest and highest 7-bit addresses probed during a bus scan
pub const SCAN_FIRST_ADDRESS: u8 = 0x08;
pub const SCAN_LAST_ADDRESS: u8 = 0x77;

/// Value written to `PWR_MGMT_1` to clear the sleep bit
pub const WAKE: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    AccelXoutH = 0x3B,
    AccelYoutH = 0x3D,
    AccelZoutH = 0x3F,
    TempOutH = 0x41,
    GyroXoutH = 0x43,
    GyroYoutH = 0x45,
    GyroZoutH = 0x47,
    PwrMgmt1 = 0x6B,
    WhoAmI = 0x75,
}

impl Register {
    pub const ACCEL: [Register; 3] = [Self::AccelXoutH, Self::AccelYoutH, Self::AccelZoutH];
    pub const GYRO: [Register; 3] = [Self::GyroXoutH, Self::GyroYoutH, Self::GyroZoutH];

    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

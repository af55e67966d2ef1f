use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Result, VhdError};

/// VHD uses an epoch of 12:00AM, Jan 1, 2000. This is the Unix timestamp for the start of the VHD epoch.
const VHD_EPOCH_START: u64 = 9_4668_4800;

/// Seconds elapsed since the VHD epoch, saturating at both ends of the u32 range.
pub(crate) fn vhd_time() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs())
        .unwrap_or(0);

    u32::try_from(now.saturating_sub(VHD_EPOCH_START)).unwrap_or(u32::MAX)
}

/// Renders a VHD timestamp as UTC `YYYY-MM-DD HH:MM:SS`.
pub fn vhd_time_str(time: u32) -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let unix = (time as u64 + VHD_EPOCH_START) as i64;

    time::OffsetDateTime::from_unix_timestamp(unix)
        .ok()
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_else(|| String::from("UNDEFINED"))
}

pub mod footer;
pub use footer::*;

pub mod block;
pub use block::*;

pub mod dump;
pub use dump::*;

pub mod fixed;
pub use fixed::*;

#[derive(Debug, Copy, Clone, FromPrimitive, ToPrimitive, Eq, PartialEq)]
pub enum DiskType {
    None = 0,
    Deprecated1 = 1,
    FixedHardDisk = 2,
    DynamicHardDisk = 3,
    DifferencingHardDisk = 4,
    Deprecated5 = 5,
    Deprecated6 = 6,
}

impl DiskType {
    pub fn from_code(code: u32) -> Result<Self> {
        num_traits::FromPrimitive::from_u32(code).ok_or(VhdError::UnknownDiskType(code))
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

impl std::fmt::Display for DiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DiskType::None => "None",
            DiskType::Deprecated1 | DiskType::Deprecated5 | DiskType::Deprecated6 => "Reserved (deprecated)",
            DiskType::FixedHardDisk => "Fixed hard disk",
            DiskType::DynamicHardDisk => "Dynamic hard disk",
            DiskType::DifferencingHardDisk => "Differencing hard disk",
        })
    }
}

/// Creator host OS tags, stored as four ASCII bytes.
#[derive(Debug, Copy, Clone, FromPrimitive, ToPrimitive, Eq, PartialEq)]
pub enum HostOs {
    /// "Wi2k"
    Windows = 0x5769_326B,
    /// "Mac "
    Macintosh = 0x4D61_6320,
    /// "Lnux", not part of the Microsoft tag set
    Linux = 0x4C6E_7578,
}

impl HostOs {
    pub fn from_code(code: u32) -> Option<Self> {
        num_traits::FromPrimitive::from_u32(code)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Tag for the platform this crate was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::Macintosh
        } else {
            HostOs::Linux
        }
    }
}

impl std::fmt::Display for HostOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HostOs::Windows => "Windows",
            HostOs::Macintosh => "Macintosh",
            HostOs::Linux => "Linux",
        })
    }
}

/// Footer feature bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Features(pub u32);

impl Features {
    pub const NONE: Features = Features(0x0000_0000);
    pub const TEMPORARY: Features = Features(0x0000_0001);
    /// Must always be set according to the format.
    pub const RESERVED: Features = Features(0x0000_0002);
}

impl std::fmt::Display for Features {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match *self {
            Features::NONE => "No features enabled",
            Features::TEMPORARY => "Temporary",
            Features::RESERVED => "Reserved",
            _ => "UNDEFINED",
        })
    }
}

/// `major.minor`, packed on disk as `major << 16 | minor`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Self {
        Version { major, minor }
    }

    pub fn from_packed(packed: u32) -> Self {
        Version {
            major: (packed >> 16) as u16,
            minor: packed as u16,
        }
    }

    pub fn packed(self) -> u32 {
        (self.major as u32) << 16 | self.minor as u32
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

//! Create, inspect and sector-edit fixed-size VHD images.
//!
//! A fixed VHD is a raw disk image followed by a 512-byte footer that
//! identifies the format, records the size and CHS geometry, and carries a
//! one's-complement checksum of itself.
#[macro_use]
extern crate num_derive;

mod error;
pub use error::{ErrorKind, VhdError};
pub type Result<T> = std::result::Result<T, VhdError>;

pub use uuid::Uuid;

mod traits;
pub use traits::*;

mod util;
pub use util::*;

mod endian;
pub use endian::ByteOrder;

pub mod checksum;

mod geometry;
pub use geometry::*;

mod config;
pub use config::*;

mod vhd;
pub use vhd::*;

pub mod ops;

pub mod sizes {
    pub const SECTOR: u32 = 512;
    pub const SECTOR_U64: u64 = SECTOR as u64;
    pub const SECTOR_USIZE: usize = SECTOR as usize;
    pub const SECTOR_SHIFT: u32 = 9;
    pub const KIB: u64 = 1024;
    pub const MIB: u64 = 1024 * KIB;
    pub const GIB: u64 = 1024 * MIB;
}

/* Layout of a fixed disk:
 *
 * +-------------------------------------------------+
 * | Data region, `current_size` bytes               |
 * |   - LBA n lives at byte offset n * 512          |
 * |   - reads as zero until written                 |
 * +-------------------------------------------------+
 * | HD Footer (512 bytes)                           |
 * |   - 85 bytes of fields, big endian              |
 * |   - 427 bytes of zero padding                   |
 * +-------------------------------------------------+
 */

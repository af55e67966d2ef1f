use crate::{checksum, sizes, AsByteSlice, AsByteSliceMut, ByteOrder, Geometry, PlainBytes, ReadAt, Result, Uuid, VhdConfig, VhdError};
use super::{vhd_time, vhd_time_str, DiskType, Features, HostOs, Version};

/// On-disk image of the footer. Every field is kept as raw big-endian bytes.
#[repr(C, packed)]
#[derive(Copy, Clone)]
struct RawFooter {
    // Identifies original creator of the disk
    cookie: [u8; 8],
    // Feature Support
    features: [u8; 4],
    // (major,minor) version of disk file
    ff_version: [u8; 4],
    // Abs. offset from SOF to next structure
    data_offset: [u8; 8],
    // Creation time.  secs since 1/1/2000GMT
    timestamp: [u8; 4],
    // Creator application
    crtr_app: [u8; 4],
    // Creator version (major,minor)
    crtr_ver: [u8; 4],
    // Creator host OS
    crtr_os: [u8; 4],
    // Size at creation (bytes)
    orig_size: [u8; 8],
    // Current size of disk (bytes)
    curr_size: [u8; 8],
    // Disk geometry (cylinders, heads, sectors per track)
    geometry: [u8; 4],
    // Disk type
    disk_type: [u8; 4],
    // 1's comp sum of this struct
    checksum: [u8; 4],
    // Unique disk ID
    uuid: [u8; 16],
    // one-bit -- is this disk/VM in a saved state
    saved: u8,
    // padding
    reserved: [u8; 427],
}

// SAFETY: byte arrays only
unsafe impl PlainBytes for RawFooter {}

const _: () = assert!(std::mem::size_of::<RawFooter>() == FOOTER_SIZE);

pub const FOOTER_SIZE: usize = sizes::SECTOR_USIZE;

/// VHD cookie string
pub const HD_COOKIE: [u8; 8] = *b"conectix";
/// Version field in the footer
pub const HD_FF_VERSION: Version = Version::new(1, 0);
/// Data offset of a fixed disk, which has no next structure
pub const HD_FIXED_DATA_OFFSET: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Decoded footer with host-order values.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Footer {
    pub cookie: [u8; 8],
    pub features: Features,
    pub file_format_version: Version,
    pub data_offset: u64,
    pub timestamp: u32,
    pub creator_application: [u8; 4],
    pub creator_version: Version,
    pub creator_host_os: u32,
    pub original_size: u64,
    pub current_size: u64,
    pub geometry: Geometry,
    pub disk_type: DiskType,
    pub checksum: u32,
    pub unique_id: Uuid,
    /// Raw byte: 0 not saved, 1 saved, anything else kept as found.
    pub saved_state: u8,
}

impl Footer {
    /// Footer for a fresh fixed disk of `size` bytes, stamped now with a random id.
    pub fn new_fixed(size: u64, config: &VhdConfig) -> Self {
        let mut footer = Footer {
            cookie: HD_COOKIE,
            features: Features::RESERVED,
            file_format_version: HD_FF_VERSION,
            data_offset: HD_FIXED_DATA_OFFSET,
            timestamp: vhd_time(),
            creator_application: config.creator_application(),
            creator_version: config.creator_version(),
            creator_host_os: config.creator_host_os().code(),
            original_size: size,
            current_size: size,
            geometry: Geometry::with_vhd_capacity(size),
            disk_type: DiskType::FixedHardDisk,
            checksum: 0,
            unique_id: Uuid::new_v4(),
            saved_state: 0,
        };

        footer.checksum = footer.compute_checksum();
        footer
    }

    /// Packs the fields at their fixed offsets, zero-fills the padding and
    /// fills in the checksum over the result.
    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut raw = RawFooter {
            cookie: self.cookie,
            features: self.features.0.to_big_endian(),
            ff_version: self.file_format_version.packed().to_big_endian(),
            data_offset: self.data_offset.to_big_endian(),
            timestamp: self.timestamp.to_big_endian(),
            crtr_app: self.creator_application,
            crtr_ver: self.creator_version.packed().to_big_endian(),
            crtr_os: self.creator_host_os.to_big_endian(),
            orig_size: self.original_size.to_big_endian(),
            curr_size: self.current_size.to_big_endian(),
            geometry: self.geometry.to_bytes(),
            disk_type: self.disk_type.code().to_big_endian(),
            checksum: [0; 4],
            uuid: *self.unique_id.as_bytes(),
            saved: self.saved_state,
            reserved: [0; 427],
        };
        checksum::fill_in(raw.as_byte_slice_mut());

        let mut bytes = [0_u8; FOOTER_SIZE];
        bytes.copy_from_slice(raw.as_byte_slice());
        bytes
    }

    /// Decodes a footer sector. The cookie and the disk type are checked, the
    /// checksum is not; see [`Footer::verify`].
    pub fn from_bytes(bytes: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let raw = RawFooter::from_byte_slice(bytes).ok_or(VhdError::MalformedFooter("footer is not 512 bytes"))?;

        if raw.cookie != HD_COOKIE {
            return Err(VhdError::MalformedFooter("invalid cookie"));
        }

        let disk_type = DiskType::from_code(u32::from_big_endian(raw.disk_type))?;

        Ok(Footer {
            cookie: raw.cookie,
            features: Features(u32::from_big_endian(raw.features)),
            file_format_version: Version::from_packed(u32::from_big_endian(raw.ff_version)),
            data_offset: u64::from_big_endian(raw.data_offset),
            timestamp: u32::from_big_endian(raw.timestamp),
            creator_application: raw.crtr_app,
            creator_version: Version::from_packed(u32::from_big_endian(raw.crtr_ver)),
            creator_host_os: u32::from_big_endian(raw.crtr_os),
            original_size: u64::from_big_endian(raw.orig_size),
            current_size: u64::from_big_endian(raw.curr_size),
            geometry: Geometry::from_bytes(raw.geometry),
            disk_type,
            checksum: u32::from_big_endian(raw.checksum),
            unique_id: Uuid::from_bytes(raw.uuid),
            saved_state: raw.saved,
        })
    }

    /// Reads and decodes the footer sector at `pos`, optionally rejecting a bad checksum.
    pub fn read(stream: &impl ReadAt, pos: u64, verify: bool) -> Result<Self> {
        let mut bytes = [0_u8; FOOTER_SIZE];
        let readed = stream.read_full_at(pos, &mut bytes)?;
        if readed != FOOTER_SIZE {
            return Err(VhdError::ShortRead {
                lba: pos / sizes::SECTOR_U64,
                transferred: readed,
            });
        }

        let footer = Self::from_bytes(&bytes)?;
        if verify {
            let computed = checksum::compute(&bytes);
            if footer.checksum != computed {
                return Err(VhdError::ChecksumMismatch {
                    stored: footer.checksum,
                    computed,
                });
            }
        } else if !checksum::verify(&bytes) {
            tracing::warn!(checksum = footer.checksum, "accepting footer without a valid checksum");
        }

        Ok(footer)
    }

    pub fn compute_checksum(&self) -> u32 {
        checksum::stored(&self.to_bytes()).unwrap_or_default()
    }

    /// Whether the stored checksum matches the fields.
    pub fn verify(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    pub fn host_os(&self) -> Option<HostOs> {
        HostOs::from_code(self.creator_host_os)
    }

    /// Number of addressable 512-byte sectors in the data region.
    pub fn sector_count(&self) -> u64 {
        self.current_size / sizes::SECTOR_U64
    }

    pub fn cookie_str(&self) -> String {
        ascii_str(&self.cookie)
    }

    pub fn creator_application_str(&self) -> String {
        ascii_str(&self.creator_application)
    }
}

fn ascii_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
        .collect()
}

fn size_str(size: u64) -> String {
    let mb = size / sizes::MIB;
    let gb = size / sizes::GIB;
    if gb > 0 {
        format!("{} GB", gb)
    } else if mb > 0 {
        format!("{} MB", mb)
    } else {
        format!("{} B", size)
    }
}

impl std::fmt::Display for Footer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let host_os = match self.host_os() {
            Some(os) => os.to_string(),
            None => String::from("UNDEFINED"),
        };

        writeln!(f, "cookie: {}", self.cookie_str())?;
        writeln!(f, "features: {}", self.features)?;
        writeln!(f, "file format version: {}", self.file_format_version)?;
        writeln!(f, "data offset: {:#018x}", self.data_offset)?;
        writeln!(f, "time stamp: {:#010x} ({})", self.timestamp, vhd_time_str(self.timestamp))?;
        writeln!(f, "creator application: {}", self.creator_application_str())?;
        writeln!(f, "creator version: {}", self.creator_version)?;
        writeln!(f, "creator host os: {}", host_os)?;
        writeln!(f, "original size: {}", size_str(self.original_size))?;
        writeln!(f, "current size: {}", size_str(self.current_size))?;
        writeln!(f, "Cylinders: {}", self.geometry.cylinders)?;
        writeln!(f, "Heads: {}", self.geometry.heads)?;
        writeln!(f, "SectorsPerTrack: {}", self.geometry.sectors_per_track)?;
        writeln!(f, "disk type: {}", self.disk_type)?;
        writeln!(f, "checksum: {:#010x}", self.checksum)?;
        writeln!(f, "unique id: {}", self.unique_id.hyphenated())?;
        let saved_state = match self.saved_state {
            0 => "Not in saved state",
            1 => "In saved state",
            _ => "UNDEFINED",
        };
        writeln!(f, "saved state: {}", saved_state)
    }
}

use crate::{sizes, ByteOrder};

/// Largest sector count the CHS triple can describe (65535/16/255).
pub const MAX_CHS_SECTORS: u32 = 65535 * 16 * 255;
/// From here on the 255 sectors-per-track tier applies (about 32 GB).
pub const WIDE_TRACK_SECTORS: u32 = 65535 * 16 * 63;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    pub cylinders: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}/{}/{})", self.cylinders, self.heads, self.sectors_per_track)
    }
}

impl Geometry {
    pub fn chs(cylinders: u16, heads: u8, sectors_per_track: u8) -> Self {
        Geometry {
            cylinders,
            heads,
            sectors_per_track,
        }
    }

    pub fn with_vhd_capacity(capacity: u64) -> Self {
        let total_sectors = capacity / sizes::SECTOR_U64;
        Self::from_total_sectors(u32::try_from(total_sectors).unwrap_or(u32::MAX))
    }

    /// CHS derivation from the VHD specification, appendix "CHS calculation".
    ///
    /// The result is embedded in a checksummed footer, so it has to agree with
    /// every other implementation bit for bit. Counts too small to fill one
    /// cylinder yield zero cylinders; callers gate on a minimum size.
    pub fn from_total_sectors(total_sectors: u32) -> Self {
        let total_sectors = total_sectors.min(MAX_CHS_SECTORS);

        let (heads, sectors_per_track, cylinders_times_heads) = if total_sectors >= WIDE_TRACK_SECTORS {
            (16_u32, 255_u32, total_sectors / 255)
        } else {
            let mut sectors_per_track = 17_u32;
            let mut cylinders_times_heads = total_sectors / sectors_per_track;
            let mut heads = (cylinders_times_heads + 1023) / 1024;

            if heads < 4 {
                heads = 4;
            }

            if cylinders_times_heads >= heads * 1024 || heads > 16 {
                sectors_per_track = 31;
                heads = 16;
                cylinders_times_heads = total_sectors / sectors_per_track;
            }

            if cylinders_times_heads >= heads * 1024 {
                sectors_per_track = 63;
                heads = 16;
                cylinders_times_heads = total_sectors / sectors_per_track;
            }

            (heads, sectors_per_track, cylinders_times_heads)
        };

        // heads <= 16, sectors <= 255 and cylinders <= 65535 in every tier
        Geometry {
            cylinders: (cylinders_times_heads / heads) as u16,
            heads: heads as u8,
            sectors_per_track: sectors_per_track as u8,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity_in_sectors() * sizes::SECTOR_U64
    }

    pub fn capacity_in_sectors(&self) -> u64 {
        self.cylinders as u64 * self.heads as u64 * self.sectors_per_track as u64
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let [hi, lo] = self.cylinders.to_big_endian();
        [hi, lo, self.heads, self.sectors_per_track]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Geometry {
            cylinders: u16::from_big_endian([bytes[0], bytes[1]]),
            heads: bytes[2],
            sectors_per_track: bytes[3],
        }
    }
}

use crate::sizes;
use crate::vhd::{HostOs, Version};

/// Smallest image whose geometry still has a whole cylinder (68 sectors).
pub const DEFAULT_MIN_BYTES: u64 = 0x0000_8800;
/// Floor used by the older variant of the tool.
pub const LEGACY_MIN_BYTES: u64 = 4 * sizes::MIB;
/// Hard ceiling: sizes of this tool always fit in 32 bits.
pub const MAX_BYTES: u64 = 0xFFFF_FFFF;

/// Tunables for creating and inspecting images. Immutable once built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VhdConfig {
    min_bytes: u64,
    max_bytes: u64,
    creator_application: [u8; 4],
    creator_version: Version,
    creator_host_os: HostOs,
    verify_checksum: bool,
}

impl Default for VhdConfig {
    fn default() -> Self {
        VhdConfig {
            min_bytes: DEFAULT_MIN_BYTES,
            max_bytes: MAX_BYTES,
            creator_application: *b"rvhd",
            creator_version: Version::new(1, 0),
            creator_host_os: HostOs::current(),
            verify_checksum: true,
        }
    }
}

impl VhdConfig {
    /// Settings of the older variant: a 4 MiB floor.
    pub fn legacy() -> Self {
        Self::default().with_min_bytes(LEGACY_MIN_BYTES)
    }

    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes.min(self.max_bytes);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes.min(MAX_BYTES);
        self.min_bytes = self.min_bytes.min(self.max_bytes);
        self
    }

    pub fn with_creator_application(mut self, tag: [u8; 4]) -> Self {
        self.creator_application = tag;
        self
    }

    pub fn with_creator_version(mut self, version: Version) -> Self {
        self.creator_version = version;
        self
    }

    pub fn with_creator_host_os(mut self, host_os: HostOs) -> Self {
        self.creator_host_os = host_os;
        self
    }

    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn creator_application(&self) -> [u8; 4] {
        self.creator_application
    }

    pub fn creator_version(&self) -> Version {
        self.creator_version
    }

    pub fn creator_host_os(&self) -> HostOs {
        self.creator_host_os
    }

    pub fn verify_checksum(&self) -> bool {
        self.verify_checksum
    }
}

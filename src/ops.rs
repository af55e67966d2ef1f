//! Path-level operations a command-line front end drives.
//!
//! Each call opens what it needs, does one thing and closes it again; errors
//! come back typed so the caller picks its own reporting and exit status.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::{
    render_sector_hexdump, sizes, Disk, FixedImage, Flush, Footer, Geometry, Result, Sector, Uuid, VhdConfig,
    VhdError,
};

/// What a freshly created image looks like.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Summary {
    pub path: PathBuf,
    pub capacity: u64,
    pub sector_count: u64,
    pub max_lba: u32,
    pub geometry: Geometry,
    pub unique_id: Uuid,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "* FILE {}", self.path.display())?;
        writeln!(f, "* LBA range: 0 - {}", self.max_lba)?;
        writeln!(f, "* Geometry: {}", self.geometry)?;
        writeln!(f, "New VHD uuid: {}", self.unique_id)
    }
}

/// Footer of an image together with the file facts around it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FooterView {
    pub path: PathBuf,
    pub file_size: u64,
    pub max_lba: u32,
    pub footer: Footer,
}

impl std::fmt::Display for FooterView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "* FILE {}", self.path.display())?;
        writeln!(f, "* LBA range: 0 - {}", self.max_lba)?;
        write!(f, "{}", self.footer)
    }
}

pub fn create_image<P: AsRef<Path>>(path: P, size: u64, config: &VhdConfig) -> Result<Summary> {
    let img = FixedImage::create(path, size, config)?;

    Ok(Summary {
        path: img.path().to_path_buf(),
        capacity: img.capacity(),
        sector_count: img.sector_count(),
        max_lba: img.max_lba(),
        geometry: img.geometry(),
        unique_id: img.footer().unique_id,
    })
}

pub fn inspect_image<P: AsRef<Path>>(path: P, config: &VhdConfig) -> Result<FooterView> {
    let path = path.as_ref();
    let footer = FixedImage::inspect(path, config)?;

    Ok(FooterView {
        path: path.to_path_buf(),
        file_size: std::fs::metadata(path)?.len(),
        max_lba: u32::try_from(footer.sector_count().saturating_sub(1)).unwrap_or(u32::MAX),
        footer,
    })
}

pub fn read_sector<P: AsRef<Path>>(path: P, lba: u32, config: &VhdConfig) -> Result<Sector> {
    FixedImage::open(path, config)?.read_sector(lba)
}

/// Reads one sector and renders it the way `xxd` would, offsets relative to the image start.
pub fn dump_sector<P: AsRef<Path>>(path: P, lba: u32, config: &VhdConfig) -> Result<String> {
    let sector = read_sector(path, lba, config)?;
    Ok(render_sector_hexdump(&sector, lba as u64 * sizes::SECTOR_U64))
}

/// Copies the whole sectors of `source` into the image starting at `lba`.
///
/// The source is rejected with `OutOfBounds` if it would run past the last
/// data sector; a trailing partial sector is dropped. Returns the sectors written.
pub fn write_sector<P: AsRef<Path>, S: AsRef<Path>>(path: P, lba: u32, source: S, config: &VhdConfig) -> Result<u64> {
    let source = source.as_ref();
    let mut input = File::open(source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => VhdError::NotFound(source.to_path_buf()),
        _ => VhdError::Io(e),
    })?;
    let len = input.metadata()?.len();

    let img = FixedImage::open(path, config)?;
    img.check_range(lba, 1)?;
    let written = img.write_from(lba, &mut input, len)?;
    img.flush()?;

    Ok(written)
}

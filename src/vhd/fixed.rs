use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::*;
use crate::{sizes, Disk, Flush, Geometry, Result, VhdConfig, VhdError, VhdFile, WriteAt};

/// A fixed hard disk image: `current_size` bytes of data followed by the footer sector.
pub struct FixedImage {
    file: VhdFile,
    path: PathBuf,
    footer: Footer,
}

impl Flush for FixedImage {
    fn flush(&self) -> Result<()> {
        self.file.flush()
    }
}

impl Disk for FixedImage {
    fn geometry(&self) -> Geometry {
        self.footer.geometry
    }

    fn capacity(&self) -> u64 {
        self.footer.current_size
    }
}

fn check_size(size: u64, min: u64, max: u64) -> Result<()> {
    if size < min || size > max {
        return Err(VhdError::SizeOutOfRange { size, min, max });
    }

    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Opens `path` and reads its footer once the file length lies in `[min, max]`.
fn open_footer(path: &Path, config: &VhdConfig, writable: bool, max: u64) -> Result<(VhdFile, Footer)> {
    let file = if writable { VhdFile::open_rw(path)? } else { VhdFile::open(path)? };
    let file_size = file.size()?;

    check_size(file_size, config.min_bytes() + sizes::SECTOR_U64, max)?;

    let footer = Footer::read(&file, file_size - sizes::SECTOR_U64, config.verify_checksum())?;
    Ok((file, footer))
}

impl FixedImage {
    /// Creates a zero-filled fixed image of `size` data bytes at `path`.
    ///
    /// The image is assembled in a temporary file next to `path` and moved into
    /// place only once the footer is written, so a failure leaves nothing behind.
    pub fn create<P: AsRef<Path>>(path: P, size: u64, config: &VhdConfig) -> Result<Self> {
        let path = path.as_ref();
        if path.try_exists()? {
            return Err(VhdError::AlreadyExists(path.to_path_buf()));
        }

        check_size(size, config.min_bytes(), config.max_bytes())?;

        let dir = parent_dir(path);
        let mut builder = tempfile::Builder::new();
        builder.prefix(".rvhd-").suffix(".tmp");
        // same mode as a plain create, less the umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let temp = builder
            .tempfile_in(dir)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => VhdError::NotFound(dir.to_path_buf()),
                _ => VhdError::Io(e),
            })?;

        let file = VhdFile::from(temp.as_file().try_clone()?);
        file.set_size(size)?;

        let footer = Footer::new_fixed(size, config);
        let written = file.write_full_at(size, &footer.to_bytes())?;
        if written != FOOTER_SIZE {
            return Err(VhdError::ShortWrite {
                lba: size / sizes::SECTOR_U64,
                transferred: written,
            });
        }
        file.flush()?;

        temp.persist_noclobber(path).map_err(|e| match e.error.kind() {
            std::io::ErrorKind::AlreadyExists => VhdError::AlreadyExists(path.to_path_buf()),
            _ => VhdError::Io(e.error),
        })?;

        info!(
            path = %path.display(),
            size,
            geometry = %footer.geometry,
            uuid = %footer.unique_id,
            "created fixed vhd"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            footer,
        })
    }

    /// Reads the footer of any VHD file without opening it for sector I/O.
    pub fn inspect<P: AsRef<Path>>(path: P, config: &VhdConfig) -> Result<Footer> {
        let path = path.as_ref();
        let (_, footer) = open_footer(path, config, false, config.max_bytes())?;

        debug!(
            path = %path.display(),
            disk_type = %footer.disk_type,
            current_size = footer.current_size,
            "inspected vhd footer"
        );

        Ok(footer)
    }

    /// Opens an existing fixed image for sector reads and writes.
    ///
    /// Any image `create` accepts can be opened, so the ceiling here is the
    /// largest data region plus its footer.
    pub fn open<P: AsRef<Path>>(path: P, config: &VhdConfig) -> Result<Self> {
        let path = path.as_ref();
        let max = config.max_bytes() + sizes::SECTOR_U64;
        let (file, footer) = open_footer(path, config, true, max)?;

        if footer.disk_type != DiskType::FixedHardDisk {
            return Err(VhdError::MalformedFooter("not a fixed hard disk"));
        }

        if footer.current_size.checked_add(sizes::SECTOR_U64) != Some(file.size()?) {
            return Err(VhdError::MalformedFooter("current size does not match file length"));
        }

        debug!(path = %path.display(), sectors = footer.sector_count(), "opened fixed vhd");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            footer,
        })
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last addressable data sector.
    pub fn max_lba(&self) -> u32 {
        u32::try_from(self.sector_count().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Fails with `OutOfBounds` unless `count` sectors from `lba` lie in the data region.
    pub fn check_range(&self, lba: u32, count: u64) -> Result<()> {
        let sectors = self.sector_count();
        match (lba as u64).checked_add(count) {
            Some(end) if end <= sectors => Ok(()),
            _ => Err(VhdError::OutOfBounds {
                lba: lba as u64,
                count,
                sectors,
            }),
        }
    }

    pub fn read_sector(&self, lba: u32) -> Result<Sector> {
        self.check_range(lba, 1)?;
        block::read_sector(&self.file, lba)
    }

    pub fn write_sector(&self, lba: u32, data: &Sector) -> Result<()> {
        self.check_range(lba, 1)?;
        block::write_sector(&self.file, lba, data)
    }

    /// Copies `len` bytes of `source` into consecutive sectors from `lba`.
    ///
    /// The whole span, including a trailing partial sector, must fit the data
    /// region; only whole sectors are written. Returns the sectors written.
    pub fn write_from<R: Read>(&self, lba: u32, source: &mut R, len: u64) -> Result<u64> {
        if len == 0 {
            return Ok(0);
        }

        let span = (len - 1) / sizes::SECTOR_U64 + 1;
        self.check_range(lba, span)?;

        let whole = len / sizes::SECTOR_U64;
        let mut sector = [0_u8; sizes::SECTOR_USIZE];
        for index in 0..whole {
            let target = lba + index as u32;
            let filled = fill_sector(source, &mut sector)?;
            if filled != sizes::SECTOR_USIZE {
                return Err(VhdError::ShortRead {
                    lba: target as u64,
                    transferred: filled,
                });
            }
            block::write_sector(&self.file, target, &sector)?;
        }

        debug!(lba, sectors = whole, dropped = len % sizes::SECTOR_U64, "copied source into image");
        Ok(whole)
    }
}

/// Reads until `sector` is full or the source runs dry; returns the bytes read.
fn fill_sector<R: Read>(source: &mut R, sector: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < sector.len() {
        match source.read(&mut sector[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(filled)
}

//! Sector-addressed access to the data region of an image.
//!
//! The accessor only seeks and transfers; bounds against the image capacity
//! are the caller's job (see [`super::FixedImage`]).

use crate::{sizes, ReadAt, Result, VhdError, WriteAt};

pub type Sector = [u8; sizes::SECTOR_USIZE];

fn sector_offset(lba: u32) -> u64 {
    (lba as u64) << sizes::SECTOR_SHIFT
}

pub fn read_sector(stream: &impl ReadAt, lba: u32) -> Result<Sector> {
    let mut sector = [0_u8; sizes::SECTOR_USIZE];
    let readed = stream.read_full_at(sector_offset(lba), &mut sector)?;
    if readed != sector.len() {
        return Err(VhdError::ShortRead {
            lba: lba as u64,
            transferred: readed,
        });
    }

    tracing::trace!(lba, "read sector");
    Ok(sector)
}

pub fn write_sector(stream: &impl WriteAt, lba: u32, data: &Sector) -> Result<()> {
    let written = stream.write_full_at(sector_offset(lba), data)?;
    if written != data.len() {
        return Err(VhdError::ShortWrite {
            lba: lba as u64,
            transferred: written,
        });
    }

    tracing::trace!(lba, "wrote sector");
    Ok(())
}

use crate::{sizes, Geometry, Result};

/// Positional read. Implementors do not move any shared cursor the caller can observe.
pub trait ReadAt {
    fn read_at(&self, offset: u64, data: &mut [u8]) -> Result<usize>;

    /// Keeps reading until `data` is full or the end of the stream is hit.
    /// Returns the number of bytes actually read.
    fn read_full_at(&self, mut offset: u64, mut data: &mut [u8]) -> Result<usize> {
        let mut readed = 0_usize;
        while !data.is_empty() {
            match self.read_at(offset, data)? {
                0 => break,
                n => {
                    data = &mut data[n..];
                    offset += n as u64;
                    readed += n;
                }
            }
        }

        Ok(readed)
    }
}

pub trait WriteAt {
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize>;

    /// Keeps writing until all of `data` is accepted or the stream refuses more.
    /// Returns the number of bytes actually written.
    fn write_full_at(&self, mut offset: u64, mut data: &[u8]) -> Result<usize> {
        let mut written = 0_usize;
        while !data.is_empty() {
            match self.write_at(offset, data)? {
                0 => break,
                n => {
                    data = &data[n..];
                    offset += n as u64;
                    written += n;
                }
            }
        }

        Ok(written)
    }
}

pub trait Flush {
    fn flush(&self) -> Result<()>;
}

/// Read-only description of a disk.
pub trait Disk {
    fn geometry(&self) -> Geometry;
    fn capacity(&self) -> u64;

    fn sector_count(&self) -> u64 {
        self.capacity() / sizes::SECTOR_U64
    }
}

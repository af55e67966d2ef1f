use crate::{traits, sizes, Result, VhdError};
use std::fs::{File, OpenOptions};
use std::io::{SeekFrom, prelude::*};
use std::cell::RefCell;
use std::path::Path;

/// Marker for on-disk records that can be viewed as raw bytes and back.
///
/// # Safety
/// Implementors must be `#[repr(C, packed)]` aggregates built only from `u8`,
/// `[u8; N]` and other `PlainBytes` types: no padding, alignment 1, and every
/// byte pattern is a valid value.
pub unsafe trait PlainBytes: Sized + Copy {
    /// Copies a value out of `bytes`. `None` unless the length matches `Self` exactly.
    fn from_byte_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != std::mem::size_of::<Self>() {
            return None;
        }

        // SAFETY: length checked above, and any byte pattern is a valid Self
        Some(unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const Self) })
    }
}

pub trait AsByteSlice {
    fn as_byte_slice(&self) -> &[u8];
}

pub trait AsByteSliceMut {
    fn as_byte_slice_mut(&mut self) -> &mut [u8];
}

impl<T: PlainBytes> AsByteSlice for T {
    fn as_byte_slice(&self) -> &[u8] {
        // SAFETY: PlainBytes guarantees no padding and alignment 1
        unsafe { std::slice::from_raw_parts(self as *const T as *const u8, std::mem::size_of::<T>()) }
    }
}

impl<T: PlainBytes> AsByteSliceMut for T {
    fn as_byte_slice_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and any byte written leaves a valid T
        unsafe { std::slice::from_raw_parts_mut(self as *mut T as *mut u8, std::mem::size_of::<T>()) }
    }
}

/// vhd file open/create/size/read_at/write_at/flush
pub struct VhdFile(RefCell<File>);

impl traits::ReadAt for VhdFile {
    fn read_at(&self, offset: u64, data: &mut [u8]) -> Result<usize> {
        let mut file = self.0.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.read(data).map_err(From::from)
    }
}

impl traits::WriteAt for VhdFile {
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize> {
        let mut file = self.0.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.write(data).map_err(From::from)
    }
}

impl traits::Flush for VhdFile {
    fn flush(&self) -> Result<()> {
        let mut file = self.0.borrow_mut();
        file.flush()?;
        file.sync_data().map_err(From::from)
    }
}

impl From<File> for VhdFile {
    fn from(file: File) -> Self {
        VhdFile(RefCell::new(file))
    }
}

impl VhdFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| not_found_or_io(e, path))?;
        Ok(Self::from(file))
    }

    pub fn open_rw(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| not_found_or_io(e, path))?;
        Ok(Self::from(file))
    }

    pub fn size(&self) -> Result<u64> {
        let metadata = self.0.borrow().metadata()?;
        Ok(metadata.len())
    }

    /// Grows or shrinks the file to `size`. Grown bytes read back as zero.
    pub fn set_size(&self, size: u64) -> Result<()> {
        self.0.borrow().set_len(size).map_err(From::from)
    }
}

fn not_found_or_io(e: std::io::Error, path: &Path) -> VhdError {
    match e.kind() {
        std::io::ErrorKind::NotFound => VhdError::NotFound(path.to_path_buf()),
        _ => VhdError::Io(e),
    }
}

/// Parses a human size such as `"34K"`, `"4MB"` or `"1g"` into bytes.
///
/// Units are binary (K = 1024). A bare number is taken as bytes.
pub fn parse_size(size: &str) -> Result<u64> {
    let size = size.trim();
    let digits = size.find(|c: char| !c.is_ascii_digit()).unwrap_or(size.len());
    let (number, unit) = size.split_at(digits);

    let invalid = || VhdError::InvalidSize(size.to_string());
    let number: u64 = number.parse().map_err(|_| invalid())?;

    let multiplier = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => sizes::KIB,
        "M" | "MB" => sizes::MIB,
        "G" | "GB" => sizes::GIB,
        _ => return Err(invalid()),
    };

    number.checked_mul(multiplier).ok_or_else(invalid)
}

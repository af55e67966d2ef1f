//! Big-endian field discipline of the VHD footer.
//!
//! Every multi-byte integer in the footer is stored big-endian no matter what
//! the host is, so values cross the disk boundary only through [`ByteOrder`].

pub trait ByteOrder: Sized + Copy {
    const BITS: u32;
    type Bytes: Copy + AsRef<[u8]>;

    fn to_big_endian(self) -> Self::Bytes;
    fn from_big_endian(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_byte_order {
    ($name:ty) => {
        impl ByteOrder for $name {
            const BITS: u32 = <$name>::BITS;
            type Bytes = [u8; std::mem::size_of::<$name>()];

            #[inline]
            fn to_big_endian(self) -> Self::Bytes {
                self.to_be_bytes()
            }

            #[inline]
            fn from_big_endian(bytes: Self::Bytes) -> Self {
                <$name>::from_be_bytes(bytes)
            }
        }
    };
}

impl_byte_order!(u16);
impl_byte_order!(u32);
impl_byte_order!(u64);

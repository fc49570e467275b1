//! # Byte Helpers
//!
//! Fixed-width integer encodings. Big-endian is used for on-disk keys so
//! that byte order equals numeric order; little-endian is used inside the
//! vector clock byte arrays.
//!
//! Decoders read the first `N` bytes of the input and zero-fill when the
//! input is shorter.

macro_rules! endian_codec {
    ($modname:ident, $to:ident, $from:ident) => {
        pub mod $modname {
            fn fill<const N: usize>(b: &[u8]) -> [u8; N] {
                let mut buf = [0u8; N];
                let n = b.len().min(N);
                buf[..n].copy_from_slice(&b[..n]);
                buf
            }

            pub fn u16_to_bytes(v: u16) -> [u8; 2] {
                v.$to()
            }

            pub fn bytes_to_u16(b: &[u8]) -> u16 {
                u16::$from(fill(b))
            }

            pub fn u32_to_bytes(v: u32) -> [u8; 4] {
                v.$to()
            }

            pub fn bytes_to_u32(b: &[u8]) -> u32 {
                u32::$from(fill(b))
            }

            pub fn u64_to_bytes(v: u64) -> [u8; 8] {
                v.$to()
            }

            pub fn bytes_to_u64(b: &[u8]) -> u64 {
                u64::$from(fill(b))
            }
        }
    };
}

endian_codec!(bigendian, to_be_bytes, from_be_bytes);
endian_codec!(littleendian, to_le_bytes, from_le_bytes);

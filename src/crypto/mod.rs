//! AES-256-CBC streaming layer: encrypts a payload as it's written into a
//! [`crate::png::PngWriter`] and decrypts arbitrary byte ranges back out of
//! a [`crate::png::PngReader`] by recovering the IV from the preceding
//! ciphertext block, a standard CBC property.

pub mod decrypt_reader;
pub mod encrypt_writer;

pub use decrypt_reader::DecryptReader;
pub use encrypt_writer::EncryptWriter;

pub const KEY_LEN: usize = 32;
pub const BLOCK_LEN: usize = 16;

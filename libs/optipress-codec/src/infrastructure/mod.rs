//! Codec infrastructure

mod jpeg_reencoder;

pub use jpeg_reencoder::{reencode, CodecError, EncoderOptions, JpegReencoder};

//! # Optipress Codec Adapter
//!
//! Implements the domain's [`ImageEncoder`](optipress_domain::ports::ImageEncoder)
//! port on top of the `image` crate (decoding) and `jpeg-encoder`
//! (progressive JPEG output).

pub mod infrastructure;

pub use infrastructure::{reencode, CodecError, EncoderOptions, JpegReencoder};

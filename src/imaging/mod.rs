//! Image decoding, JPEG encoding and metadata profiles.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode HEIF/HEIC** | `libheif-rs` (feature `heif`) |
//! | **Decode other rasters** | `image` crate |
//! | **Profiles** | libheif colour profile + metadata items, JPEG APPn segments |
//! | **Encode JPEG** | `image::codecs::jpeg::JpegEncoder` |
//! | **Preview** | `image::DynamicImage::resize_exact` to a bounding box |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Profiles**: Named metadata blocks and the set attached to an image
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Containers**: HEIF sniffing/decoding and the JPEG segment codec

pub mod backend;
mod calculations;
pub mod heif;
pub mod jpeg_segments;
mod params;
pub mod profiles;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, ImageBackend, fit_preview};
pub use calculations::calculate_fit_dimensions;
pub use params::{ImageFormat, PreviewBounds, PreviewImage, Quality};
pub use profiles::{Profile, ProfileName, ProfileSet};
pub use rust_backend::RustBackend;

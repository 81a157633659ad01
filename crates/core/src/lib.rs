//! # Tephra Core
//!
//! Core types and I/O for the Tephra volcanic mass-flow toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type backed by `ndarray`
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `RasterElement`: Trait bounding raster cell types
//! - Native GeoTIFF reading/writing for DEMs, flow grids and run outputs
//!
//! Mass-flow algorithms live in the `tephra-algorithms` crate; this crate is
//! deliberately free of any algorithm logic so that grid handling can be
//! shared by engine, CLI and tests.

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}

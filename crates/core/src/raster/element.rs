//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait bounding the cell types a [`crate::Raster`] can hold.
///
/// The toolkit stores three families of grids: elevation models (`f32`,
/// `f64`), integer elevation sources as delivered by DEM distributors
/// (`i16`, `i32`, `u16`), and code grids — D8 flow directions and
/// inundation claim levels — as `u8`.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Conventional no-data value when the source declares none.
    ///
    /// Floats use NaN. Unsigned integers use their maximum, which keeps 0
    /// free: 0 is meaningful in code grids (it is exactly the invalid flow
    /// direction a run must reject, not silently skip). Signed integers
    /// use their minimum, matching common integer DEM conventions.
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;
}

macro_rules! impl_element_int {
    ($t:ty, $nodata:expr) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                $nodata
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }

            fn is_float() -> bool {
                false
            }
        }
    };
}

macro_rules! impl_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            /// NaN is always no-data; an explicit marker is matched with a
            /// small tolerance to survive f64 → f32 → f64 round-trips of
            /// values like -99999.0.
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }

            fn is_float() -> bool {
                true
            }
        }
    };
}

impl_element_int!(u8, u8::MAX);
impl_element_int!(u16, u16::MAX);
impl_element_int!(i16, i16::MIN);
impl_element_int!(i32, i32::MIN);
impl_element_float!(f32);
impl_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::NAN.is_nodata(Some(-99999.0)));
        assert!((-99999.0f64).is_nodata(Some(-99999.0)));
        assert!(!0.0f64.is_nodata(Some(-99999.0)));
    }

    #[test]
    fn test_integer_nodata_requires_explicit_marker() {
        assert!(!0u8.is_nodata(None));
        assert!(255u8.is_nodata(Some(255)));
        assert_eq!(u8::default_nodata(), 255);
        assert_eq!(i16::default_nodata(), i16::MIN);
    }
}

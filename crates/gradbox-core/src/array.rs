//! Array primitive used for every value and gradient in the graph.
//!
//! Values are dynamic-rank `f64` arrays. Scalars live in the graph as 0-d
//! arrays so that shape-dependent helpers such as [`ones_like`] are always
//! well defined. [`RawValue`] is the untyped form a value takes before it is
//! boxed into a variable; [`as_array`] is the single place where bare scalars
//! are promoted to arrays.

use crate::error::{GradError, Result};
use ndarray::{ArrayD, Dimension};
use num_traits::AsPrimitive;

/// Type alias for arrays stored in the graph.
pub type Array = ArrayD<f64>;

/// A raw value on its way into a variable.
///
/// Only [`RawValue::Array`] and [`RawValue::Empty`] can be stored. The other
/// variants exist so that scalars and plain sequences can be passed around
/// and rejected (or coerced) explicitly.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// No value.
    #[default]
    Empty,
    /// An n-dimensional array.
    Array(Array),
    /// A bare numeric scalar.
    Scalar {
        /// The scalar converted to `f64`
        value: f64,
        /// Name of the original numeric type
        type_name: &'static str,
    },
    /// A plain sequence of numbers.
    Sequence(Vec<f64>),
}

impl RawValue {
    /// Returns the name of the type this value was built from.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "None",
            Self::Array(_) => "ndarray::ArrayD<f64>",
            Self::Scalar { type_name, .. } => type_name,
            Self::Sequence(_) => "Vec<f64>",
        }
    }

    /// Returns true if this is the empty value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts into the storable form of a variable value.
    ///
    /// `Empty` becomes `None` and an array is passed through; anything else
    /// fails with [`TypeKind::Unsupported`](crate::error::TypeKind).
    pub fn into_array(self) -> Result<Option<Array>> {
        match self {
            Self::Empty => Ok(None),
            Self::Array(array) => Ok(Some(array)),
            other => Err(GradError::unsupported(other.type_name())),
        }
    }
}

impl<D: Dimension> From<ndarray::Array<f64, D>> for RawValue {
    fn from(array: ndarray::Array<f64, D>) -> Self {
        Self::Array(array.into_dyn())
    }
}

impl<D: Dimension> From<Option<ndarray::Array<f64, D>>> for RawValue {
    fn from(array: Option<ndarray::Array<f64, D>>) -> Self {
        array.map_or(Self::Empty, Self::from)
    }
}

impl From<Vec<f64>> for RawValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Sequence(values)
    }
}

macro_rules! impl_scalar_raw_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawValue {
                fn from(value: $t) -> Self {
                    Self::Scalar {
                        value: value.as_(),
                        type_name: stringify!($t),
                    }
                }
            }
        )*
    };
}

impl_scalar_raw_value!(f32, f64, i32, i64, u32, u64, usize);

/// Promotes a bare scalar to a 0-d array.
///
/// Arrays, sequences and the empty value are returned unchanged, so a
/// sequence still fails when it is boxed into a variable.
pub fn as_array(value: RawValue) -> RawValue {
    match value {
        RawValue::Scalar { value, .. } => RawValue::Array(scalar(value)),
        other => other,
    }
}

/// Creates a 0-d array holding `value`.
pub fn scalar(value: f64) -> Array {
    ndarray::arr0(value).into_dyn()
}

/// Creates an array of ones with the shape of `array`.
pub fn ones_like(array: &Array) -> Array {
    Array::ones(array.raw_dim())
}

/// Creates an array of zeros with the shape of `array`.
pub fn zeros_like(array: &Array) -> Array {
    Array::zeros(array.raw_dim())
}

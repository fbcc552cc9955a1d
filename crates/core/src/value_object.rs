//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Two value
/// objects with the same attribute values are the same value; identity does
/// not exist for them. To "modify" one, construct a new one.
///
/// Contrast with [`crate::Entity`], where two instances with the same ID are
/// the same entity regardless of attribute values.
///
/// The bounds keep value objects cheap to copy, comparable, and debuggable:
///
/// ```
/// use ledgerly_core::{Money, ValueObject};
///
/// fn assert_value_object<T: ValueObject>() {}
/// assert_value_object::<Money>();
///
/// assert_eq!(Money::from_minor_units(100), Money::from_minor_units(100));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

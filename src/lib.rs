//! # dsdlcore: semantic core of a DSDL compiler
//!
//! Builds validated composite type descriptors (structures, tagged unions and services)
//! from already-parsed attribute lists and declaration metadata, and computes the exact
//! set of serialized bit lengths every type can produce.
//!
//! ## Building blocks
//!
//! - **[`BitLengthSet`]**: finite set of lengths in bits, with union (`|`), pointwise
//!   sum (`+`), scalar shift and alignment padding
//! - **[`SerializableType`]**: the contract a field's type satisfies (bit-length set and
//!   alignment requirement); implemented by [`DataType`] and [`CompositeType`]
//! - **[`CompositeType`]**: the validated definition; built with
//!   [`CompositeType::structure`], [`CompositeType::union`] or [`CompositeType::service`]
//!
//! Parsing DSDL text, evaluating expressions and generating code happen elsewhere; this
//! crate only reasons about the shape of serialized data (sizes, offsets, alignment).
//!
//! ## Example
//!
//! ```
//! use dsdlcore::{CastMode, CompositeType, Declaration, Field, SerializableType};
//! use dsdlcore::{BitLengthSet, SignedIntegerType, UnsignedIntegerType, Version};
//!
//! let t = CompositeType::structure(
//!     Declaration::new("demo.Pair", Version::new(1, 0))
//!         .with_attribute(Field::new(UnsignedIntegerType::new(16, CastMode::Truncated)?, "a"))
//!         .with_attribute(Field::new(SignedIntegerType::new(16, CastMode::Saturated)?, "b"))
//!         .with_final(true),
//! )?;
//! assert_eq!(t.bit_length_set(), BitLengthSet::from(32));
//! assert_eq!(t.extent(), 32);
//! # Ok::<(), dsdlcore::Error>(())
//! ```
//!
//! ## Logging
//!
//! Construction and offset iteration emit `tracing` events at `debug` and `trace` level;
//! install any subscriber to see them.

pub mod attribute;
pub mod bit_length_set;
pub mod composite;
pub mod error;
pub mod name;
pub mod port_id;
pub mod types;
pub mod value;

pub use attribute::{Attribute, Constant, Field, PaddingField};
pub use bit_length_set::BitLengthSet;
pub use composite::{
    CompositeKind, CompositeType, Declaration, FieldOffsets, SchemaParams, ServiceDeclaration,
    Version,
};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    CastMode, DataType, FixedLengthArrayType, FloatType, SerializableType, SignedIntegerType,
    UnsignedIntegerType, VariableLengthArrayType, VoidType, BITS_PER_BYTE,
};
pub use value::Value;

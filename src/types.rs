//! Data types of fields and the contract every serializable type satisfies.
//!
//! Only the parts of primitive and array types that composite analysis needs live here:
//! their bit-length sets and alignment requirements.

use crate::bit_length_set::{BitLengthSet, MAX_LEN};
use crate::composite::CompositeType;
use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::sync::Arc;

pub const BITS_PER_BYTE: u64 = 8;

/// What a type must expose so that a composite can lay it out.
pub trait SerializableType {
    /// Every length, in bits, a serialized value of this type can take. Always a fresh copy.
    fn bit_length_set(&self) -> BitLengthSet;

    /// Every serialized value of this type starts at a multiple of this many bits.
    fn alignment_requirement(&self) -> u64;
}

/// Behaviour on overflow; only affects how the type is printed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastMode {
    Saturated,
    Truncated,
}

impl fmt::Display for CastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastMode::Saturated => write!(f, "saturated"),
            CastMode::Truncated => write!(f, "truncated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnsignedIntegerType {
    bit_length: u64,
    cast_mode: CastMode,
}

impl UnsignedIntegerType {
    pub fn new(bit_length: u64, cast_mode: CastMode) -> Result<Self> {
        check_bit_length("unsigned integer", bit_length, 1..=64)?;
        Ok(UnsignedIntegerType { bit_length, cast_mode })
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }

    pub fn cast_mode(&self) -> CastMode {
        self.cast_mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignedIntegerType {
    bit_length: u64,
    cast_mode: CastMode,
}

impl SignedIntegerType {
    pub fn new(bit_length: u64, cast_mode: CastMode) -> Result<Self> {
        check_bit_length("signed integer", bit_length, 2..=64)?;
        Ok(SignedIntegerType { bit_length, cast_mode })
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatType {
    bit_length: u64,
    cast_mode: CastMode,
}

impl FloatType {
    pub fn new(bit_length: u64, cast_mode: CastMode) -> Result<Self> {
        if !matches!(bit_length, 16 | 32 | 64) {
            return Err(ErrorKind::InvalidType(format!(
                "Invalid bit length for float type: {}",
                bit_length
            ))
            .into());
        }
        Ok(FloatType { bit_length, cast_mode })
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }
}

/// Fixed-width filler. Appears only as the type of padding fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoidType {
    bit_length: u64,
}

impl VoidType {
    pub fn new(bit_length: u64) -> Result<Self> {
        check_bit_length("void", bit_length, 1..=64)?;
        Ok(VoidType { bit_length })
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }
}

fn check_bit_length(what: &str, bit_length: u64, valid: std::ops::RangeInclusive<u64>) -> Result<()> {
    if !valid.contains(&bit_length) {
        return Err(ErrorKind::InvalidType(format!(
            "Invalid bit length for {} type: {} (expected {}..={})",
            what,
            bit_length,
            valid.start(),
            valid.end()
        ))
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLengthArrayType {
    element_type: Box<DataType>,
    capacity: u64,
    bit_length_set: BitLengthSet,
}

impl FixedLengthArrayType {
    /// Fails if the capacity is zero or the array's lengths cannot be enumerated in 64 bits.
    pub fn new(element_type: DataType, capacity: u64) -> Result<Self> {
        check_capacity(capacity)?;
        let bit_length_set = element_type
            .bit_length_set()
            .repeat(capacity)
            .ok_or_else(|| array_too_large(&element_type, capacity))?;
        Ok(FixedLengthArrayType {
            element_type: Box::new(element_type),
            capacity,
            bit_length_set,
        })
    }

    pub fn element_type(&self) -> &DataType {
        &self.element_type
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// Array of up to `capacity` elements, serialized after an implicit length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLengthArrayType {
    element_type: Box<DataType>,
    capacity: u64,
    length_field_type: UnsignedIntegerType,
    bit_length_set: BitLengthSet,
}

impl VariableLengthArrayType {
    /// Fails like [`FixedLengthArrayType::new`].
    pub fn new(element_type: DataType, capacity: u64) -> Result<Self> {
        check_capacity(capacity)?;
        let capacity_bits = u64::from(u64::BITS - capacity.leading_zeros());
        let length_bits = capacity_bits
            .next_power_of_two()
            .max(BITS_PER_BYTE)
            .max(element_type.alignment_requirement());
        let length_field_type = UnsignedIntegerType::new(length_bits, CastMode::Saturated)?;
        let bit_length_set = element_type
            .bit_length_set()
            .repeat_range(capacity)
            .and_then(|run| run.checked_shift(length_bits))
            .ok_or_else(|| array_too_large(&element_type, capacity))?;
        Ok(VariableLengthArrayType {
            element_type: Box::new(element_type),
            capacity,
            length_field_type,
            bit_length_set,
        })
    }

    pub fn element_type(&self) -> &DataType {
        &self.element_type
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn length_field_type(&self) -> &UnsignedIntegerType {
        &self.length_field_type
    }
}

fn array_too_large(element_type: &DataType, capacity: u64) -> Error {
    ErrorKind::InvalidType(format!(
        "Array of capacity {} of {} is too large: its lengths do not fit in 64 bits \
         or exceed {} distinct values",
        capacity,
        element_type,
        MAX_LEN
    ))
    .into()
}

fn check_capacity(capacity: u64) -> Result<()> {
    if capacity == 0 {
        return Err(ErrorKind::InvalidType("Array capacity cannot be zero".to_string()).into());
    }
    Ok(())
}

/// Any type a field or constant can have.
#[derive(Debug, Clone)]
pub enum DataType {
    Boolean,
    UnsignedInteger(UnsignedIntegerType),
    SignedInteger(SignedIntegerType),
    Float(FloatType),
    Void(VoidType),
    FixedLengthArray(FixedLengthArrayType),
    VariableLengthArray(VariableLengthArrayType),
    Composite(Arc<CompositeType>),
}

impl DataType {
    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void(_))
    }

    pub fn as_composite(&self) -> Option<&Arc<CompositeType>> {
        match self {
            DataType::Composite(t) => Some(t),
            _ => None,
        }
    }
}

/// Composite types compare by identity: two separately built definitions are distinct types.
impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataType::Boolean, DataType::Boolean) => true,
            (DataType::UnsignedInteger(a), DataType::UnsignedInteger(b)) => a == b,
            (DataType::SignedInteger(a), DataType::SignedInteger(b)) => a == b,
            (DataType::Float(a), DataType::Float(b)) => a == b,
            (DataType::Void(a), DataType::Void(b)) => a == b,
            (DataType::FixedLengthArray(a), DataType::FixedLengthArray(b)) => a == b,
            (DataType::VariableLengthArray(a), DataType::VariableLengthArray(b)) => a == b,
            (DataType::Composite(a), DataType::Composite(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for DataType {}

impl SerializableType for DataType {
    fn bit_length_set(&self) -> BitLengthSet {
        match self {
            DataType::Boolean => BitLengthSet::from(1),
            DataType::UnsignedInteger(t) => BitLengthSet::from(t.bit_length),
            DataType::SignedInteger(t) => BitLengthSet::from(t.bit_length),
            DataType::Float(t) => BitLengthSet::from(t.bit_length),
            DataType::Void(t) => BitLengthSet::from(t.bit_length),
            DataType::FixedLengthArray(t) => t.bit_length_set.clone(),
            DataType::VariableLengthArray(t) => t.bit_length_set.clone(),
            DataType::Composite(t) => t.bit_length_set(),
        }
    }

    fn alignment_requirement(&self) -> u64 {
        match self {
            DataType::FixedLengthArray(t) => t.element_type.alignment_requirement(),
            DataType::VariableLengthArray(t) => t.element_type.alignment_requirement(),
            DataType::Composite(t) => t.alignment_requirement(),
            _ => 1,
        }
    }
}

impl From<UnsignedIntegerType> for DataType {
    fn from(t: UnsignedIntegerType) -> Self {
        DataType::UnsignedInteger(t)
    }
}

impl From<SignedIntegerType> for DataType {
    fn from(t: SignedIntegerType) -> Self {
        DataType::SignedInteger(t)
    }
}

impl From<FloatType> for DataType {
    fn from(t: FloatType) -> Self {
        DataType::Float(t)
    }
}

impl From<VoidType> for DataType {
    fn from(t: VoidType) -> Self {
        DataType::Void(t)
    }
}

impl From<FixedLengthArrayType> for DataType {
    fn from(t: FixedLengthArrayType) -> Self {
        DataType::FixedLengthArray(t)
    }
}

impl From<VariableLengthArrayType> for DataType {
    fn from(t: VariableLengthArrayType) -> Self {
        DataType::VariableLengthArray(t)
    }
}

impl From<Arc<CompositeType>> for DataType {
    fn from(t: Arc<CompositeType>) -> Self {
        DataType::Composite(t)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "bool"),
            DataType::UnsignedInteger(t) => write!(f, "{} uint{}", t.cast_mode, t.bit_length),
            DataType::SignedInteger(t) => write!(f, "{} int{}", t.cast_mode, t.bit_length),
            DataType::Float(t) => write!(f, "{} float{}", t.cast_mode, t.bit_length),
            DataType::Void(t) => write!(f, "void{}", t.bit_length),
            DataType::FixedLengthArray(t) => write!(f, "{}[{}]", t.element_type, t.capacity),
            DataType::VariableLengthArray(t) => write!(f, "{}[<={}]", t.element_type, t.capacity),
            DataType::Composite(t) => write!(f, "{}", t),
        }
    }
}

//! Attributes of a composite type: fields, padding fields and constants.

use crate::types::{DataType, VoidType};
use crate::value::Value;
use std::fmt;

/// One line of a definition. Fields and padding fields make up the serialized layout
/// in declaration order; constants have no wire representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Field(Field),
    Padding(PaddingField),
    Constant(Constant),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    data_type: DataType,
}

/// Unnamed void filler. Never collides with or resolves as a name.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddingField {
    data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: String,
    data_type: DataType,
    value: Value,
}

impl Field {
    pub fn new(data_type: impl Into<DataType>, name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl PaddingField {
    pub fn new(void: VoidType) -> Self {
        PaddingField {
            data_type: DataType::Void(void),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl Constant {
    pub fn new(data_type: impl Into<DataType>, name: impl Into<String>, value: Value) -> Self {
        Constant {
            name: name.into(),
            data_type: data_type.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Attribute {
    /// Empty for padding fields.
    pub fn name(&self) -> &str {
        match self {
            Attribute::Field(f) => &f.name,
            Attribute::Padding(_) => "",
            Attribute::Constant(c) => &c.name,
        }
    }

    pub fn data_type(&self) -> &DataType {
        match self {
            Attribute::Field(f) => &f.data_type,
            Attribute::Padding(p) => &p.data_type,
            Attribute::Constant(c) => &c.data_type,
        }
    }

    /// True for fields and padding fields, i.e. attributes that occupy space on the wire.
    pub fn is_serialized(&self) -> bool {
        !matches!(self, Attribute::Constant(_))
    }

    pub fn is_padding(&self) -> bool {
        matches!(self, Attribute::Padding(_))
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Attribute::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Attribute::Constant(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Field> for Attribute {
    fn from(f: Field) -> Self {
        Attribute::Field(f)
    }
}

impl From<PaddingField> for Attribute {
    fn from(p: PaddingField) -> Self {
        Attribute::Padding(p)
    }
}

impl From<Constant> for Attribute {
    fn from(c: Constant) -> Self {
        Attribute::Constant(c)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Field(x) => write!(f, "{} {}", x.data_type, x.name),
            Attribute::Padding(x) => write!(f, "{}", x.data_type),
            Attribute::Constant(x) => write!(f, "{} {} = {}", x.data_type, x.name, x.value),
        }
    }
}

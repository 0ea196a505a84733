//! Built-in primitive types.
//!
//! Every field type in a schema ultimately resolves to one of the
//! [`PrimitiveType`] variants, either directly or through a chain of type
//! aliases.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// The closed set of primitive scalar types understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Bool,
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Date,
    DateTime,
    TimeSpan,
    Uuid,
    ByteArray,
    Json,
}

/// Error returned when a name does not match any primitive type keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown primitive type `{0}`")]
pub struct UnknownPrimitive(pub String);

impl PrimitiveType {
    /// All primitive types ordered by descending keyword length.
    ///
    /// Parsers try keywords in this order so that a keyword which is a
    /// prefix of another (`Date` and `DateTime`, `Int8` and `UInt8`) never
    /// wins over the longer match.
    pub const BY_LENGTH_DESC: [PrimitiveType; 19] = [
        PrimitiveType::ByteArray,
        PrimitiveType::DateTime,
        PrimitiveType::TimeSpan,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Decimal,
        PrimitiveType::String,
        PrimitiveType::UInt64,
        PrimitiveType::UInt32,
        PrimitiveType::UInt16,
        PrimitiveType::Int64,
        PrimitiveType::Int32,
        PrimitiveType::Int16,
        PrimitiveType::UInt8,
        PrimitiveType::Int8,
        PrimitiveType::Bool,
        PrimitiveType::Date,
        PrimitiveType::Uuid,
        PrimitiveType::Json,
    ];

    /// Returns the keyword used for this type in schema source.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "Bool",
            PrimitiveType::String => "String",
            PrimitiveType::Int8 => "Int8",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt8 => "UInt8",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::Decimal => "Decimal",
            PrimitiveType::Date => "Date",
            PrimitiveType::DateTime => "DateTime",
            PrimitiveType::TimeSpan => "TimeSpan",
            PrimitiveType::Uuid => "Uuid",
            PrimitiveType::ByteArray => "ByteArray",
            PrimitiveType::Json => "Json",
        }
    }

    /// Looks up a primitive type by its exact keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BY_LENGTH_DESC
            .into_iter()
            .find(|primitive| primitive.name() == name)
    }

    /// Returns `true` for the signed and unsigned integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::UInt8
                | PrimitiveType::UInt16
                | PrimitiveType::UInt32
                | PrimitiveType::UInt64
        )
    }

    /// Returns `true` for types whose length can be constrained with
    /// `min_len`/`max_len` style annotations.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            PrimitiveType::String | PrimitiveType::ByteArray | PrimitiveType::Json
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = UnknownPrimitive;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownPrimitive(s.to_string()))
    }
}

use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::binding::SchemaError;

/// Primitive type names a state variable can declare in its `dataType` element
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Ui1,
    Ui2,
    Ui4,
    I1,
    I2,
    I4,
    Int,
    R4,
    R8,
    Number,
    Float,
    Float64,
    /// `fixed.<precision>.<scale>`
    Fixed { precision: u8, scale: u8 },
    Char,
    #[default]
    String,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Boolean,
    BinBase64,
    BinHex,
    Uri,
    Uuid,
}

fn parse_bool(str_val: &str) -> anyhow::Result<bool> {
    match str_val {
        "1" => Ok(true),
        "0" => Ok(false),
        "true" => Ok(true),
        "false" => Ok(false),
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(anyhow::anyhow!("Unknown boolean value: {str_val}")),
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Ui1 => "ui1",
            DataType::Ui2 => "ui2",
            DataType::Ui4 => "ui4",
            DataType::I1 => "i1",
            DataType::I2 => "i2",
            DataType::I4 => "i4",
            DataType::Int => "int",
            DataType::R4 => "r4",
            DataType::R8 => "r8",
            DataType::Number => "number",
            DataType::Float => "float",
            DataType::Float64 => "float64",
            DataType::Fixed { precision, scale } => {
                return write!(f, "fixed.{precision}.{scale}")
            }
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::DateTime => "dateTime",
            DataType::DateTimeTz => "dateTime.tz",
            DataType::Time => "time",
            DataType::TimeTz => "time.tz",
            DataType::Boolean => "boolean",
            DataType::BinBase64 => "bin.base64",
            DataType::BinHex => "bin.hex",
            DataType::Uri => "uri",
            DataType::Uuid => "uuid",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ui1" => Ok(DataType::Ui1),
            "ui2" => Ok(DataType::Ui2),
            "ui4" => Ok(DataType::Ui4),
            "i1" => Ok(DataType::I1),
            "i2" => Ok(DataType::I2),
            "i4" => Ok(DataType::I4),
            "int" => Ok(DataType::Int),
            "r4" => Ok(DataType::R4),
            "r8" => Ok(DataType::R8),
            "number" => Ok(DataType::Number),
            "float" => Ok(DataType::Float),
            "float64" => Ok(DataType::Float64),
            "char" => Ok(DataType::Char),
            "string" => Ok(DataType::String),
            "date" => Ok(DataType::Date),
            "dateTime" => Ok(DataType::DateTime),
            "dateTime.tz" => Ok(DataType::DateTimeTz),
            "time" => Ok(DataType::Time),
            "time.tz" => Ok(DataType::TimeTz),
            "boolean" => Ok(DataType::Boolean),
            "bin.base64" => Ok(DataType::BinBase64),
            "bin.hex" => Ok(DataType::BinHex),
            "uri" => Ok(DataType::Uri),
            "uuid" => Ok(DataType::Uuid),
            data_type => {
                let (precision, scale) = data_type
                    .strip_prefix("fixed.")
                    .and_then(|digits| digits.split_once('.'))
                    .ok_or_else(|| anyhow::anyhow!("unrecognized data type: {data_type}"))?;
                Ok(DataType::Fixed {
                    precision: precision.parse()?,
                    scale: scale.parse()?,
                })
            }
        }
    }
}

/// Semantic type a UPnP primitive is represented with on the client side
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    I64,
    F32,
    F64,
    Char,
    Text,
    Bool,
    Uri,
}

impl DataType {
    /// Type mapper. Date and time kinds stay opaque text.
    pub fn value_type(&self) -> Option<ValueType> {
        let ty = match self {
            DataType::Ui1 => ValueType::U8,
            DataType::I1 => ValueType::I8,
            DataType::Ui2 => ValueType::U16,
            DataType::I2 => ValueType::I16,
            DataType::Ui4 => ValueType::U32,
            DataType::I4 => ValueType::I32,
            DataType::Int => ValueType::I64,
            DataType::R4 => ValueType::F32,
            DataType::Number | DataType::R8 | DataType::Float | DataType::Float64 => {
                ValueType::F64
            }
            DataType::Char => ValueType::Char,
            DataType::String
            | DataType::Date
            | DataType::DateTime
            | DataType::DateTimeTz
            | DataType::Time
            | DataType::TimeTz
            | DataType::Uuid => ValueType::Text,
            DataType::Boolean => ValueType::Bool,
            DataType::Uri => ValueType::Uri,
            DataType::Fixed { .. } | DataType::BinBase64 | DataType::BinHex => return None,
        };
        Some(ty)
    }
}

/// Map declared `dataType` of the state variable `variable` to its semantic type
pub fn map_data_type(variable: &str, data_type: &str) -> Result<ValueType, SchemaError> {
    let Ok(parsed) = DataType::from_str(data_type) else {
        return Err(SchemaError::UnknownDataType {
            variable: variable.to_owned(),
            data_type: data_type.to_owned(),
        });
    };
    parsed
        .value_type()
        .ok_or_else(|| SchemaError::UnsupportedDataType {
            variable: variable.to_owned(),
            data_type: parsed,
        })
}

impl ValueType {
    /// Rust type used by generated bindings. [UpnpUri] is imported by the generated module
    pub fn rust_type(&self) -> &'static str {
        match self {
            ValueType::U8 => "u8",
            ValueType::I8 => "i8",
            ValueType::U16 => "u16",
            ValueType::I16 => "i16",
            ValueType::U32 => "u32",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Char => "char",
            ValueType::Text => "String",
            ValueType::Bool => "bool",
            ValueType::Uri => "UpnpUri",
        }
    }

    pub fn parse(&self, value: &str) -> anyhow::Result<Value> {
        let value = match self {
            ValueType::U8 => Value::U8(u8::from_xml_value(value)?),
            ValueType::I8 => Value::I8(i8::from_xml_value(value)?),
            ValueType::U16 => Value::U16(u16::from_xml_value(value)?),
            ValueType::I16 => Value::I16(i16::from_xml_value(value)?),
            ValueType::U32 => Value::U32(u32::from_xml_value(value)?),
            ValueType::I32 => Value::I32(i32::from_xml_value(value)?),
            ValueType::I64 => Value::I64(i64::from_xml_value(value)?),
            ValueType::F32 => Value::F32(f32::from_xml_value(value)?),
            ValueType::F64 => Value::F64(f64::from_xml_value(value)?),
            ValueType::Char => Value::Char(char::from_xml_value(value)?),
            ValueType::Text => Value::Text(String::from_xml_value(value)?),
            ValueType::Bool => Value::Bool(bool::from_xml_value(value)?),
            ValueType::Uri => Value::Uri(UpnpUri::from_xml_value(value)?),
        };
        Ok(value)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Text => "text",
            ValueType::Uri => "uri",
            rest => rest.rust_type(),
        };
        write!(f, "{name}")
    }
}

/// Value of a dynamically typed argument or state variable
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Text(String),
    Bool(bool),
    Uri(UpnpUri),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::U8(_) => ValueType::U8,
            Value::I8(_) => ValueType::I8,
            Value::U16(_) => ValueType::U16,
            Value::I16(_) => ValueType::I16,
            Value::U32(_) => ValueType::U32,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Char(_) => ValueType::Char,
            Value::Text(_) => ValueType::Text,
            Value::Bool(_) => ValueType::Bool,
            Value::Uri(_) => ValueType::Uri,
        }
    }

    pub fn to_xml_value(&self) -> String {
        match self {
            Value::U8(v) => v.to_xml_value(),
            Value::I8(v) => v.to_xml_value(),
            Value::U16(v) => v.to_xml_value(),
            Value::I16(v) => v.to_xml_value(),
            Value::U32(v) => v.to_xml_value(),
            Value::I32(v) => v.to_xml_value(),
            Value::I64(v) => v.to_xml_value(),
            Value::F32(v) => v.to_xml_value(),
            Value::F64(v) => v.to_xml_value(),
            Value::Char(v) => v.to_xml_value(),
            Value::Text(v) => v.to_xml_value(),
            Value::Bool(v) => v.to_xml_value(),
            Value::Uri(v) => v.to_xml_value(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_xml_value())
    }
}

/// Value of the `uri` data type. Relative references are kept as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpnpUri {
    Absolute(url::Url),
    Relative(String),
}

impl UpnpUri {
    /// Resolve relative reference against `base`
    pub fn resolve(&self, base: &url::Url) -> anyhow::Result<url::Url> {
        match self {
            UpnpUri::Absolute(url) => Ok(url.clone()),
            UpnpUri::Relative(reference) => base
                .join(reference)
                .with_context(|| format!("join {reference} onto {base}")),
        }
    }
}

impl FromStr for UpnpUri {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match url::Url::parse(s) {
            Ok(url) => Ok(Self::Absolute(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Relative(s.to_owned())),
            Err(e) => Err(anyhow::anyhow!("invalid uri {s}: {e}")),
        }
    }
}

impl Display for UpnpUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpnpUri::Absolute(url) => write!(f, "{url}"),
            UpnpUri::Relative(reference) => write!(f, "{reference}"),
        }
    }
}

/// Allowed value range of the state variable.
///
/// Bounds are kept as declared because UPnP allows non numeric forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedValueRange {
    pub minimum: String,
    pub maximum: String,
    pub step: Option<String>,
}

impl Display for AllowedValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.minimum, self.maximum)?;
        if let Some(step) = &self.step {
            write!(f, " step {step}")?;
        }
        Ok(())
    }
}

/// Convert types into upnp values and back
pub trait IntoUpnpValue {
    const VALUE_TYPE: ValueType;

    fn to_xml_value(&self) -> String;

    fn from_xml_value(value: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}

macro_rules! impl_numeric_upnp_value {
    ($($ty:ty => $value_type:ident),*) => {
        $(
            impl IntoUpnpValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$value_type;

                fn to_xml_value(&self) -> String {
                    self.to_string()
                }

                fn from_xml_value(value: &str) -> anyhow::Result<Self> {
                    value
                        .trim()
                        .parse()
                        .with_context(|| format!("parse {} from {value:?}", stringify!($ty)))
                }
            }
        )*
    };
}

impl_numeric_upnp_value! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64
}

impl IntoUpnpValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn to_xml_value(&self) -> String {
        let value = if *self { "1" } else { "0" };
        value.to_owned()
    }

    fn from_xml_value(value: &str) -> anyhow::Result<Self> {
        parse_bool(value.trim())
    }
}

impl IntoUpnpValue for char {
    const VALUE_TYPE: ValueType = ValueType::Char;

    fn to_xml_value(&self) -> String {
        self.to_string()
    }

    fn from_xml_value(value: &str) -> anyhow::Result<Self> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(anyhow::anyhow!("expected single character, got {value:?}")),
        }
    }
}

impl IntoUpnpValue for String {
    const VALUE_TYPE: ValueType = ValueType::Text;

    fn to_xml_value(&self) -> String {
        self.clone()
    }

    fn from_xml_value(value: &str) -> anyhow::Result<Self> {
        Ok(value.to_owned())
    }
}

impl IntoUpnpValue for UpnpUri {
    const VALUE_TYPE: ValueType = ValueType::Uri;

    fn to_xml_value(&self) -> String {
        self.to_string()
    }

    fn from_xml_value(value: &str) -> anyhow::Result<Self> {
        value.trim().parse()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::binding::SchemaError;

    use super::{map_data_type, DataType, UpnpUri, Value, ValueType};

    #[test]
    fn map_primitive_types() {
        let table = [
            ("ui1", ValueType::U8),
            ("i1", ValueType::I8),
            ("ui2", ValueType::U16),
            ("i2", ValueType::I16),
            ("ui4", ValueType::U32),
            ("i4", ValueType::I32),
            ("int", ValueType::I64),
            ("r4", ValueType::F32),
            ("number", ValueType::F64),
            ("r8", ValueType::F64),
            ("float", ValueType::F64),
            ("float64", ValueType::F64),
            ("char", ValueType::Char),
            ("string", ValueType::Text),
            ("date", ValueType::Text),
            ("dateTime", ValueType::Text),
            ("dateTime.tz", ValueType::Text),
            ("time", ValueType::Text),
            ("time.tz", ValueType::Text),
            ("uuid", ValueType::Text),
            ("boolean", ValueType::Bool),
            ("uri", ValueType::Uri),
        ];
        for (name, expected) in table {
            assert_eq!(map_data_type("Var", name).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn data_type_names_round_trip() {
        for name in ["ui4", "fixed.14.4", "fixed.8.2", "dateTime.tz", "bin.base64", "float64"] {
            assert_eq!(DataType::from_str(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn fixed_point_is_unsupported() {
        let err = map_data_type("Balance", "fixed.14.4").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedDataType {
                data_type: DataType::Fixed {
                    precision: 14,
                    scale: 4
                },
                ..
            }
        ));
        let err = map_data_type("Gain", "fixed.8.2").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedDataType {
                data_type: DataType::Fixed {
                    precision: 8,
                    scale: 2
                },
                ..
            }
        ));
        let err = map_data_type("Gain", "fixed.eight").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownDataType { .. }));
    }

    #[test]
    fn unknown_type_name() {
        let err = map_data_type("Volume", "ui16").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownDataType { .. }));
    }

    #[test]
    fn parse_wire_values() {
        assert_eq!(ValueType::Bool.parse("yes").unwrap(), Value::Bool(true));
        assert_eq!(ValueType::Bool.parse("0").unwrap(), Value::Bool(false));
        assert_eq!(Value::Bool(true).to_xml_value(), "1");
        assert_eq!(ValueType::U16.parse(" 42 ").unwrap(), Value::U16(42));
        assert!(ValueType::U8.parse("256").is_err());
        assert!(ValueType::Char.parse("ab").is_err());
        assert_eq!(ValueType::Char.parse("é").unwrap(), Value::Char('é'));
    }

    #[test]
    fn uri_keeps_relative_references() {
        let absolute = UpnpUri::from_str("http://192.168.1.5:8200/MediaItems/1.mp3").unwrap();
        assert!(matches!(absolute, UpnpUri::Absolute(_)));
        let relative = UpnpUri::from_str("/MediaItems/1.mp3").unwrap();
        assert_eq!(relative, UpnpUri::Relative("/MediaItems/1.mp3".into()));
        let base = url::Url::parse("http://192.168.1.5:8200/rootDesc.xml").unwrap();
        assert_eq!(
            relative.resolve(&base).unwrap().as_str(),
            "http://192.168.1.5:8200/MediaItems/1.mp3"
        );
    }
}

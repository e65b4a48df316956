//! # Data-Type Tags
//!
//! The closed, numerically tagged enumeration of field data types. The
//! numeric tags are a wire contract shared by generators, the validator
//! and the schema compiler: tags are only ever appended, never renumbered.
//!
//! ## Shape families
//!
//! Several tags describe the same host JSON shape. A JSON object can be an
//! `object`, any `keyed*Collection`, an event trigger or a filter; those
//! tags are alternate *representations* of one shape, which is why the
//! compatibility check in the validator is one-to-many.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Data type of a [`Field`](crate::Field).
///
/// Serialized as its stable numeric tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum DataType {
    Int = 0,
    Boolean = 1,
    Float = 2,
    StringEnum = 3,
    IntEnum = 4,
    /// `0`/`1` integer or `true`/`false`.
    IntBoolean = 5,
    Number = 6,
    StringLookup = 7,
    IntValueLookup = 8,
    Long = 9,
    Point3 = 10,
    IntPoint3 = 11,
    LongFormString = 12,
    KeyedObjectCollection = 13,
    ObjectArray = 14,
    Object = 15,
    StringArray = 16,
    IntRange = 17,
    FloatRange = 18,
    FilterExpression = 19,
    PercentRange = 20,
    EventTrigger = 21,
    LongFormStringArray = 22,
    KeyedStringCollection = 23,
    Version = 24,
    Uuid = 25,
    KeyedBooleanCollection = 26,
    KeyedStringArrayCollection = 27,
    ArrayOfKeyedStringCollection = 28,
    KeyedKeyedStringArrayCollection = 29,
    KeyedNumberCollection = 30,
    NumberArray = 31,
    CheckboxListAsStringArray = 32,
    MolangExpression = 33,
    MolangExpressionArray = 34,
    Point2 = 35,
    LocalizableString = 36,
    KeyedNumberArrayCollection = 37,
    EventTriggerArray = 38,
    EventReference = 39,
    String = 40,
    TwoDStringArray = 41,
    IntArray = 42,
}

/// Number of defined data-type tags.
pub const DATA_TYPE_COUNT: usize = 43;

impl DataType {
    /// Every tag, in numeric order.
    pub const ALL: [DataType; DATA_TYPE_COUNT] = [
        Self::Int,
        Self::Boolean,
        Self::Float,
        Self::StringEnum,
        Self::IntEnum,
        Self::IntBoolean,
        Self::Number,
        Self::StringLookup,
        Self::IntValueLookup,
        Self::Long,
        Self::Point3,
        Self::IntPoint3,
        Self::LongFormString,
        Self::KeyedObjectCollection,
        Self::ObjectArray,
        Self::Object,
        Self::StringArray,
        Self::IntRange,
        Self::FloatRange,
        Self::FilterExpression,
        Self::PercentRange,
        Self::EventTrigger,
        Self::LongFormStringArray,
        Self::KeyedStringCollection,
        Self::Version,
        Self::Uuid,
        Self::KeyedBooleanCollection,
        Self::KeyedStringArrayCollection,
        Self::ArrayOfKeyedStringCollection,
        Self::KeyedKeyedStringArrayCollection,
        Self::KeyedNumberCollection,
        Self::NumberArray,
        Self::CheckboxListAsStringArray,
        Self::MolangExpression,
        Self::MolangExpressionArray,
        Self::Point2,
        Self::LocalizableString,
        Self::KeyedNumberArrayCollection,
        Self::EventTriggerArray,
        Self::EventReference,
        Self::String,
        Self::TwoDStringArray,
        Self::IntArray,
    ];

    /// The stable numeric tag.
    pub fn tag(self) -> u16 {
        self as u16
    }

    /// Look up a tag by its number.
    pub fn from_tag(tag: u16) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// The camelCase wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::StringEnum => "stringEnum",
            Self::IntEnum => "intEnum",
            Self::IntBoolean => "intBoolean",
            Self::Number => "number",
            Self::StringLookup => "stringLookup",
            Self::IntValueLookup => "intValueLookup",
            Self::Long => "long",
            Self::Point3 => "point3",
            Self::IntPoint3 => "intPoint3",
            Self::LongFormString => "longFormString",
            Self::KeyedObjectCollection => "keyedObjectCollection",
            Self::ObjectArray => "objectArray",
            Self::Object => "object",
            Self::StringArray => "stringArray",
            Self::IntRange => "intRange",
            Self::FloatRange => "floatRange",
            Self::FilterExpression => "filterExpression",
            Self::PercentRange => "percentRange",
            Self::EventTrigger => "eventTrigger",
            Self::LongFormStringArray => "longFormStringArray",
            Self::KeyedStringCollection => "keyedStringCollection",
            Self::Version => "version",
            Self::Uuid => "uuid",
            Self::KeyedBooleanCollection => "keyedBooleanCollection",
            Self::KeyedStringArrayCollection => "keyedStringArrayCollection",
            Self::ArrayOfKeyedStringCollection => "arrayOfKeyedStringCollection",
            Self::KeyedKeyedStringArrayCollection => "keyedKeyedStringArrayCollection",
            Self::KeyedNumberCollection => "keyedNumberCollection",
            Self::NumberArray => "numberArray",
            Self::CheckboxListAsStringArray => "checkboxListAsStringArray",
            Self::MolangExpression => "molangExpression",
            Self::MolangExpressionArray => "molangExpressionArray",
            Self::Point2 => "point2",
            Self::LocalizableString => "localizableString",
            Self::KeyedNumberArrayCollection => "keyedNumberArrayCollection",
            Self::EventTriggerArray => "eventTriggerArray",
            Self::EventReference => "eventReference",
            Self::String => "string",
            Self::TwoDStringArray => "twoDStringArray",
            Self::IntArray => "intArray",
        }
    }

    /// Integer-valued scalars.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int | Self::IntEnum | Self::IntValueLookup | Self::Long
        )
    }

    /// Numeric scalars, integer or not.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, Self::Float | Self::Number)
    }

    /// String-valued scalars.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::String
                | Self::StringEnum
                | Self::StringLookup
                | Self::LongFormString
                | Self::LocalizableString
                | Self::EventReference
                | Self::Uuid
        )
    }

    /// Tags whose values are restricted to a declared choice list.
    pub fn is_enum(self) -> bool {
        matches!(self, Self::StringEnum | Self::IntEnum)
    }

    /// `intRange`, `floatRange` and `percentRange`.
    pub fn is_range(self) -> bool {
        matches!(self, Self::IntRange | Self::FloatRange | Self::PercentRange)
    }

    /// `point2`, `point3` and `intPoint3`.
    pub fn is_point(self) -> bool {
        matches!(self, Self::Point2 | Self::Point3 | Self::IntPoint3)
    }

    /// String-keyed map kinds.
    pub fn is_keyed_collection(self) -> bool {
        matches!(
            self,
            Self::KeyedObjectCollection
                | Self::KeyedStringCollection
                | Self::KeyedBooleanCollection
                | Self::KeyedStringArrayCollection
                | Self::KeyedKeyedStringArrayCollection
                | Self::KeyedNumberCollection
                | Self::KeyedNumberArrayCollection
        )
    }

    /// Array kinds.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::ObjectArray
                | Self::StringArray
                | Self::LongFormStringArray
                | Self::ArrayOfKeyedStringCollection
                | Self::NumberArray
                | Self::CheckboxListAsStringArray
                | Self::MolangExpressionArray
                | Self::EventTriggerArray
                | Self::TwoDStringArray
                | Self::IntArray
        )
    }

    /// Structurally complex kinds: objects, arrays and collections.
    ///
    /// Used by the merge engine to rank alternates: a complex shape is
    /// preferred as the primary over a scalar one.
    pub fn is_complex(self) -> bool {
        self.is_array()
            || self.is_keyed_collection()
            || matches!(
                self,
                Self::Object | Self::FilterExpression | Self::EventTrigger
            )
    }

    /// Kinds that need a sub-form to describe their element shape.
    pub fn takes_sub_form(self) -> bool {
        matches!(
            self,
            Self::Object | Self::ObjectArray | Self::KeyedObjectCollection
        )
    }

    /// Scalar data types: everything that is not complex.
    pub fn is_scalar(self) -> bool {
        !self.is_complex()
    }

    /// The keyed collection whose elements have this type, if any.
    pub fn keyed_collection_of(self) -> Option<DataType> {
        match self {
            Self::Object | Self::KeyedObjectCollection => Some(Self::KeyedObjectCollection),
            t if t.is_string() => Some(Self::KeyedStringCollection),
            t if t.is_numeric() => Some(Self::KeyedNumberCollection),
            Self::Boolean | Self::IntBoolean => Some(Self::KeyedBooleanCollection),
            Self::StringArray | Self::LongFormStringArray | Self::CheckboxListAsStringArray => {
                Some(Self::KeyedStringArrayCollection)
            }
            Self::KeyedStringArrayCollection => Some(Self::KeyedKeyedStringArrayCollection),
            Self::NumberArray | Self::IntArray => Some(Self::KeyedNumberArrayCollection),
            _ => None,
        }
    }

    /// Element type of a keyed collection or array kind.
    pub fn element_type(self) -> Option<DataType> {
        let element = match self {
            Self::KeyedObjectCollection | Self::ObjectArray => Self::Object,
            Self::KeyedStringCollection
            | Self::StringArray
            | Self::CheckboxListAsStringArray => Self::String,
            Self::LongFormStringArray => Self::LongFormString,
            Self::KeyedBooleanCollection => Self::Boolean,
            Self::KeyedStringArrayCollection | Self::TwoDStringArray => Self::StringArray,
            Self::KeyedKeyedStringArrayCollection => Self::KeyedStringArrayCollection,
            Self::KeyedNumberCollection | Self::NumberArray => Self::Number,
            Self::KeyedNumberArrayCollection => Self::NumberArray,
            Self::ArrayOfKeyedStringCollection => Self::KeyedStringCollection,
            Self::MolangExpressionArray => Self::MolangExpression,
            Self::EventTriggerArray => Self::EventTrigger,
            Self::IntArray => Self::Int,
            _ => return None,
        };
        Some(element)
    }

    /// The array kind whose elements have this type, if any.
    pub fn array_of(self) -> Option<DataType> {
        match self {
            Self::MolangExpression => Some(Self::MolangExpressionArray),
            Self::EventTrigger => Some(Self::EventTriggerArray),
            Self::Int | Self::Long => Some(Self::IntArray),
            Self::Float | Self::Number => Some(Self::NumberArray),
            Self::KeyedStringCollection => Some(Self::ArrayOfKeyedStringCollection),
            Self::StringArray => Some(Self::TwoDStringArray),
            Self::Object | Self::KeyedObjectCollection => Some(Self::ObjectArray),
            t if t.is_string() => Some(Self::StringArray),
            _ => None,
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::String
    }
}

impl From<DataType> for u16 {
    fn from(value: DataType) -> Self {
        value.tag()
    }
}

impl TryFrom<u16> for DataType {
    type Error = FormError;

    fn try_from(tag: u16) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(FormError::UnknownDataType(tag.to_string()))
    }
}

impl FromStr for DataType {
    type Err = FormError;

    /// Accepts the camelCase wire name or the numeric tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(tag) = s.parse::<u16>() {
            return Self::try_from(tag);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormError::UnknownDataType(s.to_string()))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_dense_and_ordered() {
        for (i, t) in DataType::ALL.iter().enumerate() {
            assert_eq!(usize::from(t.tag()), i, "{t} is out of place");
        }
    }

    #[test]
    fn pinned_wire_tags() {
        // Tags are a shared wire contract; these must never move.
        assert_eq!(DataType::Int.tag(), 0);
        assert_eq!(DataType::Boolean.tag(), 1);
        assert_eq!(DataType::Object.tag(), 15);
        assert_eq!(DataType::FilterExpression.tag(), 19);
        assert_eq!(DataType::EventTrigger.tag(), 21);
        assert_eq!(DataType::String.tag(), 40);
        assert_eq!(DataType::IntArray.tag(), 42);
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&DataType::KeyedStringCollection).unwrap();
        assert_eq!(json, "23");
        let back: DataType = serde_json::from_str("23").unwrap();
        assert_eq!(back, DataType::KeyedStringCollection);
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(serde_json::from_str::<DataType>("999").is_err());
        assert!(DataType::from_tag(DATA_TYPE_COUNT as u16).is_none());
    }

    #[test]
    fn parse_by_name_or_number() {
        assert_eq!("molangExpression".parse::<DataType>().unwrap(), DataType::MolangExpression);
        assert_eq!("STRING".parse::<DataType>().unwrap(), DataType::String);
        assert_eq!("14".parse::<DataType>().unwrap(), DataType::ObjectArray);
        assert!("notAType".parse::<DataType>().is_err());
    }

    #[test]
    fn every_tag_is_complex_xor_scalar() {
        for t in DataType::ALL {
            assert_ne!(t.is_complex(), t.is_scalar(), "{t}");
        }
    }

    #[test]
    fn shape_families() {
        assert!(DataType::KeyedNumberCollection.is_keyed_collection());
        assert!(DataType::KeyedNumberCollection.is_complex());
        assert!(DataType::FloatRange.is_range());
        assert!(DataType::FloatRange.is_scalar());
        assert!(DataType::Uuid.is_string());
        assert!(DataType::ObjectArray.takes_sub_form());
        assert_eq!(DataType::MolangExpression.array_of(), Some(DataType::MolangExpressionArray));
        assert_eq!(DataType::Boolean.keyed_collection_of(), Some(DataType::KeyedBooleanCollection));
    }

    #[test]
    fn every_collection_has_an_element_type() {
        for t in DataType::ALL {
            let container = t.is_array() || t.is_keyed_collection();
            assert_eq!(t.element_type().is_some(), container, "{t}");
        }
        assert_eq!(DataType::TwoDStringArray.element_type(), Some(DataType::StringArray));
    }
}

use crate::native::NativeValue;
use derive_more::Display;

///
/// IndexType
///
/// Secondary index structure a collection predicate targets.
/// Integer codes match the wire encoding; code 0 is the scalar
/// default and is never a valid collection target.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum IndexType {
    #[display("LIST")]
    List,
    #[display("MAPKEYS")]
    MapKeys,
    #[display("MAPVALUES")]
    MapValues,
}

impl IndexType {
    pub const ALL: [Self; 3] = [Self::List, Self::MapKeys, Self::MapValues];

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::List => 1,
            Self::MapKeys => 2,
            Self::MapValues => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::List),
            2 => Some(Self::MapKeys),
            3 => Some(Self::MapValues),
            _ => None,
        }
    }
}

///
/// FilterKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterKind {
    IntegerEquals(i64),
    StringEquals(String),
    IntegerRange { min: i64, max: i64 },
    StringRange { min: String, max: String },
    ContainsInteger(i64),
    ContainsString(String),
}

///
/// Filter
///
/// One native secondary-index filter. Scalar filters carry no index type;
/// collection filters always do.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Filter {
    pub bin: String,
    pub index_type: Option<IndexType>,
    pub kind: FilterKind,
}

impl Filter {
    fn scalar(bin: &str, kind: FilterKind) -> Self {
        Self {
            bin: bin.to_string(),
            index_type: None,
            kind,
        }
    }

    fn collection(bin: &str, index_type: IndexType, kind: FilterKind) -> Self {
        Self {
            bin: bin.to_string(),
            index_type: Some(index_type),
            kind,
        }
    }

    // ------------------------------------------------------------------
    // Scalar constructors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn integer_equals(bin: &str, value: i64) -> Self {
        Self::scalar(bin, FilterKind::IntegerEquals(value))
    }

    #[must_use]
    pub fn string_equals(bin: &str, value: &str) -> Self {
        Self::scalar(bin, FilterKind::StringEquals(value.to_string()))
    }

    #[must_use]
    pub fn integer_range(bin: &str, min: i64, max: i64) -> Self {
        Self::scalar(bin, FilterKind::IntegerRange { min, max })
    }

    // ------------------------------------------------------------------
    // Collection constructors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn contains_integer(bin: &str, index_type: IndexType, value: i64) -> Self {
        Self::collection(bin, index_type, FilterKind::ContainsInteger(value))
    }

    #[must_use]
    pub fn contains_string(bin: &str, index_type: IndexType, value: &str) -> Self {
        Self::collection(
            bin,
            index_type,
            FilterKind::ContainsString(value.to_string()),
        )
    }

    #[must_use]
    pub fn range_integer(bin: &str, index_type: IndexType, min: i64, max: i64) -> Self {
        Self::collection(bin, index_type, FilterKind::IntegerRange { min, max })
    }

    #[must_use]
    pub fn range_string(bin: &str, index_type: IndexType, min: &str, max: &str) -> Self {
        Self::collection(
            bin,
            index_type,
            FilterKind::StringRange {
                min: min.to_string(),
                max: max.to_string(),
            },
        )
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Whether a bin value satisfies this filter.
    ///
    /// Scalar filters compare the bin directly. Collection filters look at
    /// the list elements, map keys or map values selected by the index type.
    #[must_use]
    pub fn matches(&self, bin_value: &NativeValue) -> bool {
        match self.index_type {
            None => self.kind.matches_scalar(bin_value),
            Some(index_type) => collection_members(bin_value, index_type)
                .iter()
                .any(|member| self.kind.matches_member(member)),
        }
    }
}

impl FilterKind {
    fn matches_scalar(&self, value: &NativeValue) -> bool {
        match (self, value) {
            (Self::IntegerEquals(want), NativeValue::Integer(got)) => want == got,
            (Self::StringEquals(want), NativeValue::Str(got)) => want == got,
            (Self::IntegerRange { min, max }, NativeValue::Integer(got)) => {
                (*min..=*max).contains(got)
            }
            (Self::StringRange { min, max }, NativeValue::Str(got)) => {
                min.as_str() <= got.as_str() && got.as_str() <= max.as_str()
            }
            _ => false,
        }
    }

    fn matches_member(&self, member: &NativeValue) -> bool {
        match (self, member) {
            (Self::ContainsInteger(want), NativeValue::Integer(got)) => want == got,
            (Self::ContainsString(want), NativeValue::Str(got)) => want == got,
            _ => self.matches_scalar(member),
        }
    }
}

fn collection_members(value: &NativeValue, index_type: IndexType) -> Vec<&NativeValue> {
    match (index_type, value) {
        (IndexType::List, NativeValue::List(items)) => items.iter().collect(),
        (IndexType::MapKeys, NativeValue::Map(entries)) => entries.iter().map(|(k, _)| k).collect(),
        (IndexType::MapValues, NativeValue::Map(entries)) => {
            entries.iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

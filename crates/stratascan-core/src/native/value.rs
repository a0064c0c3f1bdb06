///
/// NativeValue
///
/// Value representation understood by the execution layer.
/// There is no boolean; hosts must serialize booleans into bytes.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Nil,
    Integer(i64),
    Double(f64),
    Str(String),
    Bytes(NativeBytes),
    List(Vec<Self>),
    Map(Vec<(Self, Self)>),
    Record(Box<NativeRecord>),
}

impl NativeValue {
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&NativeRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl From<NativeRecord> for NativeValue {
    fn from(record: NativeRecord) -> Self {
        Self::Record(Box::new(record))
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

///
/// BytesKind
///
/// Tag stored alongside a byte payload.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BytesKind {
    Blob,
    Json,
}

///
/// NativeBytes
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NativeBytes {
    pub kind: BytesKind,
    pub data: Vec<u8>,
}

impl NativeBytes {
    #[must_use]
    pub const fn new(kind: BytesKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }
}

///
/// NativeKey
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeKey {
    pub namespace: String,
    pub set: Option<String>,
    pub key: Option<Box<NativeValue>>,
}

impl NativeKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, set: Option<&str>, key: NativeValue) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.map(ToString::to_string),
            key: Some(Box::new(key)),
        }
    }
}

///
/// NativeRecord
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeRecord {
    pub key: NativeKey,
    pub generation: u16,
    pub ttl: u32,
    pub bins: Vec<(String, NativeValue)>,
}

impl NativeRecord {
    /// Fresh record: first generation, no expiry, no bins.
    #[must_use]
    pub const fn new(key: NativeKey) -> Self {
        Self {
            key,
            generation: 1,
            ttl: 0,
            bins: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_bin(mut self, name: &str, value: impl Into<NativeValue>) -> Self {
        self.set_bin(name, value.into());
        self
    }

    #[must_use]
    pub fn bin(&self, name: &str) -> Option<&NativeValue> {
        self.bins.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Insert or replace a bin, keeping bin order stable.
    pub fn set_bin(&mut self, name: &str, value: NativeValue) {
        match self.bins.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.bins.push((name.to_string(), value)),
        }
    }
}

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =================================================================
// Source Field Names
// =================================================================

/// Field names as delivered by the explorer API (after flattening) and
/// by the cleaned-records workbook sheet.
pub mod fields {
    pub const TRANSACTION_HASH: &str = "transaction_hash";
    pub const TOKEN_SYMBOL: &str = "token.symbol";
    pub const TOTAL_VALUE: &str = "total.value";
    pub const FROM_HASH: &str = "from.hash";
    pub const TO_HASH: &str = "to.hash";
    pub const TIMESTAMP: &str = "timestamp";
    pub const EXCHANGE_RATE: &str = "token.exchange_rate";
    pub const TYPE: &str = "type";
    pub const DECIMALS: &str = "token.decimals";

    /// Only these fields survive normalization
    pub const ALLOW_LIST: [&str; 9] = [
        TRANSACTION_HASH,
        TOKEN_SYMBOL,
        TOTAL_VALUE,
        FROM_HASH,
        TO_HASH,
        TIMESTAMP,
        EXCHANGE_RATE,
        TYPE,
        DECIMALS,
    ];
}

// =================================================================
// Errors
// =================================================================

#[derive(Error, Debug)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

pub type DataResult<T> = Result<T, DataError>;

// =================================================================
// Raw Records
// =================================================================

/// Loosely typed source record: field name -> untyped scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Flatten a JSON object into dotted keys (`{"token": {"symbol": "X"}}`
    /// becomes `token.symbol`). Arrays are kept as values. Anything that is
    /// not an object yields an empty record.
    pub fn from_json(value: &Value) -> Self {
        let mut record = Self::new();
        if let Value::Object(map) = value {
            flatten_into(&mut record.0, "", map);
        }
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, &path, inner),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// =================================================================
// Transaction Type
// =================================================================

/// Known transfer kinds. Unrecognized values are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    Transfer,
    Minting,
    Burning,
    Other(String),
}

impl TransactionType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "token_transfer" | "transfer" => TransactionType::Transfer,
            "token_minting" | "minting" => TransactionType::Minting,
            "token_burning" | "burning" => TransactionType::Burning,
            other => TransactionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Transfer => "token_transfer",
            TransactionType::Minting => "token_minting",
            TransactionType::Burning => "token_burning",
            TransactionType::Other(s) => s,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        TransactionType::parse(&s)
    }
}

impl From<TransactionType> for String {
    fn from(t: TransactionType) -> Self {
        t.as_str().to_string()
    }
}

// =================================================================
// Canonical Record
// =================================================================

/// A transfer/mint/burn event after type coercion and default filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub transaction_hash: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub token_symbol: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub raw_amount: f64,
    pub decimals: u8,
    pub normalized_value: f64,
    pub exchange_rate: f64,
    pub usd_value: f64,
}

impl CanonicalRecord {
    /// Record with only the numeric part set; derived values are computed here
    /// so they can never disagree with their inputs.
    pub fn with_amounts(raw_amount: f64, decimals: u8, exchange_rate: f64) -> Self {
        let normalized_value = raw_amount / 10f64.powi(decimals as i32);
        Self {
            transaction_hash: None,
            timestamp: None,
            token_symbol: None,
            transaction_type: None,
            from_address: None,
            to_address: None,
            raw_amount,
            decimals,
            normalized_value,
            exchange_rate,
            usd_value: normalized_value * exchange_rate,
        }
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.token_symbol = Some(symbol.into());
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.transaction_type = Some(kind);
        self
    }

    pub fn from_addr(mut self, address: impl Into<String>) -> Self {
        self.from_address = Some(address.into());
        self
    }

    pub fn to_addr(mut self, address: impl Into<String>) -> Self {
        self.to_address = Some(address.into());
        self
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }

    pub fn is_type(&self, kind: &TransactionType) -> bool {
        self.transaction_type.as_ref() == Some(kind)
    }

    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::RawAmount => self.raw_amount,
            NumericField::Decimals => self.decimals as f64,
            NumericField::NormalizedValue => self.normalized_value,
            NumericField::ExchangeRate => self.exchange_rate,
            NumericField::UsdValue => self.usd_value,
        }
    }

    /// Grouping key for `field`; `None` when the record has no value for it.
    pub fn group_key(&self, field: GroupField) -> Option<String> {
        match field {
            GroupField::TransactionHash => self.transaction_hash.clone(),
            GroupField::TokenSymbol => self.token_symbol.clone(),
            GroupField::TransactionType => {
                self.transaction_type.as_ref().map(|t| t.as_str().to_string())
            }
            GroupField::FromAddress => self.from_address.clone(),
            GroupField::ToAddress => self.to_address.clone(),
            GroupField::Date => self.date().map(|d| d.format("%Y-%m-%d").to_string()),
            GroupField::Hour => self.timestamp.map(|ts| format!("{:02}", ts.hour())),
        }
    }
}

// =================================================================
// Field Selectors
// =================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    RawAmount,
    Decimals,
    NormalizedValue,
    ExchangeRate,
    UsdValue,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::RawAmount => "raw_amount",
            NumericField::Decimals => "decimals",
            NumericField::NormalizedValue => "normalized_value",
            NumericField::ExchangeRate => "exchange_rate",
            NumericField::UsdValue => "usd_value",
        }
    }
}

impl FromStr for NumericField {
    type Err = DataError;

    /// Accepts canonical names and the source names they came from.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw_amount" | "total.value" => Ok(NumericField::RawAmount),
            "decimals" | "token.decimals" => Ok(NumericField::Decimals),
            "normalized_value" => Ok(NumericField::NormalizedValue),
            "exchange_rate" | "token.exchange_rate" => Ok(NumericField::ExchangeRate),
            "usd_value" => Ok(NumericField::UsdValue),
            other => Err(DataError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    TransactionHash,
    TokenSymbol,
    TransactionType,
    FromAddress,
    ToAddress,
    /// Calendar date of the timestamp, `YYYY-MM-DD`
    Date,
    /// Hour of day of the timestamp, zero padded
    Hour,
}

impl GroupField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupField::TransactionHash => "transaction_hash",
            GroupField::TokenSymbol => "token_symbol",
            GroupField::TransactionType => "transaction_type",
            GroupField::FromAddress => "from_address",
            GroupField::ToAddress => "to_address",
            GroupField::Date => "date",
            GroupField::Hour => "hour",
        }
    }
}

impl FromStr for GroupField {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction_hash" => Ok(GroupField::TransactionHash),
            "token_symbol" | "token.symbol" => Ok(GroupField::TokenSymbol),
            "transaction_type" | "type" => Ok(GroupField::TransactionType),
            "from_address" | "from.hash" => Ok(GroupField::FromAddress),
            "to_address" | "to.hash" => Ok(GroupField::ToAddress),
            "date" => Ok(GroupField::Date),
            "hour" => Ok(GroupField::Hour),
            other => Err(DataError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for GroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column order of a rendered signal row.
pub const SIGNAL_COLUMNS: [&str; 7] = [
    "symbol",
    "trend",
    "strength",
    "volume_spike",
    "reversal_signal",
    "premium_discount",
    "last_price",
];

/// The `signal.json` document published by the signal producer.
///
/// Values are opaque: nothing is parsed or validated beyond the document shape.
/// `signals` keeps the key order of the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDocument {
    #[serde(default)]
    pub timestamp: Option<Value>,
    pub signals: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub trend: Option<Value>,
    pub strength: Option<Value>,
    pub volume_spike: Option<Value>,
    pub reversal_signal: Option<Value>,
    pub premium_discount: Option<Value>,
    pub last_price: Option<Value>,
}

impl SignalEntry {
    /// Picks the known fields out of a raw entry. Anything that is not a JSON object yields an
    /// entry with every field missing.
    pub fn from_value(v: &Value) -> Self {
        let Some(obj) = v.as_object() else {
            return Self::default();
        };
        let field = |key: &str| obj.get(key).cloned();
        Self {
            trend: field("trend"),
            strength: field("strength"),
            volume_spike: field("volume_spike"),
            reversal_signal: field("reversal_signal"),
            premium_discount: field("premium_discount"),
            last_price: field("last_price"),
        }
    }

    pub fn cells(&self) -> [String; 6] {
        [
            display_opt(self.trend.as_ref()),
            display_opt(self.strength.as_ref()),
            display_opt(self.volume_spike.as_ref()),
            display_opt(self.reversal_signal.as_ref()),
            display_opt(self.premium_discount.as_ref()),
            display_opt(self.last_price.as_ref()),
        ]
    }
}

impl SignalDocument {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn timestamp_text(&self) -> String {
        display_opt(self.timestamp.as_ref())
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, SignalEntry)> + '_ {
        self.signals
            .iter()
            .map(|(symbol, raw)| (symbol.as_str(), SignalEntry::from_value(raw)))
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Display text of an opaque value: strings verbatim, everything else as compact JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_opt(v: Option<&Value>) -> String {
    v.map(display_value).unwrap_or_default()
}

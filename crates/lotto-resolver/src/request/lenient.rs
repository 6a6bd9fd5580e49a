use serde::Deserialize;

/// Scalar that upstreams send either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Lenient {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            Self::Float(_) => None,
            Self::Text(text) => text.trim().replace(',', "").parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(text) => text.trim().to_owned(),
        }
    }
}

pub(crate) fn int(value: Option<&Lenient>) -> Option<i64> {
    value.and_then(Lenient::as_i64)
}

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::VerifyError;

/// Tuning knobs for the verifiers. Sizes may be written as plain numbers or as strings with a
/// `K`/`M` suffix (`"4K"`, `"1M"`).
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct VerifyConfig {
    /// Capacity of the stream buffer; no single fixed-size field may exceed it.
    #[serde(deserialize_with = "string_or_usize")]
    pub buffer_capacity: String,
    /// Scratch output size handed to the inflater on every call.
    #[serde(deserialize_with = "string_or_usize")]
    pub inflate_chunk_size: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: "4K".to_string(),
            inflate_chunk_size: "8K".to_string(),
        }
    }
}

impl VerifyConfig {
    pub fn buffer_capacity(&self) -> Result<usize, VerifyError> {
        parse_size("buffer_capacity", &self.buffer_capacity)
    }

    pub fn inflate_chunk_size(&self) -> Result<usize, VerifyError> {
        parse_size("inflate_chunk_size", &self.inflate_chunk_size)
    }
}

fn parse_size(field: &str, value: &str) -> Result<usize, VerifyError> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((i, _)) => value.split_at(i),
        None => (value, ""),
    };
    let multiplier: usize = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        other => {
            return Err(VerifyError::InvalidConfig(format!(
                "{field}: unknown unit `{other}` in `{value}`"
            )));
        }
    };
    let n: usize = digits
        .parse()
        .map_err(|e| VerifyError::InvalidConfig(format!("{field}: `{value}`: {e}")))?;
    match n.checked_mul(multiplier) {
        Some(0) => Err(VerifyError::InvalidConfig(format!("{field} must be non-zero"))),
        Some(size) => Ok(size),
        None => Err(VerifyError::InvalidConfig(format!("{field}: `{value}` is too large"))),
    }
}

fn string_or_usize<'deserialize, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'deserialize>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrUSize {
        String(String),
        USize(usize),
    }

    Ok(match StringOrUSize::deserialize(deserializer)? {
        StringOrUSize::String(v) => v,
        StringOrUSize::USize(v) => v.to_string(),
    })
}

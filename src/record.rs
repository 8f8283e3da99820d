//! The transient JSON envelope a definition travels through before it is
//! written out.
//!
//! The envelope has a single field, `definitionRaw`. Its string value is
//! taken as-is: the UTF-8 bytes of the string become the payload. Despite
//! the field name, no base64 decoding happens here. Definitions that are
//! not UTF-8 cannot ride in a JSON string and are kept byte for byte.

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::DynResult;

// Both renames name the same envelope field.
#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "definitionRaw")]
    definition_raw: &'a str,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct DefinitionRecord {
    #[serde(rename = "definitionRaw", default, deserialize_with = "text_bytes")]
    payload: Vec<u8>,
}

fn text_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(String::into_bytes)
        .unwrap_or_default())
}

impl DefinitionRecord {
    /// Wraps `raw` into `{"definitionRaw": raw}`.
    pub fn envelope(raw: &str) -> DynResult<Vec<u8>> {
        serde_json::to_vec(&Envelope {
            definition_raw: raw,
        })
        .context("failed to build definition envelope")
    }

    pub fn from_envelope(bytes: &[u8]) -> DynResult<Self> {
        serde_json::from_slice(bytes).context("failed to decode definition envelope")
    }

    /// Envelope then decode for UTF-8 input; other bytes become the payload
    /// unchanged.
    ///
    /// A decode failure is not an error: the record comes back empty, the
    /// same as a missing definition.
    pub fn from_raw(raw: impl AsRef<[u8]>) -> Self {
        let raw = raw.as_ref();
        let Ok(text) = std::str::from_utf8(raw) else {
            tracing::debug!("definition is not UTF-8, keeping {} raw bytes", raw.len());
            return Self {
                payload: raw.to_vec(),
            };
        };

        match Self::envelope(text).and_then(|envelope| Self::from_envelope(&envelope)) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("falling back to an empty definition: {err:#}");
                Self::default()
            }
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_has_single_field() {
        let envelope = DefinitionRecord::envelope("Bootstrap: docker").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&envelope).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["definitionRaw"], "Bootstrap: docker");
    }

    #[test]
    fn payload_is_not_base64_decoded() {
        let raw = "CkJvb3RTdHJhcDogZGVib290c3RyYXAK";
        let record = DefinitionRecord::from_raw(raw);
        assert_eq!(record.payload(), raw.as_bytes());
    }

    #[test]
    fn characters_needing_escapes_survive() {
        let raw = "From: \"ubuntu\"\n%post\n\techo \\ done\u{1}";
        assert_eq!(DefinitionRecord::from_raw(raw).into_payload(), raw.as_bytes());
    }

    #[test]
    fn non_utf8_bytes_are_kept() {
        let raw = b"From: caf\xe9\n";
        assert_eq!(DefinitionRecord::from_raw(raw).payload(), raw);
    }

    #[test]
    fn empty_definition_gives_empty_payload() {
        let record = DefinitionRecord::from_raw("");
        assert!(record.is_empty());
        assert_eq!(record.len(), 0);
    }

    #[test]
    fn missing_or_null_field_gives_empty_payload() {
        assert!(DefinitionRecord::from_envelope(b"{}").unwrap().is_empty());
        assert!(DefinitionRecord::from_envelope(br#"{"definitionRaw":null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_envelope_is_an_error() {
        assert!(DefinitionRecord::from_envelope(br#"{"definitionRaw":"#).is_err());
        assert!(DefinitionRecord::from_envelope(br#"{"definitionRaw":42}"#).is_err());
    }
}

//! Payload normalization
//!
//! Coerces backup payloads into valid UTF-8 text. Invalid byte sequences are
//! dropped, never replaced and never an error.

use std::borrow::Cow;

/// A raw payload as handed over by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload<'a> {
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
}

impl<'a> From<&'a str> for RawPayload<'a> {
    fn from(value: &'a str) -> Self {
        RawPayload::Text(Cow::Borrowed(value))
    }
}

impl From<String> for RawPayload<'static> {
    fn from(value: String) -> Self {
        RawPayload::Text(Cow::Owned(value))
    }
}

impl<'a> From<&'a [u8]> for RawPayload<'a> {
    fn from(value: &'a [u8]) -> Self {
        RawPayload::Bytes(Cow::Borrowed(value))
    }
}

impl From<Vec<u8>> for RawPayload<'static> {
    fn from(value: Vec<u8>) -> Self {
        RawPayload::Bytes(Cow::Owned(value))
    }
}

/// Normalize an optional payload into UTF-8 text
///
/// `None` stays `None`. Text is already valid UTF-8 and passes through.
pub fn normalize<'a, P: Into<RawPayload<'a>>>(value: Option<P>) -> Option<String> {
    value.map(|v| normalize_payload(v.into()))
}

pub fn normalize_payload(payload: RawPayload<'_>) -> String {
    match payload {
        RawPayload::Text(text) => text.into_owned(),
        RawPayload::Bytes(bytes) => decode_ignoring_invalid(&bytes),
    }
}

/// Decode bytes as UTF-8, skipping every invalid sequence
fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

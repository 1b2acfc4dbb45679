//! Header names, media types, and case-insensitive header maps.

// self
use crate::_prelude::*;

/// `Accept` header name.
pub const ACCEPT: &str = "Accept";
/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// JSON media type.
pub const APPLICATION_JSON: &str = "application/json";
/// URL-encoded form media type.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Multipart form media type.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Right-biased merge: `overlay` wins on collisions, names compared case-insensitively.
///
/// The surviving entry keeps the overlay's spelling of the header name.
pub fn merge_headers(
	base: &BTreeMap<String, String>,
	overlay: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
	let mut merged = base.clone();

	for (name, value) in overlay {
		merged.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
		merged.insert(name.clone(), value.clone());
	}

	merged
}

/// Looks up a header value regardless of name casing.
pub fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// `Content-Type: application/json` and `Accept: application/json`.
pub fn default_headers() -> BTreeMap<String, String> {
	BTreeMap::from([
		(CONTENT_TYPE.to_owned(), APPLICATION_JSON.to_owned()),
		(ACCEPT.to_owned(), APPLICATION_JSON.to_owned()),
	])
}

/// Lower-cased media type without parameters, e.g. `multipart/form-data`.
pub(crate) fn media_type(content_type: &str) -> String {
	content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

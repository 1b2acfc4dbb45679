//! The closed set of HTTP verbs forwarded to SignNow.

// self
use crate::_prelude::*;

/// HTTP verbs supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl Method {
	/// Every supported verb.
	pub const ALL: [Self; 7] =
		[Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete, Self::Head, Self::Options];

	/// Upper-case verb label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
			Self::Options => "OPTIONS",
		}
	}

	/// Verbs whose bodies SignNow expects as `application/x-www-form-urlencoded`.
	pub const fn forces_form_encoding(self) -> bool {
		matches!(self, Self::Post | Self::Put)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
			Method::Head => Self::HEAD,
			Method::Options => Self::OPTIONS,
		}
	}
}

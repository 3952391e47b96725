//! Independent copies of buffered requests, one per send attempt.

// self
use crate::_prelude::*;

/// Copies method, URI, version, every header value (repeats included), and the body bytes.
///
/// The body is already buffered, so the copy cannot fail; each attempt sends its own clone and the
/// rendered template is never handed to the transport.
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut clone = HttpRequest::new(request.body().clone());

	*clone.method_mut() = request.method().clone();
	*clone.uri_mut() = request.uri().clone();
	*clone.version_mut() = request.version();

	let headers = clone.headers_mut();

	for (name, value) in request.headers() {
		headers.append(name.clone(), value.clone());
	}

	clone
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::BTreeMap as Multiset;
	// self
	use super::*;

	fn header_multiset(request: &HttpRequest) -> Multiset<(String, Vec<u8>), usize> {
		let mut set = Multiset::new();

		for (name, value) in request.headers() {
			*set.entry((name.as_str().to_owned(), value.as_bytes().to_vec())).or_insert(0) += 1;
		}

		set
	}

	#[test]
	fn clone_preserves_body_and_repeated_headers() {
		let original = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri("https://devcenter.invalid/hardware/products?x=1")
			.version(oauth2::http::Version::HTTP_11)
			.header(header::ACCEPT, "application/json")
			.header("x-trace", "a")
			.header("x-trace", "b")
			.header("x-trace", "a")
			.body(b"{\"productName\":\"Widget\"}".to_vec())
			.expect("Request should build.");
		let clone = clone_request(&original);

		assert_eq!(clone.method(), original.method());
		assert_eq!(clone.uri(), original.uri());
		assert_eq!(clone.version(), original.version());
		assert_eq!(clone.body(), original.body());
		assert_eq!(clone.headers().get_all("x-trace").iter().count(), 3);
		assert_eq!(header_multiset(&clone), header_multiset(&original));
	}

	#[test]
	fn clones_are_independent() {
		let original = HttpRequest::new(b"payload".to_vec());
		let mut clone = clone_request(&original);

		clone.body_mut().clear();
		clone.headers_mut().insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

		assert_eq!(original.body(), b"payload");
		assert!(original.headers().get(header::AUTHORIZATION).is_none());
	}
}

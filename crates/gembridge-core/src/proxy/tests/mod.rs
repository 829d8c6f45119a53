//! Router-level tests: the full middleware stack against a mocked upstream.

//! Shared proptest generators for client configuration inputs.

use proptest::prelude::*;

/// Generate header names made of token characters.
pub fn header_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,20}"
}

/// Generate header values, possibly empty and possibly containing `=`.
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9=:/._ -]{0,30}"
}

/// Generate raw header arguments: `name=value` or a bare `name`.
pub fn header_arg_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (header_name_strategy(), header_value_strategy())
            .prop_map(|(name, value)| format!("{name}={value}")),
        1 => header_name_strategy(),
    ]
}

/// Generate absolute Prometheus base URLs.
pub fn prometheus_url_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("http"), Just("https")],
        "[a-z][a-z0-9-]{0,15}(\\.[a-z][a-z0-9-]{0,10}){0,3}",
        1024u16..65535,
        prop_oneof![Just(String::new()), "/[a-z]{1,10}".prop_map(String::from)],
    )
        .prop_map(|(scheme, host, port, path)| format!("{scheme}://{host}:{port}{path}"))
}

/// Generate absolute file paths that are never created.
pub fn missing_path_strategy() -> impl Strategy<Value = String> {
    "(/[a-z][a-z0-9_-]{0,12}){1,4}".prop_map(|path| format!("/nonexistent{path}"))
}

/// Generate bearer tokens that an HTTP header can carry verbatim.
pub fn bearer_token_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9._~+/-]{1,64}"
}

//! Property names the wrappers intercept.

/// Client-construction method on a library.
pub const CREATE_CLIENT: &str = "create_client";

/// Clone method on a client.
pub const DUPLICATE: &str = "duplicate";

/// Transaction-builder accessors on a client.
pub const TRANSACTION_ACCESSORS: [&str; 2] = ["multi", "batch"];

/// Execute method on a transaction builder.
pub const EXEC: &str = "exec";

/// Crate version as reported by `kardex --version` and `kardex status`.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

//! SQL schema definitions.

/// Schema v1: a single flat key-value table.
///
/// Keys are the encodings from [`crate::keys`]; values are opaque to SQLite.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY,
    value BLOB NOT NULL
) WITHOUT ROWID;
"#;

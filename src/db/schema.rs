//! SQL DDL for initializing the user storage.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT, never reused or rewritten
/// - `email` UNIQUE (case-insensitive), the identity used for duplicate detection
/// - `password_hash` argon2 PHC string, never selected into a response
/// - `created_at` RFC3339 text
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);
"#;

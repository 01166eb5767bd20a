use sqlx::mysql::MySqlPool;

/// Process-wide state handed to every handler. The pool is the only shared
/// handle; each request builds its own buckets from scratch.
pub struct AppState {
    pub pool: MySqlPool,
}

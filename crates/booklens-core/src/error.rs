//! Failures surfaced to callers of the core.
//!
//! Only storage problems are errors. Unknown criterion names, empty
//! predicates and out-of-range page requests degrade to fewer filters,
//! empty results or a no-op and never reach this type.

use crate::models::UserId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog could not be queried.
    #[error("search failed")]
    SearchFailed(#[source] anyhow::Error),

    /// The settings store could not be read or written.
    #[error("settings unavailable for user {user_id}")]
    SettingsFailed {
        user_id: UserId,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

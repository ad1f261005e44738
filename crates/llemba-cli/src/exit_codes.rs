//! Process exit codes. Part of the CLI contract.
//!
//! Typed core errors map by kind. Response cache failures and failures to
//! write the output file share `STORAGE_ERROR`; any other untyped error is
//! treated as a usage problem.

use llemba_core::LlembaError;

pub const SUCCESS: i32 = 0;
pub const CONFIG_ERROR: i32 = 2; // Bad settings, flags, credentials or method
pub const INPUT_ERROR: i32 = 3; // Unreadable or incomplete input rows
pub const TRANSPORT_ERROR: i32 = 4; // Endpoint still failing after bounded retries
pub const STORAGE_ERROR: i32 = 5; // Response cache or output file unusable

pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<LlembaError>() {
        Some(LlembaError::Input { .. } | LlembaError::MissingField { .. }) => INPUT_ERROR,
        Some(LlembaError::Transport { .. }) => TRANSPORT_ERROR,
        Some(LlembaError::Cache { .. }) => STORAGE_ERROR,
        Some(_) => CONFIG_ERROR,
        None if err.downcast_ref::<std::io::Error>().is_some()
            || err.downcast_ref::<serde_json::Error>().is_some() =>
        {
            STORAGE_ERROR
        }
        None => CONFIG_ERROR,
    }
}

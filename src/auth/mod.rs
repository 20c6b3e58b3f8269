//! Authentication
//!
//! Password scrambles for `mysql_native_password`, `caching_sha2_password` and
//! `mysql_clear_password`.

pub mod scramble;

pub use scramble::{
    caching_sha2_password, clear_password, mysql_native_password, scramble_for_plugin,
};

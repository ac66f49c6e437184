//! Configuration management for shellfast.
//!
//! User defaults ([`settings::Config`]) are stored as a TOML file and loaded
//! once by the caller; core operations never read configuration themselves.

pub mod settings;

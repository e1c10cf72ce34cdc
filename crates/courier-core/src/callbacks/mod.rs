//! Ready-made callbacks.

pub mod fetch;

pub use self::fetch::FetchJson;

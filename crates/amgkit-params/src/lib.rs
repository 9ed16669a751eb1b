//! # amgkit-params
//!
//! Parameter configuration for preconditioners and solver sessions.
//!
//! ## Key Types
//!
//! - [`ParameterStore`] — handle-typed, ordered name → value store with typed setters
//!   and bulk JSON/TOML loading
//! - [`ParamValue`] — tagged parameter value
//! - [`ParamSnapshot`] — owned copy taken at build time; later store mutation or
//!   destruction never reaches already-built objects

pub mod document;
pub mod snapshot;
pub mod store;
pub mod value;

pub use snapshot::ParamSnapshot;
pub use store::ParameterStore;
pub use value::ParamValue;

//! # specgate-schema: Multi-Spec OpenAPI Validation
//!
//! Compiles OpenAPI 3.0/3.1 interface-description documents into request and
//! response validators, and routes incoming requests to the right validator
//! by URL prefix.
//!
//! ## Responsibilities
//!
//! - **Configuration:** Parse the validation config document (toggles, skip
//!   paths, unresolved-validator policy, spec entries). See [`config`].
//! - **Compilation:** Read a document, resolve local and external `$ref`s,
//!   build the operation model, and compile every schema with `jsonschema`.
//!   See [`compile`].
//! - **Validation:** Check method, path, parameters, headers, and bodies of
//!   a request, or status, headers, and body of a response, collecting every
//!   [`Violation`]. See [`validate`].
//! - **Registry:** Hold compiled specs by name plus a prefix → name route
//!   table behind one reader/writer lock. See [`registry`].
//!
//! ## Crate Policy
//!
//! - No HTTP framework dependency: requests and responses are described with
//!   the `http` crate's types only.
//! - All start-up failures surface as [`SpecError`] variants; validation
//!   outcomes are plain data ([`Violation`]), never errors.

pub mod compile;
pub mod config;
pub mod document;
pub mod error;
pub mod registry;
mod template;
pub mod validate;
pub mod violation;

// Re-export primary types.
pub use compile::{compile, CompiledDocument, SchemaDialect};
pub use config::{Config, DEFAULT_CONFIG_PATH, SpecEntry, UnresolvedPolicy, ValidationConfig};
pub use error::SpecError;
pub use registry::{CompiledSpec, RouteEntry, SpecRegistry, SpecSummary};
pub use validate::{RequestParts, ResponseParts, SpecValidator};
pub use violation::{ErrorEnvelope, SchemaCause, ValidationSubType, ValidationType, Violation};

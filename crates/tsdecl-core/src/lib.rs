//! # tsdecl-core
//!
//! A library for compiling Protocol Buffer file descriptors into TypeScript
//! declaration files (`.d.ts`).
//!
//! This crate provides the core functionality for:
//! - Indexing every message and enum of a descriptor set
//! - Resolving type references across files and packages, with import aliases
//! - Mapping field and RPC method shapes to TypeScript types
//! - Rendering deterministic, byte-stable declaration text
//!
//! ## Architecture
//!
//! Data flows strictly in one direction:
//!
//! - [`index`]: descriptor index over the whole request
//! - [`resolver`], [`naming`], [`mapper`]: per-field resolution
//! - [`service`]: RPC call signatures
//! - [`tree`]: namespace tree assembly
//! - [`emit`]: text rendering
//!
//! [`Generator`] drives the pipeline and [`plugin`] speaks the protoc plugin
//! protocol on top of it.
//!
//! ## Example
//!
//! ```no_run
//! use prost::Message;
//! use prost_types::compiler::CodeGeneratorRequest;
//! use std::io::Read;
//!
//! let mut input = Vec::new();
//! std::io::stdin().read_to_end(&mut input)?;
//!
//! let request = CodeGeneratorRequest::decode(input.as_slice())?;
//! for file in tsdecl_core::plugin::compile(&request)? {
//!     println!("{}:\n{}", file.name, file.content);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod comments;
pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod index;
pub mod mapper;
pub mod naming;
pub mod plugin;
pub mod resolver;
pub mod service;
pub mod tree;

#[cfg(test)]
mod testutil;

// Re-export primary types for convenience
pub use config::{Config, EnumRepresentation, NamingMode};
pub use error::{Error, Result};
pub use generator::{output_name, GeneratedFile, Generator};
pub use index::DescriptorIndex;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

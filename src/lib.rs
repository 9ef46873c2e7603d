//! Fluent builder API generator.
//!
//! Compiles a JSON Schema plus a specification table into chainable JavaScript
//! builder modules and their Markdown reference, and interprets the same table
//! in-process through [`runtime::Runtime`].
pub mod cli;
pub mod codegen;
pub mod docgen;
pub mod emitter;
pub mod error;
pub mod path_de;
pub mod pipeline;
pub mod runtime;
pub mod schema;
pub mod spec;
pub mod text;
pub mod writer;

//! A `protoc` plugin that emits byte-serialized request/response stubs for
//! every method of every service in the files it is asked to compile.
//!
//! Each stub has the shape `func Name(input []byte) (output []byte, err error)`:
//! it decodes the method's input message, leaves a commented hook for the
//! real implementation, and encodes the output message. A `// @protopy`
//! annotation right above every stub is what the downstream bind generator
//! scans for.
//!
//! The crate is split the way the data flows:
//!
//! - [`generator`] speaks the `CodeGeneratorRequest`/`CodeGeneratorResponse`
//!   protocol and drives registered [`plugin::Plugin`]s file by file.
//! - [`plugin::GrpcSerial`] is the plugin itself; it delegates to the
//!   [`codegen::service::ServiceDriver`].
//! - [`codegen`] holds name resolution, package lookup and the emitters.
//!
//! ```
//! use grpcserial::generate_response;
//! use prost_types::compiler::CodeGeneratorRequest;
//!
//! let response = generate_response(&CodeGeneratorRequest::default());
//! assert!(response.error.is_none());
//! assert!(response.file.is_empty());
//! ```

pub mod codegen;
pub mod descriptor_pool;
pub mod error;
pub mod generator;
pub mod plugin;
pub mod telemetry;

pub use error::Error;
pub use generator::{Generator, GeneratorOptions, generate_response};
pub use plugin::{GrpcSerial, Plugin};

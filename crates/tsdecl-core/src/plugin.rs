//! protoc plugin protocol.
//!
//! Bridges a `CodeGeneratorRequest` to the [`Generator`] and its output back
//! to a `CodeGeneratorResponse`. Reading stdin and writing stdout is left to
//! the caller.

use crate::config::Config;
use crate::error::Result;
use crate::generator::{GeneratedFile, Generator};
use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::debug;

/// Generates all requested files of a plugin request.
///
/// The configuration comes from the request's `parameter` string.
pub fn compile(request: &CodeGeneratorRequest) -> Result<Vec<GeneratedFile>> {
    let config = Config::from_parameter(request.parameter())?;
    debug!(
        "Compiling {} of {} files with {:?}",
        request.file_to_generate.len(),
        request.proto_file.len(),
        config
    );
    Generator::new(config).generate(&request.proto_file, &request.file_to_generate)
}

/// Decodes a serialized request and generates all requested files
pub fn compile_bytes(bytes: &[u8]) -> Result<Vec<GeneratedFile>> {
    let request = CodeGeneratorRequest::decode(bytes)?;
    compile(&request)
}

/// Builds the plugin response for a serialized request.
///
/// Failures are reported through the response's `error` field, which is how
/// protoc expects plugins to report problems with the input.
pub fn respond(bytes: &[u8]) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };

    match compile_bytes(bytes) {
        Ok(files) => {
            response.file = files
                .into_iter()
                .map(|f| File {
                    name: Some(f.name),
                    content: Some(f.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(e) => response.error = Some(format!("{}: {}", e.kind(), e)),
    }

    response
}

//! RPC method signatures.
//!
//! Every method result is wrapped in the same response envelope, whatever
//! its streaming shape, so generated stubs share one calling convention.

use crate::config::Config;
use crate::error::Result;
use crate::resolver::NameResolver;
use prost_types::MethodDescriptorProto;
use std::fmt;

/// Streaming shape of a method, keyed by (client streaming, server streaming)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// One request in, one envelope out
    Unary,
    /// One request in, envelopes delivered to a callback
    ServerStreaming,
    /// Requests pulled from a producer, one envelope out
    ClientStreaming,
    /// Requests pulled from a producer, envelopes delivered to a callback
    Bidirectional,
}

impl CallShape {
    /// Picks the shape from a method's streaming flags
    pub fn from_flags(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => CallShape::Unary,
            (false, true) => CallShape::ServerStreaming,
            (true, false) => CallShape::ClientStreaming,
            (true, true) => CallShape::Bidirectional,
        }
    }
}

/// A method's call signature, rendered through [`fmt::Display`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Streaming shape
    pub shape: CallShape,
    /// Resolved request message path
    pub input: String,
    /// Resolved response message path
    pub output: String,
    /// Render streams as `AsyncIterator<...>` instead of callbacks
    pub async_iterators: bool,
}

impl Signature {
    /// The envelope wrapping every response
    pub fn envelope(&self) -> String {
        format!(
            "{{ response: {}, code: number, message: string, detail: any }}",
            self.output
        )
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = &self.input;
        let envelope = self.envelope();

        if self.async_iterators {
            let request = match self.shape {
                CallShape::ClientStreaming | CallShape::Bidirectional => {
                    format!("AsyncIterator<{}>", input)
                }
                _ => input.clone(),
            };
            let response = match self.shape {
                CallShape::ServerStreaming | CallShape::Bidirectional => {
                    format!("AsyncIterator<{}>", envelope)
                }
                _ => envelope,
            };
            return write!(f, "(r:{}) => {}", request, response);
        }

        match self.shape {
            CallShape::Unary => write!(f, "(r:{}) => {}", input, envelope),
            CallShape::ServerStreaming => write!(
                f,
                "(r:{}, cb:(a:{{value: {}, done: boolean}}) => void) => void",
                input, envelope
            ),
            CallShape::ClientStreaming => write!(
                f,
                "(r:() => {{value: {}, done: boolean}}) => {}",
                input, envelope
            ),
            CallShape::Bidirectional => write!(
                f,
                "(r:() => {{value: {}, done: boolean}}, cb:(a:{{value: {}, done: boolean}}) => void) => void",
                input, envelope
            ),
        }
    }
}

/// Builds the signature of one method of `service` (fully-qualified)
pub fn map_method(
    method: &MethodDescriptorProto,
    service: &str,
    resolver: &mut NameResolver<'_, '_>,
    config: &Config,
) -> Result<Signature> {
    let context = format!("method {}.{}", service, method.name());
    let scope = service.rsplit_once('.').map_or("", |(package, _)| package);

    let input = resolver.resolve(method.input_type(), scope, &context)?;
    let output = resolver.resolve(method.output_type(), scope, &context)?;

    Ok(Signature {
        shape: CallShape::from_flags(method.client_streaming(), method.server_streaming()),
        input: input.path,
        output: output.path,
        async_iterators: config.async_iterators,
    })
}

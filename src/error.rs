/// Failures that abort a generation run.
///
/// None of these are recovered from locally: the host driver turns them into
/// `CodeGeneratorResponse.error`, which makes `protoc` stop the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A method's input or output type is not declared in any file the host sent.
    #[error("method {method}: type {type_name} not found in descriptor pool")]
    UnresolvedType { method: String, type_name: String },
    /// The `protoc` parameter string could not be interpreted.
    #[error("invalid plugin parameter: {0}")]
    InvalidParameter(String),
    /// `plugins=` selected a name nobody registered.
    #[error("unknown plugin {0:?}")]
    UnknownPlugin(String),
    /// The request bytes on stdin are not a `CodeGeneratorRequest`.
    #[error("failed to decode code generator request: {0}")]
    Decode(#[from] prost::DecodeError),
}

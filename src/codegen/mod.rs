// grpcserial codegen module

use prost_types::{FileDescriptorProto, ServiceDescriptorProto};

use crate::Error;
use crate::descriptor_pool::DescriptorPool;

pub mod alias;
pub mod binding;
pub mod comments;
pub mod names;
pub mod package;
pub mod printer;
pub mod service;
pub mod stub;

use alias::AliasRegistry;
use comments::Comments;

/// Import path of the context package referenced by generated code.
pub const CONTEXT_PKG_PATH: &str = "golang.org/x/net/context";
/// Import path of the RPC runtime package referenced by generated code.
pub const GRPC_PKG_PATH: &str = "google.golang.org/grpc";
/// Bumped whenever generated code needs a newer RPC runtime.
pub const GENERATED_CODE_VERSION: u32 = 4;

/// One proto file as handed to a plugin, with the pool used to resolve its
/// type references.
#[derive(Debug)]
pub struct FileUnit<'a> {
    pub descriptor: &'a FileDescriptorProto,
    pub pool: &'a DescriptorPool<'a>,
    comments: Comments,
}

impl<'a> FileUnit<'a> {
    pub fn new(descriptor: &'a FileDescriptorProto, pool: &'a DescriptorPool<'a>) -> Self {
        Self {
            descriptor,
            pool,
            comments: Comments::extract(descriptor),
        }
    }

    pub fn services(&self) -> &'a [ServiceDescriptorProto] {
        &self.descriptor.service
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    /// `package.Service`, or just `Service` when the file has no package.
    pub fn full_service_name(&self, service: &ServiceDescriptorProto) -> String {
        match self.descriptor.package() {
            "" => service.name().to_string(),
            package => format!("{}.{}", package, service.name()),
        }
    }
}

/// Aliases of the supporting packages, minted once in `Init` from the
/// host's shared package names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportPackages {
    pub context: String,
    pub grpc: String,
    /// Joined in front of [`CONTEXT_PKG_PATH`] and [`GRPC_PKG_PATH`].
    pub import_prefix: String,
}

impl SupportPackages {
    pub fn import_path(&self, path: &str) -> String {
        let prefix = self.import_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", prefix, path)
        }
    }
}

/// A message type as it is printed in generated code: `alias.GoName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub alias: String,
    pub name: String,
    pub import_path: String,
}

impl ResolvedType {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.alias, self.name)
    }
}

/// Resolve a method's type reference against the pool, minting an alias
/// for the declaring package on first use.
pub fn resolve_type(
    pool: &DescriptorPool<'_>,
    aliases: &mut AliasRegistry,
    method: &str,
    type_name: &str,
) -> Result<ResolvedType, Error> {
    let message = pool
        .find_message(type_name)
        .ok_or_else(|| Error::UnresolvedType {
            method: method.to_string(),
            type_name: type_name.to_string(),
        })?;

    let import_path = package::import_path(message.file);
    let (package_name, _) = package::go_package_name(message.file);
    let alias = aliases.alias(&import_path, &package_name).to_string();

    Ok(ResolvedType {
        alias,
        name: names::go_type_name(message.path),
        import_path,
    })
}

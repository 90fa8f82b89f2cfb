// Service driver: walks a file's services and methods in declaration order.

use prost_types::ServiceDescriptorProto;
use serde::Deserialize;
use tracing::debug;

use super::alias::{AliasRegistry, SERIALIZATION_ALIAS};
use super::comments::comment_lines;
use super::names::camel_case;
use super::package;
use super::printer::Printer;
use super::stub::{StubMethod, emit_stub};
use super::{
    CONTEXT_PKG_PATH, FileUnit, GENERATED_CODE_VERSION, GRPC_PKG_PATH, ResolvedType,
    SupportPackages, resolve_type,
};
use crate::Error;

/// Import path of the serialization package the stubs call into.
pub const SERIALIZATION_PKG_PATH: &str = "github.com/golang/protobuf/proto";

/// How stub blocks are wrapped in the generated file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionMode {
    /// Each service becomes commented-out example code to copy and edit.
    #[default]
    Template,
    /// Stubs are emitted as live code.
    Binding,
}

/// A method with both type references resolved.
#[derive(Debug, Clone)]
pub struct ResolvedMethod<'a> {
    pub name: &'a str,
    pub input: ResolvedType,
    pub output: ResolvedType,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub comment: Option<&'a str>,
}

pub struct ServiceDriver<'p> {
    mode: EmissionMode,
    packages: &'p SupportPackages,
}

impl<'p> ServiceDriver<'p> {
    pub fn new(mode: EmissionMode, packages: &'p SupportPackages) -> Self {
        Self { mode, packages }
    }

    pub fn mode(&self) -> EmissionMode {
        self.mode
    }

    /// Emit every service of `file`. Files without services produce nothing.
    pub fn generate(&self, file: &FileUnit<'_>, out: &mut Printer) -> Result<(), Error> {
        let services = file.services();
        if services.is_empty() {
            return Ok(());
        }

        let own_path = package::import_path(file.descriptor);
        let (own_name, _) = package::go_package_name(file.descriptor);
        let mut aliases = AliasRegistry::new(&own_path);
        let own_alias = aliases.alias(&own_path, &own_name).to_string();

        self.reference_preamble(out);

        for (index, service) in services.iter().enumerate() {
            let methods = resolve_methods(file, index, service, &mut aliases)?;
            debug!(
                service = %file.full_service_name(service),
                methods = methods.len(),
                mode = ?self.mode,
                "emitting service"
            );

            if let Some(comment) = file.comments().service(index) {
                for line in comment_lines(comment) {
                    out.line(line);
                }
            }
            match self.mode {
                EmissionMode::Template => {
                    let imports = service_imports(&own_path, &own_alias, &methods);
                    emit_template(out, service, &imports, &methods, &aliases);
                }
                EmissionMode::Binding => emit_binding(out, service, &methods, &aliases),
            }
        }
        Ok(())
    }

    /// Emit the import block for the supporting packages, if `file` has services.
    pub fn generate_imports(&self, file: &FileUnit<'_>, out: &mut Printer) {
        if file.services().is_empty() {
            return;
        }
        out.line("import (");
        out.indent();
        out.line(format!(
            "{} \"{}\"",
            self.packages.context,
            self.packages.import_path(CONTEXT_PKG_PATH)
        ));
        out.line(format!(
            "{} \"{}\"",
            self.packages.grpc,
            self.packages.import_path(GRPC_PKG_PATH)
        ));
        out.outdent();
        out.line(")");
        out.blank();
    }

    fn reference_preamble(&self, out: &mut Printer) {
        out.line("// Reference imports to suppress errors if they are not otherwise used.");
        out.line(format!("var _ {}.Context", self.packages.context));
        out.line(format!("var _ {}.ClientConn", self.packages.grpc));
        out.blank();
        out.line("// This is a compile-time assertion to ensure that this generated file");
        out.line("// is compatible with the grpc package it is being compiled against.");
        out.line(format!(
            "const _ = {}.SupportPackageIsVersion{}",
            self.packages.grpc, GENERATED_CODE_VERSION
        ));
        out.blank();
    }
}

/// Resolve all methods of one service up front so an unresolved type
/// aborts before any of the service's text is written.
pub fn resolve_methods<'a>(
    file: &'a FileUnit<'a>,
    service_index: usize,
    service: &'a ServiceDescriptorProto,
    aliases: &mut AliasRegistry,
) -> Result<Vec<ResolvedMethod<'a>>, Error> {
    let mut methods = Vec::with_capacity(service.method.len());
    for (index, method) in service.method.iter().enumerate() {
        let input = resolve_type(file.pool, aliases, method.name(), method.input_type())?;
        let output = resolve_type(file.pool, aliases, method.name(), method.output_type())?;
        methods.push(ResolvedMethod {
            name: method.name(),
            input,
            output,
            client_streaming: method.client_streaming(),
            server_streaming: method.server_streaming(),
            comment: file.comments().method(service_index, index),
        });
    }
    Ok(methods)
}

/// `(alias, path)` pairs the service's methods reference: the file's own
/// package first, the rest in order of first use.
fn service_imports(
    own_path: &str,
    own_alias: &str,
    methods: &[ResolvedMethod<'_>],
) -> Vec<(String, String)> {
    let mut imports = vec![(own_alias.to_string(), own_path.to_string())];
    for ty in methods.iter().flat_map(|m| [&m.input, &m.output]) {
        if !imports.iter().any(|(_, path)| *path == ty.import_path) {
            imports.push((ty.alias.clone(), ty.import_path.clone()));
        }
    }
    imports
}

fn emit_stubs(out: &mut Printer, methods: &[ResolvedMethod<'_>], aliases: &AliasRegistry) {
    for method in methods {
        emit_stub(
            out,
            &StubMethod {
                name: method.name,
                input: &method.input,
                output: &method.output,
                comment: method.comment,
                aliases,
            },
        );
    }
}

fn emit_template(
    out: &mut Printer,
    service: &ServiceDescriptorProto,
    imports: &[(String, String)],
    methods: &[ResolvedMethod<'_>],
    aliases: &AliasRegistry,
) {
    out.line(format!(
        "/* Example implementation of {} service :",
        camel_case(service.name())
    ));
    out.blank();
    out.line("package your_package // change this");
    out.blank();
    out.line(format!("import \"{}\"", SERIALIZATION_PKG_PATH));
    for (alias, path) in imports {
        out.line(format!("import {} \"{}\" // change this", alias, path));
    }
    out.blank();
    out.line("//go:generate goprotopy $GOPACKAGE $GOFILE");
    out.blank();
    emit_stubs(out, methods, aliases);
    out.line("*/");
    out.blank();
}

fn emit_binding(
    out: &mut Printer,
    service: &ServiceDescriptorProto,
    methods: &[ResolvedMethod<'_>],
    aliases: &AliasRegistry,
) {
    out.line(format!(
        "// Serialized API for {} service, via {}.",
        camel_case(service.name()),
        SERIALIZATION_ALIAS
    ));
    out.blank();
    emit_stubs(out, methods, aliases);
}

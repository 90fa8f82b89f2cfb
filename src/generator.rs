//! Host side of the plugin protocol: turns a `CodeGeneratorRequest` into a
//! `CodeGeneratorResponse` by driving the registered plugins file by file.

use prost_types::compiler::code_generator_response::{self, Feature};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorProto;
use serde::Deserialize;
use serde::de::value::MapDeserializer;
use tracing::{debug, info, warn};

use crate::Error;
use crate::codegen::names::clean_package_name;
use crate::codegen::package::go_package_name;
use crate::codegen::printer::Printer;
use crate::codegen::service::{EmissionMode, SERIALIZATION_PKG_PATH};
use crate::codegen::FileUnit;
use crate::descriptor_pool::DescriptorPool;
use crate::plugin::{GrpcSerial, HostContext, Plugin};

const GENERATOR_NAME: &str = "protoc-gen-grpcserial";
const OUTPUT_SUFFIX: &str = ".serial.pb.go";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Options parsed from the `protoc` parameter string, e.g.
/// `plugins=grpcserial,mode=binding,import_prefix=vendor`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorOptions {
    /// `+`-separated plugin names; empty enables every registered plugin.
    pub plugins: String,
    pub mode: EmissionMode,
    pub import_prefix: String,
    /// Tracing filter directive.
    pub log: String,
}

impl GeneratorOptions {
    pub fn parse(parameter: &str) -> Result<Self, Error> {
        let pairs = parameter
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.split_once('=')
                    .ok_or_else(|| Error::InvalidParameter(format!("expected key=value, got {part:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let deserializer = MapDeserializer::<_, serde::de::value::Error>::new(pairs.into_iter());
        Self::deserialize(deserializer).map_err(|e| Error::InvalidParameter(e.to_string()))
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.split('+').filter(|name| !name.is_empty())
    }

    pub fn log_filter(&self) -> &str {
        if self.log.is_empty() {
            DEFAULT_LOG_FILTER
        } else {
            &self.log
        }
    }
}

pub struct Generator {
    options: GeneratorOptions,
    host: HostContext,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        let host = HostContext {
            import_prefix: options.import_prefix.clone(),
            mode: options.mode,
            ..Default::default()
        };
        Self {
            options,
            host,
            plugins: Vec::new(),
        }
    }

    /// A generator with every plugin this crate ships registered.
    pub fn with_default_plugins(options: GeneratorOptions) -> Self {
        let mut generator = Self::new(options);
        generator.register(Box::new(GrpcSerial::new()));
        generator
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Keep only the plugins named by `plugins=`, in registration order.
    fn select_plugins(&mut self) -> Result<(), Error> {
        let wanted: Vec<&str> = self.options.plugin_names().collect();
        if wanted.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = wanted
            .iter()
            .find(|name| !self.plugins.iter().any(|plugin| plugin.name() == **name))
        {
            return Err(Error::UnknownPlugin((*unknown).to_string()));
        }
        self.plugins
            .retain(|plugin| wanted.iter().any(|name| *name == plugin.name()));
        Ok(())
    }

    /// Generate output files for every file protoc asked for.
    pub fn run(
        &mut self,
        request: &CodeGeneratorRequest,
    ) -> Result<Vec<code_generator_response::File>, Error> {
        self.select_plugins()?;
        for plugin in &mut self.plugins {
            plugin.init(&mut self.host);
            debug!(plugin = plugin.name(), "initialised plugin");
        }

        let pool = DescriptorPool::from_files(&request.proto_file);
        let mut files = Vec::new();
        for name in &request.file_to_generate {
            let Some(descriptor) = pool.file_by_name(name) else {
                warn!(file = %name, "file to generate is missing from the request, skipping");
                continue;
            };
            let unit = FileUnit::new(descriptor, &pool);

            let mut body = Printer::new();
            for plugin in &mut self.plugins {
                plugin.generate(&unit, &mut body)?;
            }
            if body.is_empty() {
                debug!(file = %name, "no services, nothing to generate");
                continue;
            }

            let mut imports = Printer::new();
            for plugin in &mut self.plugins {
                plugin.generate_imports(&unit, &mut imports);
            }

            let output_name = output_file_name(name);
            info!(file = %name, output = %output_name, "generated");
            files.push(code_generator_response::File {
                name: Some(output_name),
                content: Some(render_file(descriptor, &imports, &body)),
                ..Default::default()
            });
        }
        Ok(files)
    }

    /// Run and wrap the result in a response; failures land in `error`.
    pub fn respond(&mut self, request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
        match self.run(request) {
            Ok(file) => CodeGeneratorResponse {
                supported_features: Some(Feature::Proto3Optional as u64),
                file,
                ..Default::default()
            },
            Err(error) => error_response(&error),
        }
    }
}

/// Parse options from the request and run the default plugins.
pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match GeneratorOptions::parse(request.parameter()) {
        Ok(options) => Generator::with_default_plugins(options).respond(request),
        Err(error) => error_response(&error),
    }
}

pub fn error_response(error: &Error) -> CodeGeneratorResponse {
    warn!(%error, "generation aborted");
    CodeGeneratorResponse {
        error: Some(error.to_string()),
        ..Default::default()
    }
}

/// `dir/hello.proto` → `dir/hello.serial.pb.go`.
pub fn output_file_name(proto_name: &str) -> String {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

fn render_file(descriptor: &FileDescriptorProto, imports: &Printer, body: &Printer) -> String {
    let (package_name, _) = go_package_name(descriptor);

    let mut out = Printer::new();
    out.line(format!("// Code generated by {}. DO NOT EDIT.", GENERATOR_NAME));
    out.line(format!("// source: {}", descriptor.name()));
    out.blank();
    out.line(format!("package {}", clean_package_name(&package_name)));
    out.blank();
    out.line(format!("import proto \"{}\"", SERIALIZATION_PKG_PATH));
    out.blank();
    out.append(imports);
    out.line("var _ = proto.Marshal");
    out.blank();
    out.append(body);
    out.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_parameter_gives_defaults() {
        let options = GeneratorOptions::parse("").unwrap();
        assert_eq!(options, GeneratorOptions::default());
        assert_eq!(options.mode, EmissionMode::Template);
        assert_eq!(options.log_filter(), "warn");
        assert_eq!(options.plugin_names().count(), 0);
    }

    #[test]
    fn parses_all_keys() {
        let options =
            GeneratorOptions::parse("plugins=grpcserial+other, mode=binding,import_prefix=vendor,log=debug")
                .unwrap();
        assert_eq!(options.plugin_names().collect::<Vec<_>>(), ["grpcserial", "other"]);
        assert_eq!(options.mode, EmissionMode::Binding);
        assert_eq!(options.import_prefix, "vendor");
        assert_eq!(options.log_filter(), "debug");
    }

    #[test]
    fn rejects_malformed_parameters() {
        assert!(matches!(
            GeneratorOptions::parse("plugins"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            GeneratorOptions::parse("colour=blue"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            GeneratorOptions::parse("mode=streaming"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn output_names_replace_proto_suffix() {
        assert_eq!(output_file_name("dir/hello.proto"), "dir/hello.serial.pb.go");
        assert_eq!(output_file_name("odd.txt"), "odd.txt.serial.pb.go");
    }

    #[test]
    fn unknown_plugin_is_rejected() {
        let options = GeneratorOptions::parse("plugins=grpc").unwrap();
        let mut generator = Generator::with_default_plugins(options);
        let response = generator.respond(&CodeGeneratorRequest::default());
        assert_eq!(response.error.as_deref(), Some("unknown plugin \"grpc\""));
        assert!(response.file.is_empty());
    }
}

//! The four-operation contract between the host generator and a plugin.

use crate::Error;
use crate::codegen::alias::PackageNames;
use crate::codegen::printer::Printer;
use crate::codegen::service::{EmissionMode, ServiceDriver};
use crate::codegen::{FileUnit, SupportPackages};

/// Name used to select this plugin with `plugins=<name>`.
pub const PLUGIN_NAME: &str = "grpcserial";

/// State the host shares with every plugin for the whole run.
#[derive(Debug, Default)]
pub struct HostContext {
    /// Package names claimed so far across all plugins.
    pub package_names: PackageNames,
    pub import_prefix: String,
    pub mode: EmissionMode,
}

/// A code generator the host discovers and drives.
///
/// The host calls [`Plugin::init`] once, then [`Plugin::generate`] and
/// [`Plugin::generate_imports`] at most once each per file, sequentially.
pub trait Plugin {
    fn name(&self) -> &str;
    fn init(&mut self, host: &mut HostContext);
    fn generate(&mut self, file: &FileUnit<'_>, out: &mut Printer) -> Result<(), Error>;
    fn generate_imports(&mut self, file: &FileUnit<'_>, out: &mut Printer);
}

/// Emits serialized request/response stubs for every service method.
#[derive(Debug, Clone)]
pub struct GrpcSerial {
    mode: EmissionMode,
    packages: SupportPackages,
}

impl Default for GrpcSerial {
    fn default() -> Self {
        Self {
            mode: EmissionMode::default(),
            packages: SupportPackages {
                context: "context".to_string(),
                grpc: PLUGIN_NAME.to_string(),
                import_prefix: String::new(),
            },
        }
    }
}

impl GrpcSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packages(&self) -> &SupportPackages {
        &self.packages
    }

    fn driver(&self) -> ServiceDriver<'_> {
        ServiceDriver::new(self.mode, &self.packages)
    }
}

impl Plugin for GrpcSerial {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn init(&mut self, host: &mut HostContext) {
        self.mode = host.mode;
        self.packages = SupportPackages {
            context: host.package_names.register_unique("context"),
            grpc: host.package_names.register_unique(PLUGIN_NAME),
            import_prefix: host.import_prefix.clone(),
        };
    }

    fn generate(&mut self, file: &FileUnit<'_>, out: &mut Printer) -> Result<(), Error> {
        self.driver().generate(file, out)
    }

    fn generate_imports(&mut self, file: &FileUnit<'_>, out: &mut Printer) {
        self.driver().generate_imports(file, out);
    }
}

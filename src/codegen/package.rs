// Output package resolution from file-level options.

use prost_types::FileDescriptorProto;

use super::names::base_name;

/// A parsed `go_package` file option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageOption<'a> {
    /// Import path, present only when the option contains a `/`.
    pub import_path: Option<&'a str>,
    pub name: &'a str,
}

/// Interpret the file's `go_package` option.
///
/// - `"name"` → no import path, package `name`.
/// - `"path/name"` → import path `path/name`, package `name`.
/// - `"path/name;alias"` → import path `path/name`, package `alias`.
///
/// The `;` split only happens after a `/` was found, so `"name;alias"` comes
/// back whole as the package name.
pub fn go_package_option(file: &FileDescriptorProto) -> Option<PackageOption<'_>> {
    let option = file.options.as_ref()?.go_package();
    if option.is_empty() {
        return None;
    }

    let Some(slash) = option.rfind('/') else {
        return Some(PackageOption {
            import_path: None,
            name: option,
        });
    };

    // The semicolon is searched over the whole option, not just the suffix.
    match option.find(';') {
        Some(semicolon) => Some(PackageOption {
            import_path: Some(&option[..semicolon]),
            name: &option[semicolon + 1..],
        }),
        None => Some(PackageOption {
            import_path: Some(option),
            name: &option[slash + 1..],
        }),
    }
}

/// Package name for generated output and whether it came from `go_package`.
///
/// Precedence: `go_package` option, then the proto `package` clause, then the
/// file's base name.
pub fn go_package_name(file: &FileDescriptorProto) -> (String, bool) {
    if let Some(option) = go_package_option(file) {
        return (option.name.to_string(), true);
    }
    if !file.package().is_empty() {
        return (file.package().to_string(), false);
    }
    (base_name(file.name()).to_string(), false)
}

/// Path used in import lines for types declared in `file`: the option's
/// import path when there is one, otherwise the package name.
pub fn import_path(file: &FileDescriptorProto) -> String {
    match go_package_option(file) {
        Some(PackageOption {
            import_path: Some(path),
            ..
        }) => path.to_string(),
        _ => go_package_name(file).0,
    }
}

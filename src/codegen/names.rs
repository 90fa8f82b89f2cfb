// Identifier resolution: descriptor names to Go identifiers.

/// Exported names that would shadow methods generated on message types or
/// functions of the serialization package.
const RESERVED_NAMES: &[&str] = &[
    "Descriptor",
    "Marshal",
    "ProtoMessage",
    "Reset",
    "String",
    "Unmarshal",
];

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough", "for",
    "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

/// Convert a declared name to an exported identifier.
///
/// `_` and digits mark word boundaries: the first letter of every word is
/// upper-cased and the underscores are dropped. A leading underscore becomes
/// `X` so the result is still exported.
///
/// `say_hello` → `SayHello`, `http2_server` → `Http2Server`, `_hidden` → `XHidden`.
pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();

    if name.starts_with('_') {
        out.push('X');
        chars.next();
    }

    let mut word_start = true;
    for c in chars {
        if c == '_' {
            word_start = true;
            continue;
        }
        if c.is_ascii_digit() {
            out.push(c);
            word_start = true;
            continue;
        }
        if word_start {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        // Upper-case letters inside a word are kept as written.
        word_start = false;
    }
    out
}

/// Lower-case the first letter only: `HelloRequest` → `helloRequest`.
pub fn unexport(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
    }
}

/// Exported stub identifier for a declared method (or service) name,
/// suffixed with `_` when it collides with a reserved name.
pub fn exported_name(name: &str) -> String {
    let mut exported = camel_case(name);
    if RESERVED_NAMES.contains(&exported.as_str()) {
        exported.push('_');
    }
    exported
}

/// Local variable name for a value of the given Go type name. Keywords and
/// names for which `taken` holds get `_` appended until neither applies.
pub fn variable_name(type_name: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut var = unexport(type_name);
    while GO_KEYWORDS.contains(&var.as_str()) || taken(&var) {
        var.push('_');
    }
    var
}

/// Go type name of a (possibly nested) message: each level goes through
/// [`camel_case`] and levels are joined with `_`.
pub fn go_type_name(path: &[String]) -> String {
    path.iter()
        .map(|part| camel_case(part))
        .collect::<Vec<_>>()
        .join("_")
}

/// Last path element of a file name with its last dotted suffix removed.
pub fn base_name(name: &str) -> &str {
    let name = match name.rfind('/') {
        Some(slash) => &name[slash + 1..],
        None => name,
    };
    match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}

/// Make a string usable as a Go package identifier.
pub fn clean_package_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        cleaned.insert(0, '_');
    }
    cleaned
}

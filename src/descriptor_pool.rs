use std::collections::HashMap;

use prost_types::{DescriptorProto, FileDescriptorProto};

/// Where a message type was declared: which file, and under which chain of
/// enclosing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MessageEntry {
    file: usize,
    path: Vec<String>,
}

/// A resolved message type reference.
#[derive(Debug, Clone, Copy)]
pub struct MessageRef<'p> {
    /// The file declaring the message.
    pub file: &'p FileDescriptorProto,
    /// Declared names from the outermost message inwards, e.g. `["Outer", "Inner"]`.
    pub path: &'p [String],
}

/// Name lookup over every file the host compiler supplied.
///
/// Only message names are indexed; nothing else about the descriptors is
/// checked.
#[derive(Debug, Default)]
pub struct DescriptorPool<'a> {
    files: Vec<&'a FileDescriptorProto>,
    messages: HashMap<String, MessageEntry>,
}

impl<'a> DescriptorPool<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from all files at once (the host's `proto_file` list).
    pub fn from_files(files: impl IntoIterator<Item = &'a FileDescriptorProto>) -> Self {
        let mut pool = Self::new();
        for file in files {
            pool.add_file(file);
        }
        pool
    }

    /// Strip leading dot from type name (protoc sends ".package.Type", we store "package.Type")
    fn normalize_type_name(type_name: &str) -> &str {
        type_name.strip_prefix('.').unwrap_or(type_name)
    }

    /// Add a FileDescriptorProto to the pool
    pub fn add_file(&mut self, file: &'a FileDescriptorProto) {
        let index = self.files.len();
        self.files.push(file);

        let package = file.package();
        let mut path = Vec::new();
        for message in &file.message_type {
            let full_name = if package.is_empty() {
                message.name().to_string()
            } else {
                format!("{}.{}", package, message.name())
            };
            self.add_message(index, message, &full_name, &mut path);
        }
    }

    fn add_message(
        &mut self,
        file: usize,
        message: &DescriptorProto,
        full_name: &str,
        path: &mut Vec<String>,
    ) {
        path.push(message.name().to_string());
        self.messages.insert(
            full_name.to_string(),
            MessageEntry {
                file,
                path: path.clone(),
            },
        );

        for nested in &message.nested_type {
            let nested_full_name = format!("{}.{}", full_name, nested.name());
            self.add_message(file, nested, &nested_full_name, path);
        }
        path.pop();
    }

    /// Look up a file by the name protoc gave it (e.g. `"dir/hello.proto"`).
    pub fn file_by_name(&self, name: &str) -> Option<&'a FileDescriptorProto> {
        self.files.iter().copied().find(|file| file.name() == name)
    }

    /// Resolve a message type reference, with or without the leading dot.
    pub fn find_message(&self, type_name: &str) -> Option<MessageRef<'_>> {
        let entry = self.messages.get(Self::normalize_type_name(type_name))?;
        Some(MessageRef {
            file: self.files[entry.file],
            path: &entry.path,
        })
    }
}

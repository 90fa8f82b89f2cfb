// Comment extraction from SourceCodeInfo
//
// Maps the numeric location paths protoc records (e.g. `[6, 0, 2, 1]` for
// the second method of the first service) to their leading comments.

use std::collections::HashMap;

use prost_types::FileDescriptorProto;

/// `FileDescriptorProto.service` field number.
const SERVICE_FIELD: i32 = 6;
/// `ServiceDescriptorProto.method` field number.
const METHOD_FIELD: i32 = 2;

#[derive(Debug, Default)]
pub struct Comments {
    by_path: HashMap<Vec<i32>, String>,
}

impl Comments {
    /// Collect leading comments, falling back to trailing ones, from the
    /// file's source_code_info. Files without it yield an empty map.
    pub fn extract(file: &FileDescriptorProto) -> Self {
        let mut by_path = HashMap::new();

        let Some(source_code_info) = file.source_code_info.as_ref() else {
            return Self { by_path };
        };

        for location in &source_code_info.location {
            let comment = location
                .leading_comments
                .as_deref()
                .or(location.trailing_comments.as_deref());
            let Some(comment) = comment else {
                continue;
            };
            if location.path.is_empty() || comment.trim().is_empty() {
                continue;
            }
            by_path.insert(location.path.clone(), comment.to_string());
        }

        Self { by_path }
    }

    pub fn method(&self, service: usize, method: usize) -> Option<&str> {
        let path = [
            SERVICE_FIELD,
            i32::try_from(service).ok()?,
            METHOD_FIELD,
            i32::try_from(method).ok()?,
        ];
        self.by_path.get(path.as_slice()).map(String::as_str)
    }

    pub fn service(&self, service: usize) -> Option<&str> {
        let path = [SERVICE_FIELD, i32::try_from(service).ok()?];
        self.by_path.get(path.as_slice()).map(String::as_str)
    }
}

/// Turn a raw protoc comment into `//` lines: the trailing newline is dropped
/// and one leading space per line is trimmed.
pub fn comment_lines(comment: &str) -> Vec<String> {
    comment
        .strip_suffix('\n')
        .unwrap_or(comment)
        .split('\n')
        .map(|line| {
            let line = line.strip_prefix(' ').unwrap_or(line);
            if line.is_empty() {
                "//".to_string()
            } else {
                format!("// {}", line)
            }
        })
        .collect()
}

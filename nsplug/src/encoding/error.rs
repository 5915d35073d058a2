use thiserror::Error;

/// Failure to move a value across the dynamic/typed boundary.
///
/// Every variant carries the path (`$`, `$[1]`, `$.name`) of the element
/// that failed so nested failures can be located.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("type mismatch at {path}: cannot convert {actual} to {expected}")]
    TypeMismatch {
        expected: String,
        actual: String,
        path: String,
    },

    #[error("out of range at {path}: {value} does not fit in {target}")]
    Range {
        target: String,
        value: String,
        path: String,
    },

    #[error("shape mismatch at {path}: cannot decode {actual} into {expected}")]
    Shape {
        expected: String,
        actual: String,
        path: String,
    },
}

pub type ConversionResult<T> = Result<T, ConversionError>;

pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

pub(crate) fn key_path(path: &str, key: &crate::value::MapKey) -> String {
    match key {
        crate::value::MapKey::String(s) => format!("{}.{}", path, s),
        other => format!("{}[{}]", path, other),
    }
}

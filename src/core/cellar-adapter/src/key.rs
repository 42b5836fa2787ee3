//! Remote key derivation.

/// Separator between a namespace and a record key.
pub const KEY_SEPARATOR: char = '_';

/// Builds the remote key for a record.
///
/// Without a record key the namespace itself is returned: it addresses the
/// document holding the whole collection.
pub fn build_key(namespace: &str, record_key: Option<&str>) -> String {
    match record_key {
        Some(key) => {
            let mut remote = String::with_capacity(namespace.len() + 1 + key.len());
            remote.push_str(namespace);
            remote.push(KEY_SEPARATOR);
            remote.push_str(key);
            remote
        },
        None => namespace.to_string(),
    }
}

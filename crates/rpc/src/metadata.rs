use tonic::metadata::MetadataMap;

use scriptgate_core::auth::CredentialSource;

/// Exposes gRPC call metadata to the auth gate.
///
/// Only ASCII metadata is consulted; binary (`-bin`) entries and values that
/// are not visible ASCII read as absent.
#[derive(Debug, Clone, Copy)]
pub struct MetadataCredentials<'a>(pub &'a MetadataMap);

impl CredentialSource for MetadataCredentials<'_> {
    fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }
}

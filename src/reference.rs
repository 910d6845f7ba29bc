//! Image reference and sync task value types

use crate::config::RegistryEndpoint;
use std::fmt;

/// Full address of one artifact instance in a registry.
///
/// Identity is tag identity: two references are the same image when
/// registry, namespace, repository and tag all match. Digests are never
/// compared; this is a tag-identity mirror, not a content-identity one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    pub registry: String,
    pub namespace: String,
    pub repository: String,
    pub tag: String,
}

impl ImageReference {
    pub fn new(
        registry: impl Into<String>,
        namespace: impl Into<String>,
        repository: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            namespace: namespace.into(),
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    /// Reference under an endpoint's namespace, repository path preserved verbatim
    pub fn in_endpoint(endpoint: &RegistryEndpoint, repository: &str, tag: &str) -> Self {
        Self::new(&endpoint.host, &endpoint.namespace, repository, tag)
    }

    /// The pullable/pushable image URL, `registry/namespace/repository:tag`
    pub fn image_url(&self) -> String {
        format!(
            "{}/{}/{}:{}",
            self.registry, self.namespace, self.repository, self.tag
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.image_url())
    }
}

/// One unit of mirror work, derived at discovery time and never mutated
/// after dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub source: ImageReference,
    pub dest: ImageReference,
}

impl SyncTask {
    /// Derive a task for one discovered (repository, tag) pair by
    /// substituting the destination registry/namespace.
    pub fn derive(
        source: &RegistryEndpoint,
        dest: &RegistryEndpoint,
        repository: &str,
        tag: &str,
    ) -> Self {
        Self {
            source: ImageReference::in_endpoint(source, repository, tag),
            dest: ImageReference::in_endpoint(dest, repository, tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        let r = ImageReference::new("quay.example.com", "apps", "app/web", "v1");
        assert_eq!(r.image_url(), "quay.example.com/apps/app/web:v1");
        assert_eq!(r.to_string(), r.image_url());
    }

    #[test]
    fn test_tag_identity() {
        let a = ImageReference::new("quay.example.com", "apps", "web", "v1");
        let b = ImageReference::new("quay.example.com", "apps", "web", "v1");
        let c = ImageReference::new("quay.example.com", "apps", "web", "v2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_task_derivation_preserves_repository() {
        let source = RegistryEndpoint::new("quay.prod.example.com", "apigee-prod");
        let dest = RegistryEndpoint::new("quay.dr.example.com", "apigee-dr");
        let task = SyncTask::derive(&source, &dest, "app/web", "v2");

        assert_eq!(task.source.registry, "quay.prod.example.com");
        assert_eq!(task.source.namespace, "apigee-prod");
        assert_eq!(task.dest.registry, "quay.dr.example.com");
        assert_eq!(task.dest.namespace, "apigee-dr");
        assert_eq!(task.source.repository, task.dest.repository);
        assert_eq!(task.source.tag, task.dest.tag);
    }
}

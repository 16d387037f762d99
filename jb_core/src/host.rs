use std::fmt;

/// Client identifier sent with every download request, rendered as
/// `product/version (os os_version arch) runtime/runtime_version`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserAgent {
    pub product: String,
    pub version: String,
    pub os_name: String,
    pub os_version: String,
    pub arch: String,
    pub runtime_name: String,
    pub runtime_version: String,
}

impl UserAgent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product: &str,
        version: &str,
        os_name: &str,
        os_version: &str,
        arch: &str,
        runtime_name: &str,
        runtime_version: &str,
    ) -> Self {
        Self {
            product: product.to_string(),
            version: version.to_string(),
            os_name: os_name.to_string(),
            os_version: os_version.to_string(),
            arch: arch.to_string(),
            runtime_name: runtime_name.to_string(),
            runtime_version: runtime_version.to_string(),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} {} {}) {}/{}",
            self.product,
            self.version,
            self.os_name,
            self.os_version,
            self.arch,
            self.runtime_name,
            self.runtime_version
        )
    }
}

/// Limits applied while loading dialect files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum nesting of `include` lists.
    pub max_include_depth: usize,
    /// Maximum bytes allowed per dialect file.
    pub max_file_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_include_depth: 16,
            max_file_size: 1024 * 1024,
        }
    }
}

//! Pipeline description exposed to plugins
//!
//! Any plugin may ask which pipeline it belongs to and how many process
//! workers that pipeline runs, e.g. to shard state across workers.

/// Details about the pipeline a plugin is attached to
pub trait PipelineDescription {
    /// Name of the pipeline the plugin belongs to
    fn pipeline_name(&self) -> &str;

    /// Number of process workers the pipeline runs
    fn number_of_process_workers(&self) -> usize;
}

/// Plain pipeline description handed to plugin factories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInfo {
    name: String,
    workers: usize,
}

impl PipelineInfo {
    /// Create a new description
    pub fn new(name: impl Into<String>, workers: usize) -> Self {
        Self {
            name: name.into(),
            workers,
        }
    }
}

impl Default for PipelineInfo {
    fn default() -> Self {
        Self::new("", 1)
    }
}

impl PipelineDescription for PipelineInfo {
    fn pipeline_name(&self) -> &str {
        &self.name
    }

    fn number_of_process_workers(&self) -> usize {
        self.workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_info() {
        let info = PipelineInfo::new("entry", 4);
        assert_eq!(info.pipeline_name(), "entry");
        assert_eq!(info.number_of_process_workers(), 4);
    }

    #[test]
    fn test_default_has_one_worker() {
        let info = PipelineInfo::default();
        assert_eq!(info.pipeline_name(), "");
        assert_eq!(info.number_of_process_workers(), 1);
    }
}

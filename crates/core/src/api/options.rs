//! DocumentOptions: the "Environment / configuration" knobs of §6, as a
//! fluent builder in the teacher's `ExtractorBuilder` style.

/// Load-time configuration for a `Document`. All knobs are optional and
/// default to the values §6 names.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub(crate) max_nesting_depth: u32,
    pub(crate) max_objstm_members: u32,
    pub(crate) max_xref_chain: u32,
    pub(crate) recovery_scan: bool,
    pub(crate) filter_output_cap: Option<usize>,
    pub(crate) password: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 32,
            max_objstm_members: 4096,
            max_xref_chain: 1024,
            recovery_scan: true,
            filter_output_cap: None,
            password: None,
        }
    }
}

impl DocumentOptions {
    pub fn builder() -> DocumentOptionsBuilder {
        DocumentOptionsBuilder::new()
    }

    pub fn max_nesting_depth(&self) -> u32 {
        self.max_nesting_depth
    }

    pub fn max_objstm_members(&self) -> u32 {
        self.max_objstm_members
    }

    pub fn max_xref_chain(&self) -> u32 {
        self.max_xref_chain
    }

    pub fn recovery_scan(&self) -> bool {
        self.recovery_scan
    }

    pub fn filter_output_cap(&self) -> Option<usize> {
        self.filter_output_cap
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

/// Fluent builder for `DocumentOptions`.
///
/// # Example
/// ```ignore
/// let opts = DocumentOptions::builder()
///     .max_nesting_depth(16)
///     .password("secret")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentOptionsBuilder {
    inner: DocumentOptions,
}

impl DocumentOptionsBuilder {
    pub fn new() -> Self {
        Self { inner: DocumentOptions::default() }
    }

    pub fn max_nesting_depth(mut self, depth: u32) -> Self {
        self.inner.max_nesting_depth = depth;
        self
    }

    pub fn max_objstm_members(mut self, max: u32) -> Self {
        self.inner.max_objstm_members = max;
        self
    }

    pub fn max_xref_chain(mut self, max: u32) -> Self {
        self.inner.max_xref_chain = max;
        self
    }

    pub fn recovery_scan(mut self, enabled: bool) -> Self {
        self.inner.recovery_scan = enabled;
        self
    }

    pub fn filter_output_cap(mut self, cap: usize) -> Self {
        self.inner.filter_output_cap = Some(cap);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.inner.password = Some(password.into());
        self
    }

    pub fn build(self) -> DocumentOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = DocumentOptions::default();
        assert_eq!(opts.max_nesting_depth(), 32);
        assert_eq!(opts.max_objstm_members(), 4096);
        assert_eq!(opts.max_xref_chain(), 1024);
        assert!(opts.recovery_scan());
        assert_eq!(opts.filter_output_cap(), None);
    }

    #[test]
    fn builder_overrides_apply() {
        let opts = DocumentOptions::builder().max_nesting_depth(8).password("secret").build();
        assert_eq!(opts.max_nesting_depth(), 8);
        assert_eq!(opts.password(), "secret");
    }
}

use strum::EnumIter;

/// The component on whose behalf a batch is sent to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum CallerLabel {
    /// The trusted sequencer building batches.
    Sequencer,
    /// The L1 synchronizer reprocessing batches.
    Synchronizer,
    /// A caller whose executions are not recorded.
    Discard,
}

impl CallerLabel {
    /// Returns the str representation of the [`CallerLabel`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sequencer => "sequencer",
            Self::Synchronizer => "synchronizer",
            Self::Discard => "discard",
        }
    }
}

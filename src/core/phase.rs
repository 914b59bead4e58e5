use std::fmt;

/// The five lifecycle phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Per-id init on the calling thread, before spawning.
    SeqInit,
    /// Per-id init on the worker thread, before the barrier.
    ParInit,
    /// Per-id body on the worker thread, after the barrier.
    Main,
    /// Per-id cleanup on the worker thread.
    ParFini,
    /// Per-id cleanup on the calling thread, after joining.
    SeqFini,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::SeqInit,
        Phase::ParInit,
        Phase::Main,
        Phase::ParFini,
        Phase::SeqFini,
    ];

    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::SeqInit => "seq_init",
            Phase::ParInit => "par_init",
            Phase::Main => "main",
            Phase::ParFini => "par_fini",
            Phase::SeqFini => "seq_fini",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

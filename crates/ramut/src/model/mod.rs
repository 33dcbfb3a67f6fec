//! Model — parsed events and the wide tables built from them.

pub mod event;
pub mod table;

pub use event::{
    CpuSample, EventKind, KillEvent, KillSource, LaunchEvent, Located, MeminfoSample,
    PackageVersion, ParsedEvent, ProcessLifecycleEvent, PsiSample, PssSample, RamStatusSample,
    AM_KILL_ADJ,
};
pub use table::{Column, RowKey, Value, WideTable};

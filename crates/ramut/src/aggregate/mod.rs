//! Aggregate — fan-in of worker results and the pivot into wide tables.

pub mod pivot;
pub mod reduce;
pub mod tables;

pub use pivot::PivotBuilder;
pub use reduce::Reduction;
pub use tables::{
    cpu_table, launch_table, lifecycle_events, memory_table, pss_table, ram_status_table,
    CPU_IOWAIT, CPU_KERNEL, CPU_TOTAL, CPU_USER,
};

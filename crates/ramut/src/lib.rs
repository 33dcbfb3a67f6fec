// Module structure for ramut: Android telemetry analysis.

// Core infrastructure
pub mod conf;
pub mod diag;
pub mod model;
pub mod registry;
pub mod runtime;

// Pipeline stages
pub mod scan;
pub mod normalize;
pub mod aggregate;
pub mod prune;
pub mod anomaly;
pub mod kill;
pub mod launch;

// Orchestration and output
pub mod pipeline;
pub mod report;

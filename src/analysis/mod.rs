// src/analysis/mod.rs
//! The analysis core: signature formatting, interface extraction,
//! satisfaction discovery, call-site enumeration, and the orchestrating
//! service. Each analysis sits behind a small trait so tests can wire
//! substitutes into the service.

pub mod calls;
pub mod format;
pub mod implementations;
pub mod interfaces;
pub mod service;

pub use calls::{CallAnalyzer, FlowCallAnalyzer};
pub use implementations::{ImplementationFinder, TypeBasedImplementationFinder};
pub use interfaces::{AstInterfaceAnalyzer, InterfaceAnalyzer, InterfaceKey};
pub use service::AnalysisService;

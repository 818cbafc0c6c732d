//! Plan aggregation and calendar reconciliation

pub mod context;
pub mod parser;
pub mod ports;
pub mod readers;
pub mod service;
pub mod writer;

pub use context::PlanContextBuilder;
pub use parser::PlanResponseParser;
pub use ports::{CalendarWorkspace, PlanningService};
pub use readers::{CalendarWindowReader, TaskReader};
pub use service::{PipelineSettings, PlanPipeline};
pub use writer::{CalendarWriter, RetryPolicy};

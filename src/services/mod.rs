pub mod flattener;
pub mod result_poller;
pub mod tabular_exporter;

pub use result_poller::ResultPoller;
pub use tabular_exporter::TabularExporter;

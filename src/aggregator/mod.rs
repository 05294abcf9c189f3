pub mod sink;
pub mod stats;
pub mod window;

pub use sink::{CsvRecordLog, RecordSink};
pub use window::{SampleAggregator, DEFAULT_FLUSH_PERIOD};

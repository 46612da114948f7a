pub mod channel;
pub mod http_ingest;

pub use channel::{ChannelSource, IngestHandle};
pub use http_ingest::HttpIngestSource;

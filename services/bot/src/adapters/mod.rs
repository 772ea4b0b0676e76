pub mod db;
pub mod extraction_llm;
pub mod sst;
pub mod storage;
pub mod transport;

pub use db::DbAdapter;
pub use extraction_llm::OpenAiExtractionAdapter;
pub use sst::OpenAiSstAdapter;
pub use storage::FsAudioStorage;
pub use transport::HttpBridgeTransport;

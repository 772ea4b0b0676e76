pub mod access;
pub mod coercion;
pub mod contract;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod rate_limiter;
pub mod replies;

#[cfg(test)]
mod testing;

pub use domain::{
    Attachment, InboundMessage, MessageKind, Report, ReportDetail, ReportKind, ReportOrigin,
    ReportQuery,
};
pub use pipeline::{IntakePipeline, Outcome, PipelineError, PipelinePorts, PipelineSettings, Rejection};
pub use ports::{
    ChatTransport, Clock, MediaStorage, PortError, PortResult, ReportExtractor, ReportRepository,
    SpeechToTextService, SystemClock,
};

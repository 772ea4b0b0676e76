//! services/bot/src/web/intake_task.rs
//!
//! Background worker that drains the webhook queue into the intake pipeline.

use site_report_core::domain::InboundMessage;
use site_report_core::pipeline::{IntakePipeline, Outcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs until the token is cancelled or every sender is dropped.
///
/// Each message is handled on its own task so a slow transcription never
/// delays other senders. On cancellation the queue is closed and whatever
/// was already accepted is still handled before returning.
pub async fn run_intake(
    mut rx: mpsc::Receiver<InboundMessage>,
    pipeline: Arc<IntakePipeline>,
    cancellation_token: CancellationToken,
) {
    let mut in_flight = JoinSet::new();
    info!("Intake worker started.");

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Intake worker cancelled.");
                break;
            }
            received = rx.recv() => {
                let Some(msg) = received else {
                    info!("Intake queue closed.");
                    break;
                };
                let pipeline = pipeline.clone();
                in_flight.spawn(async move { pipeline.handle(&msg).await });
            }
            // Reap finished tasks so the set does not grow unbounded.
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_joined(joined);
            }
        }
    }

    rx.close();
    let mut drained = 0usize;
    while let Some(msg) = rx.recv().await {
        let pipeline = pipeline.clone();
        in_flight.spawn(async move { pipeline.handle(&msg).await });
        drained += 1;
    }
    if drained > 0 {
        info!(drained, "Handling messages queued before shutdown.");
    }
    if !in_flight.is_empty() {
        info!(pending = in_flight.len(), "Waiting for in-flight messages.");
    }
    while let Some(joined) = in_flight.join_next().await {
        log_joined(joined);
    }
    info!("Intake worker stopped.");
}

fn log_joined(joined: Result<Outcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => debug!(?outcome, "message handled"),
        Err(e) => error!("Intake task panicked: {:?}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta, Utc};
    use site_report_core::domain::{Attachment, MessageKind, Report, ReportQuery};
    use site_report_core::pipeline::{PipelinePorts, PipelineSettings};
    use site_report_core::ports::{
        ChatTransport, Clock, MediaStorage, PortError, PortResult, ReportExtractor,
        ReportRepository, SpeechToTextService,
    };
    use site_report_core::contract::RawExtraction;
    use std::sync::Mutex;

    const CHAT: &str = "120363418875627490@g.us";

    #[derive(Default)]
    struct Transport(Mutex<Vec<String>>);

    #[async_trait]
    impl ChatTransport for Transport {
        async fn send_message(&self, _chat_id: &str, text: &str) -> PortResult<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
        async fn download_attachment(&self, _attachment: &Attachment) -> PortResult<Vec<u8>> {
            Err(PortError::NotFound("no media".to_string()))
        }
    }

    struct NoSpeech;

    #[async_trait]
    impl SpeechToTextService for NoSpeech {
        async fn transcribe_audio(&self, _audio: &[u8], _file_name: &str) -> PortResult<String> {
            Err(PortError::Unexpected("unused".to_string()))
        }
    }

    struct Extractor;

    #[async_trait]
    impl ReportExtractor for Extractor {
        async fn extract(&self, _source_text: &str) -> PortResult<RawExtraction> {
            RawExtraction::parse(r#"{"numeroProyecto":"730-0014"}"#)
                .map_err(|e| PortError::Unexpected(e.to_string()))
        }
    }

    #[derive(Default)]
    struct Reports(Mutex<Vec<Report>>);

    #[async_trait]
    impl ReportRepository for Reports {
        async fn insert_report(&self, report: &Report) -> PortResult<()> {
            self.0.lock().unwrap().push(report.clone());
            Ok(())
        }
        async fn list_reports(&self, _query: &ReportQuery) -> PortResult<Vec<Report>> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct NoMedia;

    #[async_trait]
    impl MediaStorage for NoMedia {
        async fn store(&self, _file_name: &str, _data: &[u8]) -> PortResult<String> {
            Err(PortError::Unexpected("unused".to_string()))
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(1_747_243_800, 0).unwrap_or_default()
        }
    }

    fn text(sender_id: &str, body: &str) -> InboundMessage {
        InboundMessage {
            message_id: format!("{sender_id}-{body}"),
            chat_id: CHAT.to_string(),
            is_group: true,
            sender_id: sender_id.to_string(),
            sender_name: Some("Juan".to_string()),
            body: body.to_string(),
            kind: MessageKind::Text,
            attachment: None,
        }
    }

    fn pipeline(transport: Arc<Transport>, reports: Arc<Reports>) -> Arc<IntakePipeline> {
        Arc::new(IntakePipeline::new(
            PipelineSettings {
                target_chat_id: CHAT.to_string(),
                allowed_senders: Vec::new(),
                cooldown: TimeDelta::seconds(60),
                min_text_chars: 10,
            },
            PipelinePorts {
                transport,
                transcriber: Arc::new(NoSpeech),
                extractor: Arc::new(Extractor),
                reports,
                media: Arc::new(NoMedia),
                clock: Arc::new(FixedClock),
            },
        ))
    }

    #[tokio::test]
    async fn drains_queued_messages_when_senders_drop() {
        let transport = Arc::new(Transport::default());
        let reports = Arc::new(Reports::default());
        let (tx, rx) = mpsc::channel(8);

        tx.send(text("111@c.us", "!reporte avance de obra en la torre norte"))
            .await
            .unwrap();
        tx.send(text("222@c.us", "ayuda")).await.unwrap();
        drop(tx);

        run_intake(
            rx,
            pipeline(transport.clone(), reports.clone()),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(reports.0.lock().unwrap().len(), 1);
        // Report acknowledgment, summary and help.
        assert_eq!(transport.0.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let transport = Arc::new(Transport::default());
        let reports = Arc::new(Reports::default());
        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();

        let worker = tokio::spawn(run_intake(
            rx,
            pipeline(transport, reports),
            token.clone(),
        ));
        token.cancel();
        worker.await.unwrap();

        assert!(tx.send(text("111@c.us", "ayuda")).await.is_err());
    }

    #[tokio::test]
    async fn cancellation_still_handles_accepted_messages() {
        let transport = Arc::new(Transport::default());
        let reports = Arc::new(Reports::default());
        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();

        tx.send(text("111@c.us", "!reporte avance de obra en la torre norte"))
            .await
            .unwrap();
        tx.send(text("222@c.us", "!reporte colado de losa en el nivel tres"))
            .await
            .unwrap();
        token.cancel();

        run_intake(rx, pipeline(transport, reports.clone()), token).await;

        assert_eq!(reports.0.lock().unwrap().len(), 2);
        assert!(tx.send(text("333@c.us", "ayuda")).await.is_err());
    }
}

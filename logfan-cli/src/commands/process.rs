//! `logfan process` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::info;

use logfan_log_pipeline::{HttpLogPipeline, InvocationReport, PipelineConfig, StreamBatch};

use crate::cli::{InputFormat, ProcessArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `process` command.
///
/// Decodes one stream batch, runs a single invocation against the configured
/// HTTP sinks and renders the invocation report.
///
/// # Errors
///
/// Returns `CliError::Pipeline` when decoding fails or any sink stage fails.
/// Side effects of variants that completed before the failure are kept.
pub async fn execute(
    args: ProcessArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let pipeline_config = PipelineConfig::from_core(&config);

    let input = read_input(&args.input).await?;
    let batch = decode_batch(&input, args.format)?;
    info!(
        input = %args.input.display(),
        records = batch.len(),
        skipped = batch.skipped,
        "decoded stream batch"
    );

    let at = match args.at {
        Some(at) => Some(at.with_timezone(&pipeline_config.archive_offset()?)),
        None => None,
    };

    let pipeline = HttpLogPipeline::connect(pipeline_config)?;
    let report = match at {
        Some(at) => pipeline.process_at(&batch, at).await?,
        None => pipeline.process(&batch).await?,
    };

    writer.render(&ProcessOutput {
        input: args.input.display().to_string(),
        report,
    })?;
    Ok(())
}

/// Read the whole input, `-` meaning stdin.
async fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        Ok(buf)
    } else {
        Ok(tokio::fs::read(path).await?)
    }
}

fn decode_batch(input: &[u8], format: InputFormat) -> Result<StreamBatch, CliError> {
    let batch = match format {
        InputFormat::Event => StreamBatch::from_event_json(input)?,
        InputFormat::Lines => StreamBatch::from_lines(input),
    };
    Ok(batch)
}

/// Result of one `process` run.
#[derive(Serialize)]
pub struct ProcessOutput {
    /// Input path (`-` for stdin)
    pub input: String,
    #[serde(flatten)]
    pub report: InvocationReport,
}

impl Render for ProcessOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let r = &self.report;
        writeln!(w, "Invocation: {}", self.input.bold())?;
        writeln!(
            w,
            "  {} received, {} classified, {} dropped ({} undecodable)",
            r.records_received, r.records_classified, r.records_dropped, r.records_undecodable
        )?;

        if r.variants.is_empty() {
            writeln!(w, "  (no classified records)")?;
            return Ok(());
        }

        for variant in &r.variants {
            writeln!(
                w,
                "  {:<14} alerts {:<4} archives {:<4} documents {}",
                variant.kind.log_name().cyan(),
                variant.alerts_sent,
                variant.archives.len(),
                variant.documents_indexed
            )?;
            for archive in &variant.archives {
                writeln!(w, "    {}", archive.url)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfan_log_pipeline::{ArchiveLocation, RecordKind, VariantReport};

    fn output() -> ProcessOutput {
        ProcessOutput {
            input: "batch.json".to_owned(),
            report: InvocationReport {
                records_received: 4,
                records_undecodable: 1,
                records_classified: 2,
                records_dropped: 2,
                variants: vec![VariantReport {
                    kind: RecordKind::Access,
                    alerts_sent: 0,
                    archives: vec![ArchiveLocation {
                        bucket: "logs".to_owned(),
                        key: "/nginx_access/2024/03/05/123045-a.example-nginx_access.gz"
                            .to_owned(),
                        url: "http://store/logs/nginx_access/2024/03/05/123045-a.example-nginx_access.gz"
                            .to_owned(),
                    }],
                    documents_indexed: 2,
                }],
            },
        }
    }

    #[test]
    fn test_render_text_lists_variants_and_archives() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        output().render_text(&mut buffer).expect("render should succeed");
        let text = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(text.contains("batch.json"));
        assert!(text.contains("4 received, 2 classified, 2 dropped (1 undecodable)"));
        assert!(text.contains("nginx_access"));
        assert!(text.contains("documents 2"));
        assert!(text.contains("123045-a.example-nginx_access.gz"));
    }

    #[test]
    fn test_json_output_is_flattened() {
        let value = serde_json::to_value(output()).expect("serialize");
        assert_eq!(value["input"], "batch.json");
        assert_eq!(value["records_received"], 4);
        assert_eq!(value["records_undecodable"], 1);
        assert_eq!(value["variants"][0]["kind"], "nginx_access");
    }

    #[test]
    fn test_decode_batch_lines() {
        let batch = decode_batch(b"{\"a\":1}\n{\"b\":2}\n", InputFormat::Lines).expect("decode");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_decode_batch_bad_envelope() {
        let err = decode_batch(b"[", InputFormat::Event).expect_err("bad envelope");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("batch.ndjson");
        std::fs::write(&path, b"{}\n").expect("write");
        assert_eq!(read_input(&path).await.expect("read"), b"{}\n");
    }

    #[tokio::test]
    async fn test_read_input_missing_file_is_io_error() {
        let err = read_input(Path::new("/nonexistent/batch.json"))
            .await
            .expect_err("missing file");
        assert_eq!(err.exit_code(), 10);
    }
}

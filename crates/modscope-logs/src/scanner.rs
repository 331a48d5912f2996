use chrono::{DateTime, Utc};
use futures::AsyncBufReadExt;
use tracing::{debug, info};

use modscope_k8s::LogSource;
use modscope_types::{LogQuery, PodInfo};

use crate::{RecordCollector, RecordDecoder, RecordFilter, ScanError};

/// Scans the WAF logs of every pod matching a query, one pod at a time
pub struct LogScanner {
    /// Selection criteria
    query: LogQuery,

    /// Reference time for the `since` window
    now: DateTime<Utc>,
}

impl LogScanner {
    /// Create a scanner anchored at the current time
    pub fn new(query: LogQuery) -> Self {
        Self {
            query,
            now: Utc::now(),
        }
    }

    /// Anchor the time window at a fixed instant
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Enumerate pods and collect their accepted records.
    ///
    /// The first failure aborts the scan and discards everything collected.
    pub async fn scan<S: LogSource>(&self, source: &S) -> Result<RecordCollector, ScanError> {
        let pods = source
            .list_pods(&self.query.selector)
            .await
            .map_err(|source| ScanError::ListPods {
                selector: self.query.selector.clone(),
                source,
            })?;
        debug!(selector = %self.query.selector, pods = pods.len(), "listed pods");

        let filter = RecordFilter::new(&self.query, self.now);
        debug!(cutoff = ?filter.cutoff(), code = ?filter.code(), "record filter");
        let mut collector = RecordCollector::new();

        for pod in &pods {
            self.scan_pod(source, pod, &filter, &mut collector).await?;
            collector.stats_mut().pods_scanned += 1;
        }

        let stats = collector.stats();
        info!(
            pods = stats.pods_scanned,
            lines = stats.lines_read,
            waf_lines = stats.waf_lines,
            kept = stats.records_kept,
            filtered = stats.records_filtered(),
            "log scan complete"
        );

        Ok(collector)
    }

    /// Stream one pod's log to the end. The stream is dropped on every return path.
    async fn scan_pod<S: LogSource>(
        &self,
        source: &S,
        pod: &PodInfo,
        filter: &RecordFilter,
        collector: &mut RecordCollector,
    ) -> Result<(), ScanError> {
        let mut stream = source
            .open_log(pod)
            .await
            .map_err(|source| ScanError::OpenStream {
                pod: pod.clone(),
                source,
            })?;
        debug!(%pod, "scanning pod log");

        let mut buf = Vec::new();
        let mut line_number = 0u64;

        // Raw bytes: only marked lines are decoded, so stray bytes in other
        // controller output are skipped like any unmarked line
        loop {
            buf.clear();
            let read = stream
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source| ScanError::ReadStream {
                    pod: pod.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }

            line_number += 1;
            collector.stats_mut().lines_read += 1;

            let record = match RecordDecoder::decode(trim_line_ending(&buf)) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(source) => {
                    return Err(ScanError::Decode {
                        pod: pod.clone(),
                        line_number,
                        source,
                    });
                }
            };
            collector.stats_mut().waf_lines += 1;

            let keep = filter
                .matches(&record)
                .map_err(|source| ScanError::Timestamp {
                    pod: pod.clone(),
                    line_number,
                    value: record.timestamp().to_string(),
                    source,
                })?;

            if keep {
                collector.push(record);
            }
        }

        debug!(%pod, lines = line_number, "pod log finished");
        Ok(())
    }
}

/// Strip a trailing `\n` and then a trailing `\r`
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

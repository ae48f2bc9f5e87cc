// Metrics module - Prometheus-compatible counters for the banner pipeline
// Counters are atomics or mutex-guarded maps so renders never contend for long

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::constants::MAX_RENDER_DURATION_SAMPLES;

/// Histogram represents percentile statistics for render durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Histogram {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

/// BannerMetrics tracks render outcomes for Prometheus export
/// Thread-safe via atomic operations and mutexes
#[derive(Debug, Default)]
pub struct BannerMetrics {
    // Join events handed to the renderer
    join_events: AtomicU64,

    // Successful image renders
    banners_rendered: AtomicU64,

    // Caption-only results because banners are disabled for the guild
    banners_text_only: AtomicU64,

    // Caption-only results because a render failed, by error reason
    fallbacks: Mutex<HashMap<String, u64>>,

    // Avatar fetch failures by kind (timeout, http, decode)
    fetch_failures: Mutex<HashMap<String, u64>>,

    // Custom backgrounds replaced by the default template
    background_fallbacks: AtomicU64,

    // Join events dropped because the worker queue was full
    queue_rejections: AtomicU64,

    // Most recent render durations in microseconds, capped
    render_durations: Mutex<VecDeque<u64>>,
}

impl BannerMetrics {
    /// Create a new BannerMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_join_events(&self) {
        self.join_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rendered(&self) {
        self.banners_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_text_only(&self) {
        self.banners_text_only.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a render that fell back to the caption, labelled by error reason
    pub fn increment_fallback(&self, reason: &str) {
        if let Ok(mut counts) = self.fallbacks.lock() {
            *counts.entry(reason.to_string()).or_insert(0) += 1;
        }
    }

    /// Count an avatar fetch failure, labelled by kind
    pub fn increment_fetch_failure(&self, kind: &str) {
        if let Ok(mut counts) = self.fetch_failures.lock() {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    pub fn increment_background_fallback(&self) {
        self.background_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queue_rejections(&self) {
        self.queue_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a render duration in milliseconds. Only the latest
    /// `MAX_RENDER_DURATION_SAMPLES` samples are kept.
    pub fn record_render_duration(&self, duration_ms: f64) {
        let duration_us = (duration_ms * 1000.0) as u64;
        if let Ok(mut durations) = self.render_durations.lock() {
            if durations.len() == MAX_RENDER_DURATION_SAMPLES {
                durations.pop_front();
            }
            durations.push_back(duration_us);
        }
    }

    pub fn join_events(&self) -> u64 {
        self.join_events.load(Ordering::Relaxed)
    }

    pub fn rendered(&self) -> u64 {
        self.banners_rendered.load(Ordering::Relaxed)
    }

    pub fn text_only(&self) -> u64 {
        self.banners_text_only.load(Ordering::Relaxed)
    }

    pub fn fallback_count(&self, reason: &str) -> u64 {
        self.fallbacks
            .lock()
            .ok()
            .and_then(|counts| counts.get(reason).copied())
            .unwrap_or(0)
    }

    /// Total fallbacks across all reasons
    pub fn total_fallbacks(&self) -> u64 {
        self.fallbacks
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    pub fn fetch_failure_count(&self, kind: &str) -> u64 {
        self.fetch_failures
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn background_fallbacks(&self) -> u64 {
        self.background_fallbacks.load(Ordering::Relaxed)
    }

    pub fn queue_rejections(&self) -> u64 {
        self.queue_rejections.load(Ordering::Relaxed)
    }

    /// Percentiles of recorded render durations in milliseconds
    pub fn render_duration_percentiles(&self) -> Option<Histogram> {
        let mut durations: Vec<u64> = self.render_durations.lock().ok()?.iter().copied().collect();
        if durations.is_empty() {
            return None;
        }
        durations.sort_unstable();

        Some(Histogram {
            p50: calculate_percentile(&durations, 50.0),
            p90: calculate_percentile(&durations, 90.0),
            p99: calculate_percentile(&durations, 99.0),
        })
    }

    /// Export all metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP welcome_join_events_total Member join events received\n");
        output.push_str("# TYPE welcome_join_events_total counter\n");
        output.push_str(&format!(
            "welcome_join_events_total {}\n",
            self.join_events()
        ));

        output.push_str("\n# HELP welcome_banners_rendered_total Banners rendered as images\n");
        output.push_str("# TYPE welcome_banners_rendered_total counter\n");
        output.push_str(&format!(
            "welcome_banners_rendered_total {}\n",
            self.rendered()
        ));

        output.push_str(
            "\n# HELP welcome_banners_text_only_total Greetings sent as text because banners are disabled\n",
        );
        output.push_str("# TYPE welcome_banners_text_only_total counter\n");
        output.push_str(&format!(
            "welcome_banners_text_only_total {}\n",
            self.text_only()
        ));

        output.push_str(
            "\n# HELP welcome_banner_fallbacks_total Renders degraded to a caption, by reason\n",
        );
        output.push_str("# TYPE welcome_banner_fallbacks_total counter\n");
        if let Ok(counts) = self.fallbacks.lock() {
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            for (reason, count) in sorted {
                output.push_str(&format!(
                    "welcome_banner_fallbacks_total{{reason=\"{}\"}} {}\n",
                    reason, count
                ));
            }
        }

        output.push_str("\n# HELP welcome_avatar_fetch_failures_total Avatar fetch failures by kind\n");
        output.push_str("# TYPE welcome_avatar_fetch_failures_total counter\n");
        if let Ok(counts) = self.fetch_failures.lock() {
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort();
            for (kind, count) in sorted {
                output.push_str(&format!(
                    "welcome_avatar_fetch_failures_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push_str(
            "\n# HELP welcome_background_fallbacks_total Custom backgrounds replaced by the default\n",
        );
        output.push_str("# TYPE welcome_background_fallbacks_total counter\n");
        output.push_str(&format!(
            "welcome_background_fallbacks_total {}\n",
            self.background_fallbacks()
        ));

        output.push_str(
            "\n# HELP welcome_queue_rejections_total Join events dropped on a full queue\n",
        );
        output.push_str("# TYPE welcome_queue_rejections_total counter\n");
        output.push_str(&format!(
            "welcome_queue_rejections_total {}\n",
            self.queue_rejections()
        ));

        if let Some(histogram) = self.render_duration_percentiles() {
            output.push_str(
                "\n# HELP welcome_render_duration_ms Banner render duration in milliseconds\n",
            );
            output.push_str("# TYPE welcome_render_duration_ms summary\n");
            output.push_str(&format!(
                "welcome_render_duration_ms{{quantile=\"0.5\"}} {}\n",
                histogram.p50
            ));
            output.push_str(&format!(
                "welcome_render_duration_ms{{quantile=\"0.9\"}} {}\n",
                histogram.p90
            ));
            output.push_str(&format!(
                "welcome_render_duration_ms{{quantile=\"0.99\"}} {}\n",
                histogram.p99
            ));
        }

        output
    }
}

/// Nearest-rank percentile of sorted microsecond samples, in milliseconds
fn calculate_percentile(sorted: &[u64], percentile: f64) -> f64 {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[index] as f64 / 1000.0
}

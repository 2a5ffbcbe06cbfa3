// perf.rs - Performance timing infrastructure for xqstatic
//
// Timing instrumentation for resolver runs and the CLI phases. Controlled
// via the XQSTATIC_PERF environment variable.
//
// Usage:
//   XQSTATIC_PERF=1 xqstatic query tree.json 42        # Enable basic timing logs
//   XQSTATIC_PERF=verbose xqstatic analysis-stats tree.json  # Also warn on slow phases

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Global flag indicating whether performance timing is enabled
static PERF_ENABLED: OnceLock<bool> = OnceLock::new();

/// Global flag indicating verbose mode (includes threshold warnings)
static PERF_VERBOSE: OnceLock<bool> = OnceLock::new();

/// Check if performance timing is enabled
pub fn is_enabled() -> bool {
    *PERF_ENABLED.get_or_init(|| {
        std::env::var("XQSTATIC_PERF")
            .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
            .unwrap_or(false)
    })
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    *PERF_VERBOSE.get_or_init(|| {
        std::env::var("XQSTATIC_PERF")
            .map(|v| v.to_lowercase() == "verbose")
            .unwrap_or(false)
    })
}

/// RAII timing guard that logs duration on drop
///
/// ```
/// use xqstatic::perf::TimingGuard;
///
/// let _guard = TimingGuard::new("operation_name");
/// // ... do work ...
/// // Duration logged when _guard goes out of scope
/// ```
pub struct TimingGuard {
    start: Instant,
    name: &'static str,
    threshold_warn_ms: Option<u64>,
    enabled: bool,
}

impl TimingGuard {
    /// Duration will be logged at INFO level when the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
            threshold_warn_ms: None,
            enabled: is_enabled(),
        }
    }

    /// Create a timing guard that also warns (in verbose mode) when the
    /// scope takes longer than `threshold_ms`.
    pub fn with_threshold(name: &'static str, threshold_ms: u64) -> Self {
        Self {
            threshold_warn_ms: Some(threshold_ms),
            ..Self::new(name)
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the guard without logging and return the duration.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        std::mem::forget(self); // Prevent Drop from running
        elapsed
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }

        let elapsed = self.start.elapsed();
        log::info!("[PERF] {} completed in {:?}", self.name, elapsed);

        if let Some(threshold) = self.threshold_warn_ms {
            if elapsed.as_millis() > threshold as u128 && is_verbose() {
                log::warn!(
                    "[PERF] {} exceeded threshold ({}ms > {}ms)",
                    self.name,
                    elapsed.as_millis(),
                    threshold
                );
            }
        }
    }
}

// ============================================================================
// Resolver counters
// ============================================================================

static RESOLVER_CALLS: AtomicUsize = AtomicUsize::new(0);
static CACHE_HITS: AtomicUsize = AtomicUsize::new(0);

/// Count one resolver invocation (cached or not).
pub fn record_resolver_call(cache_hit: bool) {
    RESOLVER_CALLS.fetch_add(1, Ordering::Relaxed);
    if cache_hit {
        CACHE_HITS.fetch_add(1, Ordering::Relaxed);
    }
}

/// `(calls, cache hits)` since process start.
pub fn resolver_counters() -> (usize, usize) {
    (
        RESOLVER_CALLS.load(Ordering::Relaxed),
        CACHE_HITS.load(Ordering::Relaxed),
    )
}

/// Log resolver counters when timing is enabled.
pub fn log_summary() {
    if !is_enabled() {
        return;
    }
    let (calls, hits) = resolver_counters();
    log::info!("[PERF] === Resolver Summary ===");
    log::info!("[PERF] Resolver calls: {} ({} cache hits)", calls, hits);
}

/// Returns the peak resident set size (RSS) of the current process in bytes.
///
/// - **macOS**: `libc::getrusage` (`ru_maxrss` is in bytes there).
/// - **Linux**: the `VmHWM` field of `/proc/self/status` (in kB).
/// - **Other platforms**: `None`.
pub fn peak_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "macos")]
    {
        peak_rss_macos()
    }
    #[cfg(target_os = "linux")]
    {
        peak_rss_linux()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "macos")]
fn peak_rss_macos() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
    // SAFETY: getrusage only writes through the pointer; the result is read
    // only after it reports success.
    let usage = unsafe {
        if libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) != 0 {
            return None;
        }
        usage.assume_init()
    };
    u64::try_from(usage.ru_maxrss).ok()
}

#[cfg(target_os = "linux")]
fn peak_rss_linux() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find_map(|l| l.strip_prefix("VmHWM:"))?;
    // Format: "VmHWM:    12345 kB"
    let trimmed = line.trim();
    let kb: u64 = trimmed.strip_suffix("kB").unwrap_or(trimmed).trim().parse().ok()?;
    Some(kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_guard_finish() {
        let guard = TimingGuard::with_threshold("test", 1);
        std::thread::sleep(Duration::from_millis(10));
        assert!(guard.elapsed().as_millis() >= 10);
        assert!(guard.finish().as_millis() >= 10);
    }

    #[test]
    fn test_resolver_counters_accumulate() {
        let (calls, hits) = resolver_counters();
        record_resolver_call(true);
        record_resolver_call(false);
        let (calls_after, hits_after) = resolver_counters();
        assert!(calls_after >= calls + 2);
        assert!(hits_after > hits);
    }

    #[test]
    fn test_peak_rss_bytes() {
        if cfg!(any(target_os = "linux", target_os = "macos")) {
            assert!(peak_rss_bytes().unwrap_or(0) > 0);
        }
    }
}

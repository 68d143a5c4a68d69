//! The stats pipeline: bounded per-stream snapshot caches flushed to
//! append-only CSV files.
//!
//! Two named streams exist by default: `changesampling` (appended on
//! every accepted mutation) and `timesampling` (appended every
//! `timesampling_frequency` steps). When any cache exceeds the flush
//! threshold, or at temperature boundaries, all caches are appended to
//! their output paths and cleared. The write is transactional per
//! stream: a cache is cleared only after its lines hit the file, so an
//! I/O failure preserves the data for retry.
//!
//! Ordering guarantee: lines appear in a stream in the simulation's
//! logical step order.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use strandsim_model::tube::Tube;

use crate::error::SimError;

/// Stream appended on every accepted mutation.
pub const CHANGESAMPLING: &str = "changesampling";

/// Stream appended every `timesampling_frequency` steps.
pub const TIMESAMPLING: &str = "timesampling";

/// Cache entries above which an automatic flush-all triggers.
pub const FLUSH_THRESHOLD: usize = 10_000;

/// One aggregate hybridization observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    /// Temperature at capture, Kelvin.
    pub temperature: f64,
    /// Hybridized domains.
    pub n_domains_hybridized: u64,
    /// Fraction of the domain population hybridized.
    pub f_domains_hybridized: f64,
    /// Hybridized strands (any domain paired).
    pub n_strands_hybridized: u64,
    /// Fraction of the strand population hybridized.
    pub f_strands_hybridized: f64,
}

impl StatsSnapshot {
    /// Capture the tube's aggregate state at temperature `t_kelvin`.
    #[must_use]
    pub fn from_tube(t_kelvin: f64, tube: &Tube) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let n_domains = tube.n_domains() as f64;
        #[allow(clippy::cast_precision_loss)]
        let n_strands = tube.n_strands() as f64;
        #[allow(clippy::cast_precision_loss)]
        let f_domains = if n_domains > 0.0 {
            tube.n_domains_hybridized() as f64 / n_domains
        } else {
            0.0
        };
        #[allow(clippy::cast_precision_loss)]
        let f_strands = if n_strands > 0.0 {
            tube.n_strands_hybridized() as f64 / n_strands
        } else {
            0.0
        };
        Self {
            temperature: t_kelvin,
            n_domains_hybridized: tube.n_domains_hybridized(),
            f_domains_hybridized: f_domains,
            n_strands_hybridized: tube.n_strands_hybridized(),
            f_strands_hybridized: f_strands,
        }
    }

    /// One CSV line: `T,N_dom_hyb,f_dom_hyb,N_strand_hyb,f_strand_hyb`.
    /// The format is stable for downstream processing.
    #[must_use]
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.temperature,
            self.n_domains_hybridized,
            self.f_domains_hybridized,
            self.n_strands_hybridized,
            self.f_strands_hybridized
        )
    }
}

/// Flush-time context, used for the optional statsline and for error
/// reporting.
#[derive(Debug, Clone, Copy)]
pub struct FlushContext {
    /// Temperature of the flushing simulation, Kelvin.
    pub temperature: f64,
    /// Step counter at flush time.
    pub step: u64,
    /// Hybridized domains at flush time.
    pub n_domains_hybridized: u64,
    /// Total domain population.
    pub n_domains: u64,
}

impl FlushContext {
    /// Capture from the tube.
    #[must_use]
    pub fn from_tube(t_kelvin: f64, tube: &Tube) -> Self {
        Self {
            temperature: t_kelvin,
            step: tube.n_steps(),
            n_domains_hybridized: tube.n_domains_hybridized(),
            n_domains: tube.n_domains() as u64,
        }
    }
}

#[derive(Debug)]
struct StatsStream {
    path: Option<PathBuf>,
    cache: Vec<StatsSnapshot>,
}

/// The per-stream bounded caches and their flush machinery.
#[derive(Debug)]
pub struct StatsCollector {
    streams: BTreeMap<String, StatsStream>,
    enabled: bool,
    print_statsline: bool,
    flush_count: u64,
}

impl StatsCollector {
    /// Build the default streams. Output paths derive from `base` by
    /// suffixing `_<streamname>` before the extension; with no base the
    /// caches stay bounded but nothing is written.
    #[must_use]
    pub fn new(base: Option<&Path>, enabled: bool, print_statsline: bool) -> Self {
        let mut streams = BTreeMap::new();
        for name in [CHANGESAMPLING, TIMESAMPLING] {
            streams.insert(
                name.to_string(),
                StatsStream {
                    path: base.map(|b| derive_stream_path(b, name)),
                    cache: Vec::new(),
                },
            );
        }
        Self {
            streams,
            enabled,
            print_statsline,
            flush_count: 0,
        }
    }

    /// Whether stats capture is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Completed flushes that wrote at least one line.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// The in-memory cache of a stream (empty for unknown names).
    #[must_use]
    pub fn cache(&self, stream: &str) -> &[StatsSnapshot] {
        self.streams
            .get(stream)
            .map_or(&[], |s| s.cache.as_slice())
    }

    /// The output path of a stream, if any.
    #[must_use]
    pub fn stream_path(&self, stream: &str) -> Option<&Path> {
        self.streams.get(stream).and_then(|s| s.path.as_deref())
    }

    /// Append a snapshot to a stream's cache. No-op when capture is
    /// disabled.
    pub fn record(&mut self, stream: &str, snapshot: StatsSnapshot) {
        if !self.enabled {
            return;
        }
        if let Some(s) = self.streams.get_mut(stream) {
            s.cache.push(snapshot);
        } else {
            debug_assert!(false, "unknown stats stream {stream:?}");
        }
    }

    /// Whether any cache has exceeded [`FLUSH_THRESHOLD`].
    #[must_use]
    pub fn any_over_threshold(&self) -> bool {
        self.streams.values().any(|s| s.cache.len() > FLUSH_THRESHOLD)
    }

    /// Append every non-empty cache to its output file and clear it.
    ///
    /// Flushing an empty cache is a no-op and produces no output lines.
    /// Files are opened per flush, append-only; no fsync. On failure the
    /// failed stream's cache (and any not yet visited) is preserved.
    ///
    /// # Errors
    ///
    /// [`SimError::StatsIo`] with stream, path, and step context.
    pub fn flush_all(&mut self, ctx: &FlushContext) -> Result<(), SimError> {
        if self.print_statsline {
            #[allow(clippy::cast_precision_loss)]
            let percent = if ctx.n_domains > 0 {
                100.0 * ctx.n_domains_hybridized as f64 / ctx.n_domains as f64
            } else {
                0.0
            };
            log::info!(
                "| total domain hybridization: {percent:.0}% ({} of {}) at T={} K",
                ctx.n_domains_hybridized,
                ctx.n_domains,
                ctx.temperature
            );
        }

        let mut wrote = false;
        for (name, stream) in &mut self.streams {
            if stream.cache.is_empty() {
                continue;
            }
            let Some(path) = &stream.path else {
                // Bounded-memory contract still holds without output
                // files; the snapshots are dropped.
                stream.cache.clear();
                continue;
            };
            let mut lines = String::new();
            for snapshot in &stream.cache {
                lines.push_str(&snapshot.csv_line());
                lines.push('\n');
            }
            let io = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(lines.as_bytes()));
            if let Err(source) = io {
                return Err(SimError::StatsIo {
                    stream: name.clone(),
                    path: path.clone(),
                    temperature: ctx.temperature,
                    step: ctx.step,
                    source,
                });
            }
            stream.cache.clear();
            wrote = true;
        }
        if wrote {
            self.flush_count += 1;
        }
        Ok(())
    }
}

/// Derive a stream's output path from a base path: `out/run.csv` →
/// `out/run_changesampling.csv`.
#[must_use]
pub fn derive_stream_path(base: &Path, stream: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let mut name = format!("{stem}_{stream}");
    if let Some(ext) = base.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    base.with_file_name(name)
}

#![forbid(unsafe_code)]

//! Time-bounded cache of the compiled rule set
//!
//! The cache is the only state shared between concurrent analyses. Readers
//! clone an `Arc<RuleSet>` under a short read lock and then work on that
//! snapshot; a rebuild compiles a complete new set off to the side and
//! publishes it by swapping the `Arc`, so no reader ever sees a half-built
//! set.
//!
//! Concurrent misses are serialized on a rebuild lock and re-check freshness
//! after acquiring it, so a burst of callers triggers a single rebuild.
//! `invalidate` bumps a generation counter; a set built under an older
//! generation is never considered fresh.

use crate::error::RuleSourceError;
use crate::rules::compiled::{CompiledRule, CompileOutput, RuleCompiler, RuleRejection};
use crate::rules::source::RuleSource;
use crate::types::RuleId;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default time-to-live of a compiled rule set
pub const DEFAULT_RULE_CACHE_TTL: Duration = Duration::from_secs(300);

/// An immutable compiled rule set snapshot
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    rejected: Vec<RuleRejection>,
    built_at: Instant,
    generation: u64,
}

impl RuleSet {
    fn new(output: CompileOutput, generation: u64) -> Self {
        Self {
            rules: output.rules,
            rejected: output.rejected,
            built_at: Instant::now(),
            generation,
        }
    }

    /// Build a standalone set from already compiled rules
    pub fn from_compiled(output: CompileOutput) -> Self {
        Self::new(output, 0)
    }

    /// Compiled rules in rank order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Records excluded during compilation
    pub fn rejected(&self) -> &[RuleRejection] {
        &self.rejected
    }

    pub fn get(&self, id: &RuleId) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn built_at(&self) -> Instant {
        self.built_at
    }
}

/// Lazily rebuilt, TTL-bounded holder of the current [`RuleSet`]
pub struct RuleCache {
    source: Arc<dyn RuleSource>,
    compiler: RuleCompiler,
    ttl: Duration,
    current: RwLock<Option<Arc<RuleSet>>>,
    rebuild_lock: Mutex<()>,
    generation: AtomicU64,
    rebuilds: AtomicU64,
}

impl RuleCache {
    /// Creates an empty cache; the first `get` builds the set
    ///
    /// A `ttl` of zero rebuilds on every access.
    pub fn new(source: Arc<dyn RuleSource>, compiler: RuleCompiler, ttl: Duration) -> Self {
        Self {
            source,
            compiler,
            ttl,
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Return the current rule set, rebuilding it if absent, invalidated or expired
    ///
    /// # Errors
    ///
    /// Returns the source's error if a rebuild is needed and the rule source
    /// cannot be read. Nothing is published in that case.
    pub fn get(&self) -> Result<Arc<RuleSet>, RuleSourceError> {
        if let Some(set) = self.fresh_snapshot() {
            tracing::trace!(rules = set.len(), "rule cache hit");
            return Ok(set);
        }

        let _guard = self.rebuild_lock.lock();

        // Another caller may have rebuilt while we waited
        if let Some(set) = self.fresh_snapshot() {
            return Ok(set);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let definitions = self.source.load_rules().inspect_err(|e| {
            tracing::error!(error = %e, "rule cache rebuild failed");
        })?;

        let started = Instant::now();
        let output = self.compiler.compile_all(&definitions);
        let set = Arc::new(RuleSet::new(output, generation));

        *self.current.write() = Some(Arc::clone(&set));
        self.rebuilds.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            rules = set.len(),
            rejected = set.rejected().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rule cache rebuilt"
        );

        Ok(set)
    }

    /// Discard the cached set so the next `get` rebuilds
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.current.write() = None;
        tracing::info!("rule cache invalidated");
    }

    /// The cached set, if any, without triggering a rebuild
    pub fn peek(&self) -> Option<Arc<RuleSet>> {
        self.current.read().clone()
    }

    /// Number of rebuilds performed so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fresh_snapshot(&self) -> Option<Arc<RuleSet>> {
        let current = self.current.read();
        let set = current.as_ref()?;
        let fresh = set.generation == self.generation.load(Ordering::Acquire)
            && set.built_at.elapsed() < self.ttl;
        fresh.then(|| Arc::clone(set))
    }
}

impl std::fmt::Debug for RuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCache")
            .field("ttl", &self.ttl)
            .field("compiler", &self.compiler)
            .field("cached", &self.current.read().as_ref().map(|s| s.len()))
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}

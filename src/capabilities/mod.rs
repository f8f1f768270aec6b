//! Count-driven capability gating.
//!
//! Prompts and resource categories are advertised only while the domain can
//! back them: a reflection prompt over zero entries is noise. Each gated
//! capability registers a predicate over [`DomainCounts`]; the gate recomputes
//! on every committed change and reports exactly the capabilities whose
//! enablement flipped. Startup is two-phase so the initial computation never
//! masquerades as a change.

use crate::models::DomainCounts;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Capability families, matching the MCP list surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    /// Entries under `prompts/list`.
    Prompts,
    /// Entries under `resources/list`.
    Resources,
    /// Entries under `tools/list`.
    Tools,
}

impl CapabilityKind {
    /// Returns the list surface name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prompts => "prompts",
            Self::Resources => "resources",
            Self::Tools => "tools",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One enablement transition produced by a recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityFlip {
    /// Capability id, unique across kinds.
    pub id: String,
    /// The list surface the capability belongs to.
    pub kind: CapabilityKind,
    /// New enablement state.
    pub enabled: bool,
}

type CapabilityPredicate = Box<dyn Fn(&DomainCounts) -> bool + Send + Sync>;

struct Registration {
    id: String,
    kind: CapabilityKind,
    predicate: CapabilityPredicate,
    enabled: bool,
}

struct GateInner {
    registrations: Vec<Registration>,
    initialized: bool,
}

/// Predicate-driven enablement for prompts and resource categories.
///
/// Capabilities stay disabled until [`CapabilityGate::initialize`] runs, so
/// registration order and startup timing never leak through the protocol as
/// spurious `list_changed` notifications.
pub struct CapabilityGate {
    inner: Mutex<GateInner>,
}

impl CapabilityGate {
    /// Creates an empty gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                registrations: Vec::new(),
                initialized: false,
            }),
        }
    }

    /// Registers a gated capability.
    ///
    /// Ids must be unique across kinds; flips for a recompute come out in
    /// registration order. A capability registered after initialization
    /// starts disabled and surfaces through the next recompute.
    pub fn register<P>(&self, id: impl Into<String>, kind: CapabilityKind, predicate: P)
    where
        P: Fn(&DomainCounts) -> bool + Send + Sync + 'static,
    {
        let mut inner = self.lock_inner();
        inner.registrations.push(Registration {
            id: id.into(),
            kind,
            predicate: Box::new(predicate),
            enabled: false,
        });
    }

    /// Computes the initial enablement states without reporting flips.
    pub fn initialize(&self, counts: &DomainCounts) {
        let mut inner = self.lock_inner();
        for registration in &mut inner.registrations {
            registration.enabled = (registration.predicate)(counts);
        }
        inner.initialized = true;
        tracing::debug!(
            enabled = inner.registrations.iter().filter(|r| r.enabled).count(),
            registered = inner.registrations.len(),
            "capability gate initialized"
        );
    }

    /// Re-evaluates every predicate and returns the flips.
    ///
    /// Before initialization this behaves like [`CapabilityGate::initialize`]
    /// and returns nothing.
    pub fn recompute(&self, counts: &DomainCounts) -> Vec<CapabilityFlip> {
        let mut inner = self.lock_inner();
        if !inner.initialized {
            for registration in &mut inner.registrations {
                registration.enabled = (registration.predicate)(counts);
            }
            inner.initialized = true;
            return Vec::new();
        }

        let mut flips = Vec::new();
        for registration in &mut inner.registrations {
            let enabled = (registration.predicate)(counts);
            if enabled != registration.enabled {
                registration.enabled = enabled;
                flips.push(CapabilityFlip {
                    id: registration.id.clone(),
                    kind: registration.kind,
                    enabled,
                });
            }
        }

        if !flips.is_empty() {
            metrics::counter!("capability_flips_total").increment(flips.len() as u64);
            for flip in &flips {
                tracing::debug!(id = %flip.id, kind = %flip.kind, enabled = flip.enabled, "capability flipped");
            }
        }
        flips
    }

    /// Returns the current enablement of a capability.
    ///
    /// Unknown ids and capabilities on an uninitialized gate read as
    /// disabled.
    #[must_use]
    pub fn is_enabled(&self, id: &str) -> bool {
        self.lock_inner()
            .registrations
            .iter()
            .find(|r| r.id == id)
            .is_some_and(|r| r.enabled)
    }

    fn lock_inner(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CapabilityGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses flips to the kinds they touch, first-seen order, no repeats.
///
/// One recompute may flip several prompts, but the protocol owes clients at
/// most one `list_changed` per surface.
#[must_use]
pub fn changed_kinds(flips: &[CapabilityFlip]) -> Vec<CapabilityKind> {
    let mut kinds = Vec::new();
    for flip in flips {
        if !kinds.contains(&flip.kind) {
            kinds.push(flip.kind);
        }
    }
    kinds
}

//! Frame phases, host identity tags, and capability sets

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six subscribable stages of a frame, in execution order.
///
/// `FixedUpdate` may run zero or more times per rendered frame (sub-stepping);
/// every other phase runs exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    EarlyUpdate,
    FixedUpdate,
    PreUpdate,
    Update,
    PreLateUpdate,
    PostLateUpdate,
}

impl Phase {
    /// Number of subscribable phases
    pub const COUNT: usize = 6;

    /// All phases in frame order
    pub const ALL: [Phase; Phase::COUNT] = [
        Phase::EarlyUpdate,
        Phase::FixedUpdate,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PreLateUpdate,
        Phase::PostLateUpdate,
    ];

    /// Position of this phase inside the host dispatch structure.
    ///
    /// Slots 0 and 1 belong to the host's own `TimeUpdate` and
    /// `Initialization` stages.
    pub fn host_index(self) -> usize {
        self.ordinal() + 2
    }

    /// Inverse of [`Phase::host_index`]
    pub fn from_host_index(index: usize) -> Option<Phase> {
        index.checked_sub(2).and_then(|i| Phase::ALL.get(i).copied())
    }

    /// Zero-based position in frame order
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// The tag the host uses for this phase's dispatch slot
    pub fn tag(self) -> PhaseTag {
        match self {
            Phase::EarlyUpdate => PhaseTag::EarlyUpdate,
            Phase::FixedUpdate => PhaseTag::FixedUpdate,
            Phase::PreUpdate => PhaseTag::PreUpdate,
            Phase::Update => PhaseTag::Update,
            Phase::PreLateUpdate => PhaseTag::PreLateUpdate,
            Phase::PostLateUpdate => PhaseTag::PostLateUpdate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::EarlyUpdate => "EarlyUpdate",
            Phase::FixedUpdate => "FixedUpdate",
            Phase::PreUpdate => "PreUpdate",
            Phase::Update => "Update",
            Phase::PreLateUpdate => "PreLateUpdate",
            Phase::PostLateUpdate => "PostLateUpdate",
        }
    }

    /// False only for `FixedUpdate`, whose count per frame is host-controlled
    pub fn runs_once_per_frame(self) -> bool {
        self != Phase::FixedUpdate
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity tag carried by each entry of the host dispatch structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseTag {
    TimeUpdate,
    Initialization,
    EarlyUpdate,
    FixedUpdate,
    PreUpdate,
    Update,
    PreLateUpdate,
    PostLateUpdate,
}

impl PhaseTag {
    /// The host's stock layout, in dispatch order
    pub const DEFAULT_LAYOUT: [PhaseTag; 8] = [
        PhaseTag::TimeUpdate,
        PhaseTag::Initialization,
        PhaseTag::EarlyUpdate,
        PhaseTag::FixedUpdate,
        PhaseTag::PreUpdate,
        PhaseTag::Update,
        PhaseTag::PreLateUpdate,
        PhaseTag::PostLateUpdate,
    ];

    /// The subscribable phase behind this tag, if any
    pub fn phase(self) -> Option<Phase> {
        match self {
            PhaseTag::TimeUpdate | PhaseTag::Initialization => None,
            PhaseTag::EarlyUpdate => Some(Phase::EarlyUpdate),
            PhaseTag::FixedUpdate => Some(Phase::FixedUpdate),
            PhaseTag::PreUpdate => Some(Phase::PreUpdate),
            PhaseTag::Update => Some(Phase::Update),
            PhaseTag::PreLateUpdate => Some(Phase::PreLateUpdate),
            PhaseTag::PostLateUpdate => Some(Phase::PostLateUpdate),
        }
    }
}

impl fmt::Display for PhaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase() {
            Some(phase) => f.write_str(phase.as_str()),
            None if *self == PhaseTag::TimeUpdate => f.write_str("TimeUpdate"),
            None => f.write_str("Initialization"),
        }
    }
}

bitflags! {
    /// Set of phases a subscriber provides callbacks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhaseSet: u8 {
        const EARLY_UPDATE = 1 << 0;
        const FIXED_UPDATE = 1 << 1;
        const PRE_UPDATE = 1 << 2;
        const UPDATE = 1 << 3;
        const PRE_LATE_UPDATE = 1 << 4;
        const POST_LATE_UPDATE = 1 << 5;
    }
}

impl PhaseSet {
    /// Iterate the phases in this set, in frame order
    pub fn phases(self) -> impl Iterator<Item = Phase> {
        Phase::ALL
            .into_iter()
            .filter(move |phase| self.contains(PhaseSet::from(*phase)))
    }

    pub fn includes(self, phase: Phase) -> bool {
        self.contains(PhaseSet::from(phase))
    }
}

impl From<Phase> for PhaseSet {
    fn from(phase: Phase) -> Self {
        PhaseSet::from_bits_truncate(1 << phase.ordinal())
    }
}

impl FromIterator<Phase> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = Phase>>(iter: I) -> Self {
        iter.into_iter()
            .fold(PhaseSet::empty(), |set, phase| set | PhaseSet::from(phase))
    }
}

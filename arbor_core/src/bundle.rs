//! Bundles, programs and scratch debug information.

use crate::machine::Engine;
use crate::slot::{ScratchAddr, Slot};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Bundle
// =============================================================================

/// The slots issued in one cycle, grouped by engine.
///
/// Slots keep their issue order within each engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    slots: [Vec<Slot>; Engine::COUNT],
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding a single slot.
    pub fn single(slot: Slot) -> Self {
        let mut bundle = Self::new();
        bundle.push(slot);
        bundle
    }

    /// Append a slot to its engine's list.
    #[inline]
    pub fn push(&mut self, slot: Slot) {
        self.slots[slot.engine().index()].push(slot);
    }

    /// Slots issued on `engine`.
    #[inline]
    pub fn slots(&self, engine: Engine) -> &[Slot] {
        &self.slots[engine.index()]
    }

    /// Number of slots issued on `engine`.
    #[inline]
    pub fn count(&self, engine: Engine) -> usize {
        self.slots[engine.index()].len()
    }

    /// Total number of slots, debug included.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Whether no engine issues anything.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    /// Whether the bundle costs a cycle.
    pub fn has_non_debug(&self) -> bool {
        Engine::ALL
            .iter()
            .any(|&e| !e.is_debug() && !self.slots[e.index()].is_empty())
    }

    /// All slots in engine order.
    pub fn iter(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slots.iter().flatten()
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for engine in Engine::ALL {
            let slots = self.slots(engine);
            if slots.is_empty() {
                continue;
            }
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: [", engine)?;
            for (i, slot) in slots.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", slot)?;
            }
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}

// =============================================================================
// Program
// =============================================================================

/// An ordered sequence of bundles, one per issue cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    bundles: Vec<Bundle>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one bundle.
    #[inline]
    pub fn push(&mut self, bundle: Bundle) {
        self.bundles.push(bundle);
    }

    /// All bundles.
    #[inline]
    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// Bundle at `pc`.
    #[inline]
    pub fn get(&self, pc: usize) -> Option<&Bundle> {
        self.bundles.get(pc)
    }

    /// Number of bundles.
    #[inline]
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Whether the program has no bundles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Bundles that cost a cycle when executed once, in order.
    pub fn issue_cycles(&self) -> usize {
        self.bundles.iter().filter(|b| b.has_non_debug()).count()
    }

    /// Total slots issued on `engine` across the program.
    pub fn slot_count(&self, engine: Engine) -> usize {
        self.bundles.iter().map(|b| b.count(engine)).sum()
    }
}

impl Extend<Bundle> for Program {
    fn extend<T: IntoIterator<Item = Bundle>>(&mut self, iter: T) {
        self.bundles.extend(iter);
    }
}

impl FromIterator<Bundle> for Program {
    fn from_iter<T: IntoIterator<Item = Bundle>>(iter: T) -> Self {
        Program {
            bundles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Bundle;
    type IntoIter = std::slice::Iter<'a, Bundle>;

    fn into_iter(self) -> Self::IntoIter {
        self.bundles.iter()
    }
}

// =============================================================================
// Debug Info
// =============================================================================

/// Names of scratch regions, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugInfo {
    /// Region start → (name, length).
    scratch_map: BTreeMap<ScratchAddr, (String, usize)>,
}

impl DebugInfo {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named region.
    pub fn insert(&mut self, addr: ScratchAddr, name: impl Into<String>, length: usize) {
        self.scratch_map.insert(addr, (name.into(), length));
    }

    /// Name and lane of the region containing `addr`.
    pub fn lookup(&self, addr: ScratchAddr) -> Option<(&str, usize)> {
        let (start, (name, length)) = self.scratch_map.range(..=addr).next_back()?;
        let lane = (addr.index() - start.index()) as usize;
        (lane < *length).then_some((name.as_str(), lane))
    }

    /// Regions in address order.
    pub fn regions(&self) -> impl Iterator<Item = (ScratchAddr, &str, usize)> + '_ {
        self.scratch_map
            .iter()
            .map(|(addr, (name, len))| (*addr, name.as_str(), *len))
    }

    /// Number of named regions.
    pub fn len(&self) -> usize {
        self.scratch_map.len()
    }

    /// Whether no region is named.
    pub fn is_empty(&self) -> bool {
        self.scratch_map.is_empty()
    }
}

use std::num::NonZero;

/// The default size-class capacities: 22 classes doubling from 16 elements up to 33,554,432.
///
/// The ladder spans four-and-a-half orders of magnitude so that both small scratch buffers
/// and multi-million-element working sets land in a class without configuration. Requests
/// above the top class are a fatal misconfiguration, not a supported case.
pub const DEFAULT_CAPACITIES: [usize; 22] = [
    16,
    32,
    64,
    128,
    256,
    512,
    1024,
    2048,
    4096,
    8192,
    16_384,
    32_768,
    65_536,
    131_072,
    262_144,
    524_288,
    1_048_576,
    2_097_152,
    4_194_304,
    8_388_608,
    16_777_216,
    33_554_432,
];

/// One rung of the ladder: an element capacity and the slab slot count derived for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SizeClass {
    /// How many elements one slot of this class holds.
    capacity: usize,

    /// How many slots each slab of this class's pool holds, derived so a slab lands near
    /// the configured target byte size. Never below one, no matter how huge the class.
    slots_per_slab: NonZero<usize>,
}

impl SizeClass {
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub(crate) fn slots_per_slab(&self) -> NonZero<usize> {
        self.slots_per_slab
    }
}

/// An immutable ascending ladder of size classes, built once per pool configuration.
///
/// Classification is a linear scan from the smallest class. The ladder is short (22 rungs
/// by default) and the scan is branch-predictable, so this beats cleverness in practice.
#[derive(Clone, Debug)]
pub(crate) struct SizeClassLadder {
    classes: Vec<SizeClass>,
}

impl SizeClassLadder {
    /// Builds the ladder from the element size, the per-slab byte target and the capacity
    /// sequence.
    ///
    /// Each class gets `max(1, target_slab_bytes / (element_size * capacity))` slots per
    /// slab: small classes pack many slots into one slab reservation, huge classes degrade
    /// to one slot per slab rather than zero.
    ///
    /// # Panics
    ///
    /// Panics if `capacities` is empty, contains a zero, or is not strictly ascending.
    #[must_use]
    pub(crate) fn new(
        element_size: NonZero<usize>,
        target_slab_bytes: NonZero<usize>,
        capacities: &[usize],
    ) -> Self {
        assert!(
            !capacities.is_empty(),
            "a size-class ladder needs at least one capacity"
        );

        let classes = capacities
            .iter()
            .map(|&capacity| {
                assert!(capacity > 0, "size-class capacities must be non-zero");

                let slot_bytes = element_size
                    .get()
                    .checked_mul(capacity)
                    .expect("size-class slot byte size cannot overflow for usable capacities");

                // Integer division may yield zero for classes bigger than the slab target;
                // those classes get one slot per slab.
                let slots_per_slab = NonZero::new(target_slab_bytes.get() / slot_bytes)
                    .unwrap_or(NonZero::<usize>::MIN);

                SizeClass {
                    capacity,
                    slots_per_slab,
                }
            })
            .collect::<Vec<_>>();

        assert!(
            classes
                .iter()
                .zip(classes.iter().skip(1))
                .all(|(smaller, larger)| smaller.capacity < larger.capacity),
            "size-class capacities must be strictly ascending"
        );

        Self { classes }
    }

    /// Maps an element count to the index of the smallest class that fits it.
    ///
    /// Boundary counts map to their exact class: asking for precisely a class's capacity
    /// lands in that class, one more spills into the next.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the largest class capacity. The ladder is sized at
    /// construction; a request beyond it means the configuration is wrong for the
    /// workload, which no runtime fallback can fix.
    #[must_use]
    pub(crate) fn classify(&self, count: usize) -> usize {
        self.classes
            .iter()
            .position(|class| class.capacity >= count)
            .unwrap_or_else(|| {
                panic!(
                    "requested element count {count} exceeds the largest size class capacity {}",
                    self.max_capacity()
                )
            })
    }

    /// The classes in ascending capacity order.
    #[must_use]
    pub(crate) fn classes(&self) -> &[SizeClass] {
        &self.classes
    }

    /// The largest element count this ladder can serve.
    #[must_use]
    pub(crate) fn max_capacity(&self) -> usize {
        self.classes
            .last()
            .map(SizeClass::capacity)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    fn default_ladder() -> SizeClassLadder {
        SizeClassLadder::new(nz!(8), nz!(65_536), &DEFAULT_CAPACITIES)
    }

    #[test]
    fn default_capacities_are_strictly_ascending() {
        assert!(
            DEFAULT_CAPACITIES
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        );
    }

    #[test]
    fn default_ladder_spans_the_documented_range() {
        assert_eq!(DEFAULT_CAPACITIES.len(), 22);
        assert_eq!(DEFAULT_CAPACITIES[0], 16);
        assert_eq!(DEFAULT_CAPACITIES[21], 33_554_432);
    }

    #[test]
    fn boundary_counts_map_to_their_exact_class() {
        let ladder = default_ladder();

        assert_eq!(ladder.classify(16), 0);
        assert_eq!(ladder.classify(17), 1);
        assert_eq!(ladder.classify(32), 1);
        assert_eq!(ladder.classify(33), 2);
        assert_eq!(ladder.classify(33_554_432), 21);
    }

    #[test]
    fn small_counts_map_to_the_smallest_class() {
        let ladder = default_ladder();

        assert_eq!(ladder.classify(0), 0);
        assert_eq!(ladder.classify(1), 0);
        assert_eq!(ladder.classify(15), 0);
    }

    #[test]
    #[should_panic]
    fn oversized_count_panics() {
        let ladder = default_ladder();

        _ = ladder.classify(33_554_433);
    }

    #[test]
    fn slab_slot_counts_track_the_byte_target() {
        // 8-byte elements, 65536-byte slabs: the 16-element class packs 512 slots per slab.
        let ladder = default_ladder();

        assert_eq!(ladder.classes()[0].slots_per_slab(), nz!(512));
        assert_eq!(ladder.classes()[1].slots_per_slab(), nz!(256));
    }

    #[test]
    fn huge_classes_get_one_slot_per_slab() {
        let ladder = default_ladder();

        // 33,554,432 elements of 8 bytes dwarf the 64 KiB target; one slot per slab.
        assert_eq!(ladder.classes()[21].slots_per_slab(), nz!(1));
    }

    #[test]
    fn custom_capacities_apply() {
        let ladder = SizeClassLadder::new(nz!(4), nz!(1024), &[10, 100, 1000]);

        assert_eq!(ladder.classify(10), 0);
        assert_eq!(ladder.classify(11), 1);
        assert_eq!(ladder.max_capacity(), 1000);
    }

    #[test]
    #[should_panic]
    fn empty_capacities_panic() {
        _ = SizeClassLadder::new(nz!(4), nz!(1024), &[]);
    }

    #[test]
    #[should_panic]
    fn non_ascending_capacities_panic() {
        _ = SizeClassLadder::new(nz!(4), nz!(1024), &[16, 16, 32]);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        _ = SizeClassLadder::new(nz!(4), nz!(1024), &[0, 16]);
    }
}

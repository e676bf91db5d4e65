//! Hilbert-curve lookup tables for the cell id codec.
//!
//! Each table maps a 4-level (16×16) sub-grid between IJ and curve position
//! for each of the four curve orientations. Entries pack the looked-up value
//! in the high bits and the resulting orientation in the low two bits.

use std::sync::OnceLock;

/// Orientation bit flipped by each child position.
const POS_TO_ORIENTATION: [u8; 4] = [1, 0, 0, 3];

/// `(i << 1) | j` of each child position, per orientation.
const POS_TO_IJ: [[u8; 4]; 4] = [[0, 1, 3, 2], [0, 2, 3, 1], [3, 2, 0, 1], [3, 1, 0, 2]];

/// Depth of a single lookup step.
const LOOKUP_BITS: u8 = 4;

/// Swap the i and j axes.
pub(crate) const SWAP_MASK: u64 = 0x01;

pub(crate) struct HilbertTables {
    /// `(i << 4 | j) << 2 | orientation` → `pos << 2 | orientation`.
    pub(crate) pos: [u16; 1024],
    /// `pos << 2 | orientation` → `(i << 4 | j) << 2 | orientation`.
    pub(crate) ij: [u16; 1024],
}

impl HilbertTables {
    fn build() -> Self {
        let mut tables = Self {
            pos: [0; 1024],
            ij: [0; 1024],
        };
        for orientation in 0..4 {
            tables.init_cell(0, 0, 0, orientation, 0, orientation);
        }
        tables
    }

    fn init_cell(
        &mut self,
        level: u8,
        i: u16,
        j: u16,
        orig_orientation: u8,
        pos: u16,
        orientation: u8,
    ) {
        if level == LOOKUP_BITS {
            let ij = (i << 4) + j;
            self.pos[usize::from((ij << 2) + u16::from(orig_orientation))] =
                (pos << 2) + u16::from(orientation);
            self.ij[usize::from((pos << 2) + u16::from(orig_orientation))] =
                (ij << 2) + u16::from(orientation);
            return;
        }
        let r = POS_TO_IJ[usize::from(orientation)];
        for (k, child) in r.iter().enumerate() {
            self.init_cell(
                level + 1,
                (i << 1) + u16::from(child >> 1),
                (j << 1) + u16::from(child & 1),
                orig_orientation,
                (pos << 2) + k as u16,
                orientation ^ POS_TO_ORIENTATION[k],
            );
        }
    }
}

/// The process-wide tables, built on first use.
pub(crate) fn tables() -> &'static HilbertTables {
    static TABLES: OnceLock<HilbertTables> = OnceLock::new();
    TABLES.get_or_init(HilbertTables::build)
}

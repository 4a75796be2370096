//! The bidirectional PPN <-> (Channel, Way, Die, Plane, Block, Page) codec
//! (spec §4.1), grounded in `original_source/PAL2.cc::PPNdisassemble` /
//! `AssemblePPN`.

use crate::error::{Result, SchedulerError};

/// Axis indices into a [`Cpdpbp`] / [`AddressLayout::sizes`], matching the
/// glossary's CPDPBP ordering.
pub const CHANNEL: usize = 0;
pub const WAY: usize = 1;
pub const DIE: usize = 2;
pub const PLANE: usize = 3;
pub const BLOCK: usize = 4;
pub const PAGE: usize = 5;

/// The six-tuple `(Channel, Way, Die, Plane, Block, Page)` a PPN decomposes
/// into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cpdpbp {
    pub channel: u32,
    pub way: u32,
    pub die: u32,
    pub plane: u32,
    pub block: u32,
    pub page: u32,
}

impl Cpdpbp {
    fn axis(&self, i: usize) -> u32 {
        match i {
            CHANNEL => self.channel,
            WAY => self.way,
            DIE => self.die,
            PLANE => self.plane,
            BLOCK => self.block,
            PAGE => self.page,
            _ => unreachable!("axis index out of range"),
        }
    }

    fn axis_mut(&mut self, i: usize) -> &mut u32 {
        match i {
            CHANNEL => &mut self.channel,
            WAY => &mut self.way,
            DIE => &mut self.die,
            PLANE => &mut self.plane,
            BLOCK => &mut self.block,
            PAGE => &mut self.page,
            _ => unreachable!("axis index out of range"),
        }
    }
}

/// Super-page striping descriptor.
///
/// `original_source/PAL2.cc::PPNdisassemble` combines the stripe selector
/// digit and the designated axis's own digit with a multiplication
/// (`idx[AS[k]] *= tmp_stripe`), which is not invertible in general (two
/// digits collapsed into one value cannot always be told apart again), so
/// `AssemblePPN` in the original never implements the misaligned branch at
/// all. This reimplementation concatenates the two digits instead
/// (`coordinate = stripe_digit * axis_size + sub_digit`), which is a
/// standard bijective mixed-radix extension and keeps the round-trip law
/// from spec §8 property 4 true for every PPN. See DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MisalignStripe {
    /// Position in `AddrSeq` (0..=4) after which the stripe digit is read,
    /// before falling through to the designated axis and the rest.
    pub axis_position: u8,
    /// Number of stripe groups the designated axis's addresses fan out
    /// into.
    pub factor: u32,
}

/// Axis sizes and the permutation used to decompose a PPN into a
/// [`Cpdpbp`], plus an optional super-page misalignment descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLayout {
    /// `(Channel, Way, Die, Plane, Block, Page)` axis sizes.
    pub sizes: [u32; 6],
    /// Most-significant-to-least-significant axis order used to decompose
    /// a PPN; a bijection on `{0..5}`.
    pub permutation: [u8; 6],
    pub misalign: Option<MisalignStripe>,
}

impl AddressLayout {
    /// Validates the permutation is a bijection and every size is nonzero,
    /// and the misalignment descriptor (if any) is well formed.
    pub fn validate(&self) -> Result<()> {
        let mut seen = [false; 6];
        for &p in &self.permutation {
            let p = p as usize;
            if p >= 6 || seen[p] {
                return Err(SchedulerError::InvalidParameter(format!(
                    "permutation {:?} is not a bijection on 0..6",
                    self.permutation
                )));
            }
            seen[p] = true;
        }
        if self.sizes.iter().any(|&s| s == 0) {
            return Err(SchedulerError::InvalidParameter(format!(
                "axis sizes {:?} must all be nonzero",
                self.sizes
            )));
        }
        if let Some(stripe) = &self.misalign {
            if stripe.axis_position > 4 {
                return Err(SchedulerError::InvalidParameter(format!(
                    "misalignment axis_position {} must be <= 4",
                    stripe.axis_position
                )));
            }
            if stripe.factor == 0 {
                return Err(SchedulerError::InvalidParameter(
                    "misalignment factor must be nonzero".into(),
                ));
            }
        }
        Ok(())
    }

    /// `RearrangedSizes[i] = sizes[permutation[i]]`.
    fn rearranged_sizes(&self) -> [u32; 6] {
        let mut rs = [0u32; 6];
        for i in 0..6 {
            rs[i] = self.sizes[self.permutation[i] as usize];
        }
        rs
    }

    /// Total number of distinct PPNs this layout addresses (the product of
    /// axis sizes, times the stripe factor if misaligned).
    pub fn capacity(&self) -> u64 {
        let base: u64 = self.sizes.iter().map(|&s| s as u64).product();
        match &self.misalign {
            Some(stripe) => base * stripe.factor as u64,
            None => base,
        }
    }

    /// Decomposes `ppn` into its six-tuple of axis indices.
    pub fn disassemble(&self, ppn: u64) -> Result<Cpdpbp> {
        let capacity = self.capacity();
        if ppn >= capacity {
            return Err(SchedulerError::InvalidPpn { ppn, capacity });
        }
        let rs = self.rearranged_sizes();
        let mut out = Cpdpbp::default();

        let Some(stripe) = &self.misalign else {
            let mut remaining = ppn;
            for i in 0..6 {
                let divisor: u64 = rs[i + 1..6].iter().map(|&x| x as u64).product::<u64>().max(1);
                *out.axis_mut(self.permutation[i] as usize) = (remaining / divisor) as u32;
                remaining %= divisor;
            }
            return Ok(out);
        };

        let k = 5 - stripe.axis_position as usize - 1;
        let mut remaining = ppn;

        // Prefix axes 0..k, decomposed against the full (stripe-inflated) space.
        let suffix_product: u64 = rs[0..6].iter().map(|&x| x as u64).product();
        let mut divisor = suffix_product * stripe.factor as u64;
        for i in 0..k {
            divisor /= rs[i] as u64;
            *out.axis_mut(self.permutation[i] as usize) = (remaining / divisor) as u32;
            remaining %= divisor;
        }

        // Stripe digit: radix `factor`, spanning the designated axis and
        // everything after it.
        divisor /= stripe.factor as u64;
        let stripe_digit = remaining / divisor;
        remaining %= divisor;

        // Designated axis (k) and the remaining suffix axes.
        for i in k..6 {
            divisor /= rs[i] as u64;
            *out.axis_mut(self.permutation[i] as usize) = (remaining / divisor) as u32;
            remaining %= divisor;
        }

        let designated = self.permutation[k] as usize;
        *out.axis_mut(designated) = stripe_digit as u32 * rs[k] + out.axis(designated);

        Ok(out)
    }

    /// Recomposes a six-tuple back into a PPN. Inverse of [`Self::disassemble`].
    pub fn assemble(&self, cpdpbp: &Cpdpbp) -> u64 {
        let rs = self.rearranged_sizes();

        let Some(stripe) = &self.misalign else {
            let mut ppn = 0u64;
            for i in 0..6 {
                let multiplier: u64 = rs[i + 1..6].iter().map(|&x| x as u64).product::<u64>().max(1);
                ppn += cpdpbp.axis(self.permutation[i] as usize) as u64 * multiplier;
            }
            return ppn;
        };

        let k = 5 - stripe.axis_position as usize - 1;
        let designated = self.permutation[k] as usize;
        let combined = cpdpbp.axis(designated) as u64;
        let stripe_digit = combined / rs[k] as u64;
        let sub_digit = combined % rs[k] as u64;

        let suffix_product: u64 = rs[0..6].iter().map(|&x| x as u64).product();
        let mut divisor = suffix_product * stripe.factor as u64;
        let mut ppn = 0u64;
        for i in 0..k {
            divisor /= rs[i] as u64;
            ppn += cpdpbp.axis(self.permutation[i] as usize) as u64 * divisor;
        }
        divisor /= stripe.factor as u64;
        ppn += stripe_digit * divisor;
        for i in k..6 {
            divisor /= rs[i] as u64;
            let value = if i == k { sub_digit } else { cpdpbp.axis(self.permutation[i] as usize) as u64 };
            ppn += value * divisor;
        }

        ppn
    }

    /// `channel * (Die * Way) + way * Die + die` — the integer key into the
    /// per-die data structures (spec §4.1 "DieIndex").
    pub fn die_index(&self, cpdpbp: &Cpdpbp) -> u32 {
        cpdpbp.channel * (self.sizes[DIE] * self.sizes[WAY])
            + cpdpbp.way * self.sizes[DIE]
            + cpdpbp.die
    }

    /// Number of pages in one erase block (spec §4.6 "Erase amplification",
    /// §8 invariant 6).
    ///
    /// `original_source/PAL2.cc::TimelineScheduling` computes its
    /// `erase_block` multiplier by walking rearranged axis positions from
    /// least to most significant and multiplying sizes *until* it reaches
    /// the page axis, excluding it — in a layout where page is already the
    /// least-significant axis (the common case) that loop contributes
    /// nothing and `erase_block` is always 1. That cannot produce "exactly
    /// blockSize sub-commands whose page-axis coordinates form a
    /// contiguous range" (§8 invariant 6), since it never varies the page
    /// axis at all. Read literally, §4.6/§8 describe erasing every page of
    /// the block addressed by the PPN, so this returns the page axis's own
    /// size instead. See DESIGN.md.
    pub fn pages_per_block(&self) -> u32 {
        self.sizes[PAGE]
    }

    /// `cpdpbp` with its page coordinate reset to `0` — the block-aligned
    /// boundary an erase command expands from.
    pub fn align_to_block(&self, cpdpbp: &Cpdpbp) -> Cpdpbp {
        let mut aligned = *cpdpbp;
        aligned.page = 0;
        aligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> AddressLayout {
        AddressLayout {
            sizes: [2, 2, 4, 2, 8, 16], // channel, way, die, plane, block, page
            permutation: [CHANNEL as u8, WAY as u8, DIE as u8, PLANE as u8, BLOCK as u8, PAGE as u8],
            misalign: None,
        }
    }

    #[test]
    fn round_trips_every_ppn() {
        let layout = layout();
        for p in 0..layout.capacity() {
            let cpd = layout.disassemble(p).unwrap();
            assert_eq!(layout.assemble(&cpd), p, "round trip failed for ppn {p}");
        }
    }

    #[test]
    fn out_of_range_ppn_is_rejected() {
        let layout = layout();
        assert!(layout.disassemble(layout.capacity()).is_err());
    }

    #[test]
    fn permutation_must_be_bijection() {
        let mut layout = layout();
        layout.permutation = [0, 0, 2, 3, 4, 5];
        assert!(layout.validate().is_err());
    }

    #[test]
    fn pages_per_block_is_product_above_page_axis() {
        let layout = layout();
        assert_eq!(layout.pages_per_block(), 16);
    }

    #[test]
    fn round_trips_with_misalignment() {
        let layout = AddressLayout {
            sizes: [2, 1, 2, 1, 4, 8],
            permutation: [CHANNEL as u8, DIE as u8, BLOCK as u8, PAGE as u8, WAY as u8, PLANE as u8],
            misalign: Some(MisalignStripe { axis_position: 1, factor: 2 }),
        };
        layout.validate().unwrap();
        for p in 0..layout.capacity() {
            let cpd = layout.disassemble(p).unwrap();
            assert_eq!(layout.assemble(&cpd), p, "round trip failed for ppn {p}");
        }
    }
}

//! Octree block-reference remapping.
//!
//! Host octree leaves hold `-native_index`. The kernel needs
//! `-packed_block_reference` instead. Branch pointers (positive entries) are
//! left alone.

/// Translates every leaf of `octree` through `mapping`.
///
/// `mapping[native_index]` is the packed block reference for that native
/// block. A leaf whose index falls outside `mapping` is passed through
/// unchanged; this never happens for well-formed input and is logged once
/// per call with the number of affected entries.
#[must_use]
pub fn remap_octree(octree: &[i32], mapping: &[i32]) -> Vec<i32> {
    let mut out_of_range = 0usize;
    let remapped = octree
        .iter()
        .map(|&value| {
            if value > 0 {
                return value;
            }
            match mapping.get(value.unsigned_abs() as usize) {
                Some(&packed) => -packed,
                None => {
                    out_of_range += 1;
                    value
                }
            }
        })
        .collect();

    if out_of_range > 0 {
        tracing::warn!(
            out_of_range,
            mapping_len = mapping.len(),
            "octree references blocks outside the block mapping, left unmapped"
        );
    }
    remapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branches_pass_through() {
        assert_eq!(remap_octree(&[1, 9, 300], &[0, 2]), vec![1, 9, 300]);
    }

    #[test]
    fn test_leaves_are_remapped() {
        let mapping = [0, 4, 2];
        assert_eq!(remap_octree(&[0, -1, -2, 5], &mapping), vec![0, -4, -2, 5]);
    }

    #[test]
    fn test_out_of_range_leaves_pass_through() {
        let mapping = [0, 2];
        assert_eq!(remap_octree(&[-2, -7, -1], &mapping), vec![-2, -7, -2]);
        assert_eq!(remap_octree(&[i32::MIN], &mapping), vec![i32::MIN]);
    }

    #[test]
    fn test_every_entry_matches_rule() {
        let mapping: Vec<i32> = (0..16).map(|i| i * 2).collect();
        let octree: Vec<i32> = (-20..20).collect();
        let out = remap_octree(&octree, &mapping);

        for (&o, &e) in octree.iter().zip(&out) {
            if o > 0 {
                assert_eq!(e, o);
            } else if ((-o) as usize) < mapping.len() {
                assert_eq!(e, -mapping[(-o) as usize]);
            } else {
                assert_eq!(e, o);
            }
        }
    }
}

//! The packing contract shared by every exported resource.
//!
//! A packed resource is an ordered run of 32-bit words. The compute kernel
//! reads them at fixed offsets, so the word count and the position of every
//! field are part of the format. Floats are stored bit-for-bit.

/// A value that serializes itself to a fixed sequence of 32-bit words.
pub trait Packer {
    /// Number of words `pack_into` appends.
    fn word_len(&self) -> usize;

    /// Appends the packed words to `out`.
    fn pack_into(&self, out: &mut Vec<i32>);

    /// Packs into a freshly allocated vector.
    #[must_use]
    fn pack(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(self.word_len());
        self.pack_into(&mut out);
        out
    }
}

/// Reinterprets a float as a packed word.
#[inline]
#[must_use]
pub fn float_word(value: f32) -> i32 {
    value.to_bits() as i32
}

/// Stores three floats as bit patterns so the owner can derive `Eq + Hash`.
#[inline]
#[must_use]
pub fn vec3_bits(v: [f32; 3]) -> [u32; 3] {
    [v[0].to_bits(), v[1].to_bits(), v[2].to_bits()]
}

/// Quantizes a `[0, 1]` factor to a byte, truncating like the kernel expects.
///
/// Out-of-range input is clamped so neighbouring bytes in a shared word
/// are never corrupted.
#[inline]
#[must_use]
pub fn unit_byte(value: f32) -> u32 {
    let scaled = (f64::from(value) * 255.0) as i32;
    scaled.clamp(0, 255) as u32
}

/// Appends each bit pattern as one word.
#[inline]
pub(crate) fn push_bits(out: &mut Vec<i32>, values: &[u32]) {
    out.extend(values.iter().map(|&b| b as i32));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(i32, i32);

    impl Packer for Pair {
        fn word_len(&self) -> usize {
            2
        }

        fn pack_into(&self, out: &mut Vec<i32>) {
            out.push(self.0);
            out.push(self.1);
        }
    }

    #[test]
    fn test_pack_uses_word_len() {
        let packed = Pair(3, -4).pack();
        assert_eq!(packed, vec![3, -4]);
        assert_eq!(packed.capacity(), 2);
    }

    #[test]
    fn test_unit_byte_truncates() {
        assert_eq!(unit_byte(0.5), 127);
        assert_eq!(unit_byte(0.2), 51);
        assert_eq!(unit_byte(1.0), 255);
        assert_eq!(unit_byte(0.0), 0);
    }

    #[test]
    fn test_unit_byte_clamps() {
        assert_eq!(unit_byte(4.0), 255);
        assert_eq!(unit_byte(-1.0), 0);
    }

    #[test]
    fn test_float_word_is_bit_pattern() {
        assert_eq!(float_word(1.0), 0x3F80_0000);
        assert_eq!(float_word(-0.0), i32::MIN);
    }
}

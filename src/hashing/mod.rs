use blake3::Hasher;

/// Hashes a sorted candidate set into a 32-byte key.
///
/// Numbers are fed as little-endian `u32`s so `[1, 23]` and `[12, 3]` never collide the
/// way a naive decimal concatenation would.
#[inline]
pub fn hash_numbers(numbers: &[u32]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    for n in numbers {
        hasher.update(&n.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Cache key for a candidate's log-likelihood under a specific condition vector.
#[inline]
pub fn hash_likelihood_key(condition: &[f32], numbers: &[u32]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(&(condition.len() as u64).to_le_bytes());
    for value in condition {
        hasher.update(&value.to_bits().to_le_bytes());
    }
    hasher.update(b"|");
    for n in numbers {
        hasher.update(&n.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Fingerprint of a draw history, used to derive a reproducible generator seed.
#[inline]
pub fn hash_draws<'a, I>(draws: I) -> u64
where
    I: IntoIterator<Item = &'a [u32]>,
{
    let mut hasher = Hasher::new();
    for draw in draws {
        hasher.update(&(draw.len() as u32).to_le_bytes());
        for n in draw {
            hasher.update(&n.to_le_bytes());
        }
    }
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

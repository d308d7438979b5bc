use glam::Vec2;

// Lattice hashing (splitmix64/32). Stateless, so any sampling order or grid
// density sees the same lattice.

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[inline]
pub fn splitmix32(mut x: u32) -> u32 {
    x = x.wrapping_add(0x9E3779B9);
    let mut z = x;
    z = (z ^ (z >> 16)).wrapping_mul(0x7FEB352D);
    z = (z ^ (z >> 15)).wrapping_mul(0x846CA68B);
    z ^ (z >> 16)
}

/// Derive the seed of one noise layer from the world seed.
#[inline]
pub fn layer_seed(seed: u64, salt: u64) -> u32 {
    splitmix64(seed ^ salt) as u32
}

#[inline]
fn hash2(ix: i32, iy: i32, seed: u32) -> u32 {
    let mut h = seed ^ 0x9E3779B9;
    h = splitmix32(h ^ (ix as u32).wrapping_mul(0x85EBCA6B));
    splitmix32(h ^ (iy as u32).wrapping_mul(0xC2B2AE35))
}

#[inline]
fn smootherstep(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn grad(hash: u32, dx: f32, dy: f32) -> f32 {
    // 16 evenly-spaced unit gradients (every 22.5°).
    match hash & 15 {
        0 => dx,
        1 => 0.924 * dx + 0.383 * dy,
        2 => 0.707 * (dx + dy),
        3 => 0.383 * dx + 0.924 * dy,
        4 => dy,
        5 => -0.383 * dx + 0.924 * dy,
        6 => 0.707 * (-dx + dy),
        7 => -0.924 * dx + 0.383 * dy,
        8 => -dx,
        9 => -0.924 * dx - 0.383 * dy,
        10 => 0.707 * (-dx - dy),
        11 => -0.383 * dx - 0.924 * dy,
        12 => -dy,
        13 => 0.383 * dx - 0.924 * dy,
        14 => 0.707 * (dx - dy),
        _ => 0.924 * dx - 0.383 * dy,
    }
}

/// Seeded 2D gradient noise in `[-1, 1]`.
///
/// Quintic-interpolated over an integer lattice, so the field is C2-smooth and the
/// value at a point never depends on which other points were sampled before it.
#[inline]
pub fn noise(p: Vec2, seed: u32) -> f32 {
    let ix = p.x.floor() as i32;
    let iy = p.y.floor() as i32;
    let fx = p.x - ix as f32;
    let fy = p.y - iy as f32;
    let sx = smootherstep(fx);
    let sy = smootherstep(fy);

    let v00 = grad(hash2(ix, iy, seed), fx, fy);
    let v10 = grad(hash2(ix.wrapping_add(1), iy, seed), fx - 1.0, fy);
    let v01 = grad(hash2(ix, iy.wrapping_add(1), seed), fx, fy - 1.0);
    let v11 = grad(hash2(ix.wrapping_add(1), iy.wrapping_add(1), seed), fx - 1.0, fy - 1.0);

    let a = lerp(v00, v10, sx);
    let b = lerp(v01, v11, sx);
    // Raw range is ~[-0.707, 0.707].
    (lerp(a, b, sy) * 1.414).clamp(-1.0, 1.0)
}

/// Octave layout of a fractal sum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseConfig {
    pub octaves: u32,
    pub lacunarity: f32,
    pub persistence: f32,
    pub seed: u32,
}

impl NoiseConfig {
    pub const fn new(octaves: u32, lacunarity: f32, persistence: f32, seed: u32) -> Self {
        Self {
            octaves,
            lacunarity,
            persistence,
            seed,
        }
    }

    /// Same octave layout, different lattice.
    pub const fn with_seed(self, seed: u32) -> Self {
        Self { seed, ..self }
    }

    /// Sum of all octave amplitudes.
    pub fn total_amplitude(&self) -> f32 {
        let mut amp = 1.0;
        let mut norm = 0.0;
        for _ in 0..self.octaves {
            norm += amp;
            amp *= self.persistence;
        }
        norm
    }
}

// ~30° per octave.
const COS30: f32 = 0.866025;
const SIN30: f32 = 0.5;

/// Fractal Brownian motion normalized by total octave amplitude, so the result stays
/// in `[-1, 1]`. With `rotate`, every octave samples a coordinate frame turned a
/// further 30° to break up axis-aligned ridges.
pub fn fbm(p: Vec2, cfg: &NoiseConfig, rotate: bool) -> f32 {
    let mut sum = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    let mut q = p;
    for i in 0..cfg.octaves {
        sum += noise(q * freq, cfg.seed.wrapping_add(i)) * amp;
        amp *= cfg.persistence;
        freq *= cfg.lacunarity;
        if rotate {
            q = Vec2::new(q.x * COS30 - q.y * SIN30, q.x * SIN30 + q.y * COS30);
        }
    }
    let norm = cfg.total_amplitude();
    if norm > 0.0 { sum / norm } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_repeatable_at_origin() {
        let first = noise(Vec2::ZERO, 42);
        for _ in 0..1000 {
            assert_eq!(noise(Vec2::ZERO, 42).to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_noise_range() {
        for i in 0..4000 {
            let p = Vec2::new(i as f32 * 0.173 - 300.0, (i % 97) as f32 * 0.31 - 11.0);
            let n = noise(p, 7);
            assert!((-1.0..=1.0).contains(&n), "noise {n} out of range at {p}");
        }
    }

    #[test]
    fn test_noise_zero_on_lattice() {
        // Gradient noise vanishes at integer corners.
        assert_eq!(noise(Vec2::new(3.0, -5.0), 1), 0.0);
    }

    #[test]
    fn test_noise_is_smooth() {
        let step = 0.001;
        for i in 0..2000 {
            let x = i as f32 * 0.01;
            let a = noise(Vec2::new(x, 0.37), 9);
            let b = noise(Vec2::new(x + step, 0.37), 9);
            assert!((a - b).abs() < 0.01, "jump at x={x}: {a} -> {b}");
        }
    }

    #[test]
    fn test_layer_seeds_differ() {
        assert_ne!(layer_seed(42, 1), layer_seed(42, 2));
        assert_eq!(layer_seed(42, 1), layer_seed(42, 1));
        let p = Vec2::new(0.3, 0.7);
        assert_ne!(noise(p, layer_seed(42, 1)), noise(p, layer_seed(42, 2)));
    }

    #[test]
    fn test_fbm_bounded() {
        let cfg = NoiseConfig::new(6, 2.0, 0.5, 3);
        for i in 0..2000 {
            let p = Vec2::new(i as f32 * 0.071, i as f32 * -0.013);
            for rotate in [false, true] {
                let v = fbm(p, &cfg, rotate);
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_fbm_single_octave_is_noise() {
        let cfg = NoiseConfig::new(1, 2.0, 0.5, 5);
        let p = Vec2::new(1.25, -4.5);
        assert_eq!(fbm(p, &cfg, true), noise(p, 5));
    }

    #[test]
    fn test_fbm_zero_octaves() {
        let cfg = NoiseConfig::new(0, 2.0, 0.5, 5);
        assert_eq!(fbm(Vec2::new(1.0, 2.0), &cfg, true), 0.0);
    }

    #[test]
    fn test_rotation_changes_output() {
        let cfg = NoiseConfig::new(4, 2.0, 0.5, 11);
        let p = Vec2::new(3.3, 7.1);
        assert_ne!(fbm(p, &cfg, true), fbm(p, &cfg, false));
    }

    #[test]
    fn test_total_amplitude() {
        let cfg = NoiseConfig::new(4, 2.0, 0.5, 0);
        assert!((cfg.total_amplitude() - 1.875).abs() < 1e-6);
    }
}

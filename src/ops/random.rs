//! Random array generation
//!
//! # Algorithms
//!
//! - Philox4x32-10 (Salmon et al. 2011), counter-based
//! - ThreeFry4x64-20 (Salmon et al. 2011), counter-based
//! - MT19937-64 (Matsumoto & Nishimura 2000), stateful
//! - Xoshiro256++ (Blackman & Vigna 2018), stateful
//!
//! Counter-based engines advance their counter by the number of blocks
//! consumed, so consecutive calls never repeat values for the same seed.

use crate::array::GpuArray;
use crate::dtype::{DType, DTypeSupport, validate_dtype};
use crate::error::{Error, Result};
use crate::runtime::ArrayContext;
use crate::{dispatch_complex_dtype, dispatch_float_dtype, dispatch_real_dtype};
use num_traits::AsPrimitive;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Value distribution
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// Floats in [0, 1); integers take uniformly random bits
    Uniform,
    /// Standard normal (mean 0, variance 1); complex parts are independent
    Normal,
}

impl Distribution {
    /// Types the distribution can produce
    pub const fn support(self) -> DTypeSupport {
        match self {
            Self::Uniform => DTypeSupport::ALL,
            Self::Normal => DTypeSupport {
                int: false,
                uint: false,
                float: true,
                complex_float: true,
            },
        }
    }

    /// Name as accepted by `FromStr`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uniform => "UNIFORM",
            Self::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Distribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UNIFORM" => Ok(Self::Uniform),
            "NORMAL" => Ok(Self::Normal),
            _ => Err(Error::invalid_argument(
                "distribution",
                format!("invalid distribution \"{s}\""),
            )),
        }
    }
}

/// Generator algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum EngineKind {
    /// Philox4x32-10
    #[default]
    Philox,
    /// ThreeFry4x64-20
    Threefry,
    /// 64-bit Mersenne Twister
    Mersenne,
    /// Xoshiro256++
    Xoshiro256,
}

impl EngineKind {
    /// Name as accepted by `FromStr`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Philox => "Philox",
            Self::Threefry => "Threefry",
            Self::Mersenne => "Mersenne",
            Self::Xoshiro256 => "Xoshiro256",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "philox" => Ok(Self::Philox),
            "threefry" => Ok(Self::Threefry),
            "mersenne" => Ok(Self::Mersenne),
            "xoshiro256" => Ok(Self::Xoshiro256),
            _ => Err(Error::invalid_argument(
                "engine",
                format!("unknown random engine \"{s}\""),
            )),
        }
    }
}

#[derive(Clone, Debug)]
enum EngineState {
    Philox { counter: u64 },
    Threefry { counter: u64 },
    Mersenne(Box<Mt19937_64>),
    Xoshiro256(Xoshiro256),
}

impl EngineState {
    fn new(kind: EngineKind, seed: u64) -> Self {
        match kind {
            EngineKind::Philox => Self::Philox { counter: 0 },
            EngineKind::Threefry => Self::Threefry { counter: 0 },
            EngineKind::Mersenne => Self::Mersenne(Box::new(Mt19937_64::from_seed(seed))),
            EngineKind::Xoshiro256 => Self::Xoshiro256(Xoshiro256::from_seed(seed)),
        }
    }
}

/// Seeded random engine producing arrays on demand
#[derive(Clone, Debug)]
pub struct RandomEngine {
    kind: EngineKind,
    seed: u64,
    state: EngineState,
}

impl RandomEngine {
    /// Engine of `kind` seeded with `seed`
    pub fn new(kind: EngineKind, seed: u64) -> Self {
        Self {
            kind,
            seed,
            state: EngineState::new(kind, seed),
        }
    }

    /// Generator algorithm
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Current seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Switch algorithm, keeping the seed and restarting the sequence
    pub fn set_kind(&mut self, kind: EngineKind) {
        self.kind = kind;
        self.state = EngineState::new(kind, self.seed);
    }

    /// Reseed, restarting the sequence
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.state = EngineState::new(self.kind, seed);
    }

    /// `n` raw 64-bit values
    fn next_u64s(&mut self, n: usize) -> Vec<u64> {
        let mut out = Vec::with_capacity(n);
        match &mut self.state {
            EngineState::Philox { counter } => {
                let key = [self.seed as u32, (self.seed >> 32) as u32];
                while out.len() < n {
                    let ctr = [*counter as u32, (*counter >> 32) as u32, 0, 0];
                    let r = philox4x32_10(ctr, key);
                    *counter = counter.wrapping_add(1);
                    out.push(u64::from(r[0]) | (u64::from(r[1]) << 32));
                    out.push(u64::from(r[2]) | (u64::from(r[3]) << 32));
                }
            }
            EngineState::Threefry { counter } => {
                let key = [self.seed, 0];
                while out.len() < n {
                    let r = threefry4x64_20([*counter, 0, 0, 0], key);
                    *counter = counter.wrapping_add(1);
                    out.extend_from_slice(&r);
                }
            }
            EngineState::Mersenne(rng) => {
                out.extend((0..n).map(|_| rng.next()));
            }
            EngineState::Xoshiro256(rng) => {
                out.extend((0..n).map(|_| rng.next()));
            }
        }
        out.truncate(n);
        out
    }

    /// `n` standard normal values
    fn next_normals(&mut self, n: usize) -> Vec<f64> {
        let bits = self.next_u64s(n.div_ceil(2) * 2);
        let mut out = Vec::with_capacity(n + 1);
        for pair in bits.chunks_exact(2) {
            let (z0, z1) = box_muller(unit_f64(pair[0]), unit_f64(pair[1]));
            out.push(z0);
            out.push(z1);
        }
        out.truncate(n);
        out
    }

    /// A 1D array of `n` values of `dtype` drawn from `distribution`
    pub fn generate(
        &mut self,
        ctx: ArrayContext,
        dtype: DType,
        distribution: Distribution,
        n: usize,
    ) -> Result<GpuArray> {
        validate_dtype(dtype, distribution.support(), "random")?;

        match distribution {
            Distribution::Uniform if dtype.is_int() => {
                let bits = self.next_u64s(n);
                dispatch_real_dtype!(dtype, T => {
                    let out: Vec<T> = bits.iter().map(|&b| AsPrimitive::<T>::as_(b)).collect();
                    GpuArray::from_vec(ctx, out)
                }, "random")
            }
            Distribution::Uniform if dtype.is_float() => {
                let bits = self.next_u64s(n);
                dispatch_float_dtype!(dtype, T => {
                    let out: Vec<T> = bits.iter().map(|&b| T::from_bits_unit(b)).collect();
                    GpuArray::from_vec(ctx, out)
                }, "random")
            }
            Distribution::Uniform => {
                let bits = self.next_u64s(2 * n);
                dispatch_complex_dtype!(dtype, C, F => {
                    let out: Vec<C> = bits
                        .chunks_exact(2)
                        .map(|p| C::new(F::from_bits_unit(p[0]), F::from_bits_unit(p[1])))
                        .collect();
                    GpuArray::from_vec(ctx, out)
                }, "random")
            }
            Distribution::Normal if dtype.is_float() => {
                let values = self.next_normals(n);
                dispatch_float_dtype!(dtype, T => {
                    let out: Vec<T> = values.iter().map(|&z| z as T).collect();
                    GpuArray::from_vec(ctx, out)
                }, "random")
            }
            Distribution::Normal => {
                let values = self.next_normals(2 * n);
                dispatch_complex_dtype!(dtype, C, F => {
                    let out: Vec<C> = values
                        .chunks_exact(2)
                        .map(|p| C::new(p[0] as F, p[1] as F))
                        .collect();
                    GpuArray::from_vec(ctx, out)
                }, "random")
            }
        }
    }
}

/// Floats built from the high bits of a random word, always in [0, 1)
trait UnitFloat {
    fn from_bits_unit(bits: u64) -> Self;
}

impl UnitFloat for f32 {
    #[inline]
    fn from_bits_unit(bits: u64) -> Self {
        (bits >> 40) as f32 / (1u32 << 24) as f32
    }
}

impl UnitFloat for f64 {
    #[inline]
    fn from_bits_unit(bits: u64) -> Self {
        unit_f64(bits)
    }
}

#[inline]
fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

/// Box-Muller transform: two uniforms to two standard normals
#[inline]
fn box_muller(u1: f64, u2: f64) -> (f64, f64) {
    // Keep ln() finite.
    let u1 = u1.clamp(1e-10, 1.0 - 1e-10);

    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;

    (r * theta.cos(), r * theta.sin())
}

// ============================================================================
// Philox4x32-10
// ============================================================================

const PHILOX_M2X32_0: u32 = 0xD2511F53;
const PHILOX_M2X32_1: u32 = 0xCD9E8D57;
const PHILOX_W32_0: u32 = 0x9E3779B9;
const PHILOX_W32_1: u32 = 0xBB67AE85;

#[inline]
fn philox_round(ctr: [u32; 4], key: [u32; 2]) -> [u32; 4] {
    let prod0 = u64::from(ctr[0]).wrapping_mul(u64::from(PHILOX_M2X32_0));
    let prod1 = u64::from(ctr[2]).wrapping_mul(u64::from(PHILOX_M2X32_1));

    [
        ((prod1 >> 32) as u32) ^ ctr[1] ^ key[0],
        prod1 as u32,
        ((prod0 >> 32) as u32) ^ ctr[3] ^ key[1],
        prod0 as u32,
    ]
}

fn philox4x32_10(ctr: [u32; 4], key: [u32; 2]) -> [u32; 4] {
    let mut c = ctr;
    let mut k = key;
    for _ in 0..10 {
        c = philox_round(c, k);
        k[0] = k[0].wrapping_add(PHILOX_W32_0);
        k[1] = k[1].wrapping_add(PHILOX_W32_1);
    }
    c
}

// ============================================================================
// ThreeFry4x64-20
// ============================================================================

const THREEFRY_ROTATION: [[u32; 2]; 8] = [
    [14, 16],
    [52, 57],
    [23, 40],
    [5, 37],
    [25, 33],
    [46, 12],
    [58, 22],
    [32, 32],
];

const THREEFRY_PARITY64: u64 = 0x1BD11BDAA9FC1A22;

fn threefry4x64_20(ctr: [u64; 4], key: [u64; 2]) -> [u64; 4] {
    let ks = [key[0], key[1], 0, 0, key[0] ^ key[1] ^ THREEFRY_PARITY64];
    let mut x = ctr;

    for r in 0..20 {
        if r % 4 == 0 {
            let d = r / 4;
            x[0] = x[0].wrapping_add(ks[d % 5]);
            x[1] = x[1].wrapping_add(ks[(d + 1) % 5]);
            x[2] = x[2].wrapping_add(ks[(d + 2) % 5]);
            x[3] = x[3].wrapping_add(ks[(d + 3) % 5]).wrapping_add(d as u64);
        }

        let rot = THREEFRY_ROTATION[r % 8];
        x[0] = x[0].wrapping_add(x[1]);
        x[1] = x[1].rotate_left(rot[0]) ^ x[0];
        x[2] = x[2].wrapping_add(x[3]);
        x[3] = x[3].rotate_left(rot[1]) ^ x[2];
        x.swap(1, 3);
    }

    x[0] = x[0].wrapping_add(ks[0]);
    x[1] = x[1].wrapping_add(ks[1]);
    x[2] = x[2].wrapping_add(ks[2]);
    x[3] = x[3].wrapping_add(ks[3]).wrapping_add(5);
    x
}

// ============================================================================
// MT19937-64
// ============================================================================

const MT_N: usize = 312;
const MT_M: usize = 156;
const MT_MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const MT_UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
const MT_LOWER_MASK: u64 = 0x7FFF_FFFF;

#[derive(Clone, Debug)]
struct Mt19937_64 {
    mt: [u64; MT_N],
    index: usize,
}

impl Mt19937_64 {
    fn from_seed(seed: u64) -> Self {
        let mut mt = [0u64; MT_N];
        mt[0] = seed;
        for i in 1..MT_N {
            let prev = mt[i - 1];
            mt[i] = 6364136223846793005u64
                .wrapping_mul(prev ^ (prev >> 62))
                .wrapping_add(i as u64);
        }
        Self { mt, index: MT_N }
    }

    fn twist(&mut self) {
        for i in 0..MT_N {
            let x = (self.mt[i] & MT_UPPER_MASK) | (self.mt[(i + 1) % MT_N] & MT_LOWER_MASK);
            let mut next = x >> 1;
            if x & 1 != 0 {
                next ^= MT_MATRIX_A;
            }
            self.mt[i] = self.mt[(i + MT_M) % MT_N] ^ next;
        }
        self.index = 0;
    }

    #[inline]
    fn next(&mut self) -> u64 {
        if self.index >= MT_N {
            self.twist();
        }
        let mut x = self.mt[self.index];
        self.index += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^ (x >> 43)
    }
}

// ============================================================================
// Xoshiro256++
// ============================================================================

#[derive(Clone, Debug)]
struct Xoshiro256 {
    s: [u64; 4],
}

impl Xoshiro256 {
    /// State expanded from `seed` with SplitMix64
    fn from_seed(seed: u64) -> Self {
        let mut sm_state = seed;
        let mut splitmix = || {
            sm_state = sm_state.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = sm_state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            z ^ (z >> 31)
        };
        Self {
            s: [splitmix(), splitmix(), splitmix(), splitmix()],
        }
    }

    #[inline]
    fn next(&mut self) -> u64 {
        let result = self.s[0]
            .wrapping_add(self.s[3])
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Complex64;
    use crate::runtime::Backend;

    const CPU: ArrayContext = ArrayContext::new(Backend::Cpu, 0);
    const ENGINES: [EngineKind; 4] = [
        EngineKind::Philox,
        EngineKind::Threefry,
        EngineKind::Mersenne,
        EngineKind::Xoshiro256,
    ];

    #[test]
    fn test_uniform_range() {
        for kind in ENGINES {
            let mut engine = RandomEngine::new(kind, 42);
            let a = engine.generate(CPU, DType::F32, Distribution::Uniform, 1000).unwrap();
            let values = a.to_vec::<f32>().unwrap();
            assert!(values.iter().all(|&x| (0.0..1.0).contains(&x)), "{kind}");
        }
    }

    #[test]
    fn test_reproducible_and_advancing() {
        for kind in ENGINES {
            let mut a = RandomEngine::new(kind, 7);
            let mut b = RandomEngine::new(kind, 7);
            let first = a.generate(CPU, DType::F64, Distribution::Uniform, 33).unwrap();
            let same = b.generate(CPU, DType::F64, Distribution::Uniform, 33).unwrap();
            assert_eq!(first.to_vec::<f64>().unwrap(), same.to_vec::<f64>().unwrap());

            let next = a.generate(CPU, DType::F64, Distribution::Uniform, 33).unwrap();
            assert_ne!(first.to_vec::<f64>().unwrap(), next.to_vec::<f64>().unwrap());

            a.reseed(7);
            let again = a.generate(CPU, DType::F64, Distribution::Uniform, 33).unwrap();
            assert_eq!(first.to_vec::<f64>().unwrap(), again.to_vec::<f64>().unwrap());
        }
    }

    #[test]
    fn test_normal_statistics() {
        for kind in ENGINES {
            let mut engine = RandomEngine::new(kind, 1234);
            let a = engine.generate(CPU, DType::F64, Distribution::Normal, 10001).unwrap();
            let values = a.to_vec::<f64>().unwrap();
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 0.05, "{kind}: mean = {mean}");
            assert!((variance - 1.0).abs() < 0.1, "{kind}: variance = {variance}");
        }
    }

    #[test]
    fn test_dtype_coverage() {
        let mut engine = RandomEngine::new(EngineKind::Philox, 3);
        let ints = engine.generate(CPU, DType::I16, Distribution::Uniform, 5).unwrap();
        assert_eq!(ints.dtype(), DType::I16);
        assert_eq!(ints.elements(), 5);

        let c = engine.generate(CPU, DType::Complex64, Distribution::Normal, 4).unwrap();
        assert_eq!(c.to_vec::<Complex64>().unwrap().len(), 4);

        let err = engine.generate(CPU, DType::U8, Distribution::Normal, 4).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDType { .. }));
    }

    #[test]
    fn test_names() {
        assert_eq!("normal".parse::<Distribution>().unwrap(), Distribution::Normal);
        assert_eq!("THREEFRY".parse::<EngineKind>().unwrap(), EngineKind::Threefry);
        assert_eq!("Mersenne".parse::<EngineKind>().unwrap(), EngineKind::Mersenne);
        assert!("MT19937".parse::<EngineKind>().is_err());
        assert!("GAUSSIAN".parse::<Distribution>().is_err());
    }

    #[test]
    fn test_mersenne_reference_output() {
        // 10000th output of the default-seeded generator.
        let mut rng = Mt19937_64::from_seed(5489);
        for _ in 0..9999 {
            rng.next();
        }
        assert_eq!(rng.next(), 9981545732273789042);
    }

    #[test]
    fn test_mersenne_reseed_restarts_sequence() {
        let mut engine = RandomEngine::new(EngineKind::Mersenne, 99);
        // Crosses a twist boundary.
        let first = engine.generate(CPU, DType::U64, Distribution::Uniform, 700).unwrap();
        let second = engine.generate(CPU, DType::U64, Distribution::Uniform, 700).unwrap();
        assert_ne!(first.to_vec::<u64>().unwrap(), second.to_vec::<u64>().unwrap());

        engine.reseed(99);
        let again = engine.generate(CPU, DType::U64, Distribution::Uniform, 700).unwrap();
        assert_eq!(first.to_vec::<u64>().unwrap(), again.to_vec::<u64>().unwrap());

        engine.set_kind(EngineKind::Philox);
        engine.set_kind(EngineKind::Mersenne);
        let restarted = engine.generate(CPU, DType::U64, Distribution::Uniform, 700).unwrap();
        assert_eq!(first.to_vec::<u64>().unwrap(), restarted.to_vec::<u64>().unwrap());
    }
}

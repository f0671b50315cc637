//! Shared element loops
//!
//! Large inputs are split into chunks and processed with rayon when the
//! `rayon` feature is enabled; small ones run serially.

use crate::dtype::Element;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Skip rayon below this many elements (overhead > benefit)
pub(crate) const PARALLEL_THRESHOLD: usize = 4096;

#[cfg(feature = "rayon")]
const CHUNK_SIZE: usize = 4096;

/// `out[i] = f(input[i])`
pub(crate) fn map_unary<T, U, F>(input: &[T], f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + Sync,
{
    let mut out = vec![U::zero(); input.len()];

    #[cfg(feature = "rayon")]
    if input.len() >= PARALLEL_THRESHOLD {
        out.par_chunks_mut(CHUNK_SIZE)
            .zip(input.par_chunks(CHUNK_SIZE))
            .for_each(|(out_chunk, in_chunk)| {
                for (o, &i) in out_chunk.iter_mut().zip(in_chunk) {
                    *o = f(i);
                }
            });
        return out;
    }

    for (o, &i) in out.iter_mut().zip(input) {
        *o = f(i);
    }
    out
}

/// `out[i] = f(lhs[i], rhs[i])`, over the common length
pub(crate) fn map_binary<T, U, F>(lhs: &[T], rhs: &[T], f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T, T) -> U + Sync,
{
    let n = lhs.len().min(rhs.len());
    let (lhs, rhs) = (&lhs[..n], &rhs[..n]);
    let mut out = vec![U::zero(); n];

    #[cfg(feature = "rayon")]
    if n >= PARALLEL_THRESHOLD {
        out.par_chunks_mut(CHUNK_SIZE)
            .zip(lhs.par_chunks(CHUNK_SIZE).zip(rhs.par_chunks(CHUNK_SIZE)))
            .for_each(|(out_chunk, (l_chunk, r_chunk))| {
                for ((o, &l), &r) in out_chunk.iter_mut().zip(l_chunk).zip(r_chunk) {
                    *o = f(l, r);
                }
            });
        return out;
    }

    for ((o, &l), &r) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = f(l, r);
    }
    out
}

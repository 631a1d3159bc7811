#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::Vec4;

use crate::counters::AtomicCounterBlock;
use crate::particle::ParticleBuffer;

/// Copy the advected buffer into the stable buffer and roll the counters.
///
/// The copy covers the full capacity, unfiltered. Once it completes, the
/// produced count becomes the next cycle's consume budget and the produce
/// cursor is reset.
pub fn compact(
    advected: &ParticleBuffer,
    stable: &mut ParticleBuffer,
    counters: &mut AtomicCounterBlock,
) {
    copy_channel(&advected.positions, &mut stable.positions);
    copy_channel(&advected.velocities, &mut stable.velocities);
    copy_channel(&advected.colors, &mut stable.colors);
    copy_channel(&advected.attributes, &mut stable.attributes);

    counters.swap_for_next_cycle();
}

fn copy_channel(src: &[Vec4], dst: &mut [Vec4]) {
    let n = src.len().min(dst.len());
    let (src, dst) = (&src[..n], &mut dst[..n]);

    #[cfg(feature = "parallel")]
    {
        dst.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(d, s)| *d = *s);
    }

    #[cfg(not(feature = "parallel"))]
    {
        dst.copy_from_slice(src);
    }
}

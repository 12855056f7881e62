//! Fixed-point alpha compositing.
//!
//! Source alpha is widened to a 0..=256 weight with `a + (a >> 7)` so that
//! interpolation needs one shift (opaque destination) or one division
//! (translucent destination).
//!
//! [`Argb::blend`] includes early-outs for near-transparent and near-opaque
//! sources. The `q_` variants skip them for tight loops where the caller has
//! already classified the run. Pick the destination kind once per run
//! ([`Argb::blend_onto_opaque`] or [`Argb::blend_onto_translucent`]), not per
//! pixel.

use crate::argb::Argb;

/// Source alpha widened to 0..=256.
#[inline(always)]
const fn weight(a: u8) -> i32 {
    let a = a as i32;
    a + (a >> 7)
}

impl Argb {
    /// Composite `src` over `self`.
    ///
    /// With `DEST_ALPHA == false` the destination is treated as opaque and
    /// its alpha is left untouched. With `DEST_ALPHA == true` the
    /// destination's alpha takes part and is updated.
    #[inline]
    pub fn blend<const DEST_ALPHA: bool>(&mut self, src: Argb) {
        let w = weight(src.a);
        if w <= 5 {
            return;
        }
        // Replace outright when the source is full or we are empty.
        if w > 250 || (DEST_ALPHA && self.a < 5) {
            *self = src;
        } else if !DEST_ALPHA {
            self.blend_opaque_unchecked(src, w);
        } else {
            self.blend_translucent_unchecked(src, w);
        }
    }

    /// [`blend::<false>`](Self::blend): the destination has no real alpha.
    #[inline]
    pub fn blend_onto_opaque(&mut self, src: Argb) {
        self.blend::<false>(src);
    }

    /// [`blend::<true>`](Self::blend): the destination carries real alpha.
    #[inline]
    pub fn blend_onto_translucent(&mut self, src: Argb) {
        self.blend::<true>(src);
    }

    /// Opaque-destination blend with no early-outs.
    #[inline]
    pub fn q_blend(&mut self, src: Argb) {
        self.blend_opaque_unchecked(src, weight(src.a));
    }

    /// Translucent-destination blend with no early-outs.
    ///
    /// A transparent source over a transparent destination leaves the
    /// destination as it is.
    #[inline]
    pub fn q_blend_a(&mut self, src: Argb) {
        self.blend_translucent_unchecked(src, weight(src.a));
    }

    #[inline(always)]
    fn blend_opaque_unchecked(&mut self, src: Argb, w: i32) {
        let f = 256 - w;
        let mix = |s: u8, d: u8| ((w * s as i32 + f * d as i32) >> 8) as u8;
        self.r = mix(src.r, self.r);
        self.g = mix(src.g, self.g);
        self.b = mix(src.b, self.b);
    }

    #[inline(always)]
    fn blend_translucent_unchecked(&mut self, src: Argb, w: i32) {
        let da = self.a as i32;
        let alpha16 = ((da + w) << 8) - da * w;
        if alpha16 == 0 {
            return;
        }
        let f = (256 - w) * da;
        let w = w << 8;
        let mix = |s: u8, d: u8| ((w * s as i32 + f * d as i32) / alpha16) as u8;
        self.r = mix(src.r, self.r);
        self.g = mix(src.g, self.g);
        self.b = mix(src.b, self.b);
        // A full-weight source yields exactly 256.
        self.a = (alpha16 >> 8).min(255) as u8;
    }
}

/// Union two coverage values: `dest = 255 - (255 - src) * (255 - dest) / 255`.
///
/// A zero source leaves `dest` alone and a full source saturates it.
#[inline]
pub fn blend_alpha(dest: &mut u8, src: u8) {
    match src {
        0 => {}
        255 => *dest = 255,
        _ => q_blend_alpha(dest, src),
    }
}

/// [`blend_alpha`] using the alpha of an [`Argb`] as coverage.
#[inline]
pub fn blend_alpha_argb(dest: &mut u8, src: &Argb) {
    blend_alpha(dest, src.a);
}

/// [`blend_alpha`] with no early-outs.
#[inline]
pub fn q_blend_alpha(dest: &mut u8, src: u8) {
    let inv = (255 - src as u32) * (255 - *dest as u32) / 255;
    *dest = (255 - inv) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces() {
        let src = Argb::new(12, 34, 56, 255);
        for prior in [0u32, 0xffff_ffff, 0x1234_5678, 0x8000_0000] {
            let mut d = Argb::from_packed(prior);
            d.blend::<false>(src);
            assert_eq!(d.to_packed(), src.to_packed());
        }
    }

    #[test]
    fn transparent_source_is_noop() {
        let src = Argb::new(12, 34, 56, 0);
        for prior in [0u32, 0xffff_ffff, 0x1234_5678, 0x8000_0000] {
            let mut d = Argb::from_packed(prior);
            d.blend::<false>(src);
            assert_eq!(d.to_packed(), prior);
            d.blend::<true>(src);
            assert_eq!(d.to_packed(), prior);
        }
    }

    #[test]
    fn near_transparent_source_is_noop() {
        // a = 5 widens to 5, which is still below the threshold.
        let mut d = Argb::new(1, 2, 3, 200);
        d.blend_onto_translucent(Argb::new(255, 255, 255, 5));
        assert_eq!(d, Argb::new(1, 2, 3, 200));
    }

    #[test]
    fn half_over_opaque() {
        // a = 128 widens to 129.
        let mut d = Argb::new(0, 0, 0, 255);
        d.blend_onto_opaque(Argb::new(255, 255, 255, 128));
        assert_eq!(d, Argb::new(128, 128, 128, 255));
    }

    #[test]
    fn opaque_blend_keeps_destination_alpha() {
        let mut d = Argb::new(100, 100, 100, 7);
        d.blend_onto_opaque(Argb::new(200, 0, 50, 128));
        assert_eq!(d.a, 7);
        assert_eq!(d, {
            let mut q = Argb::new(100, 100, 100, 7);
            q.q_blend(Argb::new(200, 0, 50, 128));
            q
        });
    }

    #[test]
    fn empty_destination_takes_source() {
        let src = Argb::new(9, 8, 7, 100);
        let mut d = Argb::new(255, 255, 255, 4);
        d.blend_onto_translucent(src);
        assert_eq!(d, src);
    }

    #[test]
    fn translucent_over_translucent() {
        let mut d = Argb::new(0, 0, 255, 128);
        d.blend_onto_translucent(Argb::new(255, 0, 0, 128));
        // w = 129, alpha16 = (128 + 129) * 256 - 128 * 129 = 49280
        assert_eq!(d.a, 192);
        assert_eq!(d.r, (129 * 256 * 255 / 49280) as u8);
        assert_eq!(d.b, ((256 - 129) * 128 * 255 / 49280) as u8);
        assert_eq!(d.g, 0);
    }

    #[test]
    fn q_blend_a_full_source_stays_in_range() {
        let mut d = Argb::new(10, 20, 30, 200);
        d.q_blend_a(Argb::new(40, 50, 60, 255));
        assert_eq!(d, Argb::new(40, 50, 60, 255));
    }

    #[test]
    fn q_blend_a_both_transparent() {
        let mut d = Argb::new(10, 20, 30, 0);
        d.q_blend_a(Argb::new(40, 50, 60, 0));
        assert_eq!(d, Argb::new(10, 20, 30, 0));
    }

    #[test]
    fn q_blend_matches_blend_in_the_middle() {
        for a in 6u8..=249 {
            let src = Argb::new(250, 10, 99, a);
            let mut x = Argb::new(3, 200, 77, 255);
            let mut y = x;
            x.blend_onto_opaque(src);
            y.q_blend(src);
            assert_eq!(x, y, "alpha {a}");
        }
    }

    #[test]
    fn alpha_zero_source_keeps_dest() {
        for d in 0..=255u8 {
            let mut v = d;
            blend_alpha(&mut v, 0);
            assert_eq!(v, d);
        }
    }

    #[test]
    fn alpha_full_source_saturates() {
        for d in 0..=255u8 {
            let mut v = d;
            blend_alpha(&mut v, 255);
            assert_eq!(v, 255);
        }
    }

    #[test]
    fn alpha_onto_empty_is_source() {
        for a in 0..=255u8 {
            let mut v = 0;
            blend_alpha(&mut v, a);
            assert_eq!(v, a);
        }
    }

    #[test]
    fn alpha_union_is_monotonic() {
        for d in 0..=255u8 {
            for s in [1u8, 64, 128, 254] {
                let mut v = d;
                q_blend_alpha(&mut v, s);
                assert!(v >= d && v >= s, "d={d} s={s} -> {v}");
            }
        }
    }

    #[test]
    fn alpha_from_argb() {
        let mut v = 0;
        blend_alpha_argb(&mut v, &Argb::new(0, 0, 0, 77));
        assert_eq!(v, 77);
    }
}

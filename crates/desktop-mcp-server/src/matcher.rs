//! Template matching on grayscale rasters
//!
//! Similarity is the zero-mean normalized cross-correlation of the template
//! and a screen window, clamped to `[0, 1]`. Window means and variances come
//! from integral images, so each placement costs one pass over the template.
//! Large templates are first ranked on a box-downsampled pyramid level, and
//! only the best coarse placements are re-scored at full resolution.

use crate::constants::{COARSE_MIN_SIDE, MAX_PYRAMID_FACTOR, REFINE_CANDIDATES};
use desktop_mcp_protocol::Point;
use image::GrayImage;

/// A scored placement of the template on the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub score: f64,
}

impl Match {
    /// Center of the matched region in screen coordinates
    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.width / 2) as i32,
            (self.top + self.height / 2) as i32,
        )
    }

    /// Higher score wins; equal scores prefer the earliest placement in row-major order
    fn beats(&self, other: &Match) -> bool {
        self.score > other.score
            || (self.score == other.score && (self.top, self.left) < (other.top, other.left))
    }
}

/// Find the best placement of `needle` whose score is at least `confidence`
pub fn locate(haystack: &GrayImage, needle: &GrayImage, confidence: f64) -> Option<Match> {
    best_match(haystack, needle).filter(|m| m.score >= confidence)
}

/// Find the best placement of `needle` regardless of score
///
/// Returns `None` when the needle is empty or does not fit on the haystack.
pub fn best_match(haystack: &GrayImage, needle: &GrayImage) -> Option<Match> {
    let (tw, th) = needle.dimensions();
    if tw == 0 || th == 0 || tw > haystack.width() || th > haystack.height() {
        return None;
    }

    let (fx, fy) = pyramid_factors(tw, th);
    let searcher = Searcher::new(haystack, needle);
    if fx == 1 && fy == 1 {
        return searcher.exhaustive();
    }

    let candidates = coarse_candidates(haystack, needle, fx, fy);
    let mut best: Option<Match> = None;
    for coarse in candidates {
        let candidate = searcher.match_at(coarse.left, coarse.top);
        if best.is_none_or(|b| candidate.beats(&b)) {
            best = Some(candidate);
        }
    }
    best
}

/// Rank every full-resolution placement on the downsampled level
///
/// The haystack is downsampled once per phase offset, so each placement is
/// scored with blocks aligned to the template's own. A pixel-identical window
/// therefore scores 1.0 here too. Everything scoring at least the
/// `REFINE_CANDIDATES`-th best coarse score is returned, ties included.
fn coarse_candidates(haystack: &GrayImage, needle: &GrayImage, fx: u32, fy: u32) -> Vec<Match> {
    let (tw, th) = needle.dimensions();
    let max_x = haystack.width() - tw;
    let max_y = haystack.height() - th;
    let coarse_needle = downsample(needle, 0, 0, fx, fy);

    let mut kept = Vec::new();
    for py in 0..fy.min(max_y + 1) {
        for px in 0..fx.min(max_x + 1) {
            let coarse_haystack = downsample(haystack, px, py, fx, fy);
            if coarse_needle.width() > coarse_haystack.width()
                || coarse_needle.height() > coarse_haystack.height()
            {
                continue;
            }
            let coarse = Searcher::new(&coarse_haystack, &coarse_needle);
            for (cx, cy) in coarse.placements() {
                let (x, y) = (px + cx * fx, py + cy * fy);
                if x > max_x || y > max_y {
                    continue;
                }
                kept.push(Match {
                    left: x,
                    top: y,
                    width: tw,
                    height: th,
                    score: coarse.score(cx as usize, cy as usize),
                });
            }
            keep_best(&mut kept, REFINE_CANDIDATES);
        }
    }
    kept
}

/// Drop everything scoring below the `limit`-th best score
fn keep_best(scored: &mut Vec<Match>, limit: usize) {
    if limit == 0 || scored.len() <= limit {
        return;
    }
    let (_, nth, _) = scored.select_nth_unstable_by(limit - 1, |a, b| b.score.total_cmp(&a.score));
    let threshold = nth.score;
    scored.retain(|m| m.score >= threshold);
}

/// Per-axis downsampling factors that keep each template side near `COARSE_MIN_SIDE`
fn pyramid_factors(width: u32, height: u32) -> (u32, u32) {
    (axis_factor(width), axis_factor(height))
}

fn axis_factor(side: u32) -> u32 {
    let factor = side / COARSE_MIN_SIDE;
    if factor < 2 {
        1
    } else {
        factor.min(MAX_PYRAMID_FACTOR)
    }
}

/// Box-average `image` over `fx`×`fy` blocks starting at (`ox`, `oy`)
///
/// Partial blocks at the right and bottom edges are dropped.
fn downsample(image: &GrayImage, ox: u32, oy: u32, fx: u32, fy: u32) -> GrayImage {
    let (w, h) = image.dimensions();
    let area = fx * fy;
    let width = w.saturating_sub(ox) / fx;
    let height = h.saturating_sub(oy) / fy;
    GrayImage::from_fn(width, height, |x, y| {
        let mut total = 0u32;
        for dy in 0..fy {
            for dx in 0..fx {
                total += u32::from(image.get_pixel(ox + x * fx + dx, oy + y * fy + dy)[0]);
            }
        }
        image::Luma([((total + area / 2) / area) as u8])
    })
}

/// Prefix sums of pixel values and squared values
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sq: Vec<u64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sq = vec![0u64; stride * (h + 1)];
        let raw = image.as_raw();
        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = u64::from(raw[y * w + x]);
                row_sum += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
                sq[(y + 1) * stride + x + 1] = sq[y * stride + x + 1] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    /// Sum and sum of squares over the `w`×`h` window at (`x`, `y`)
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
        let at = |table: &[u64], cx: usize, cy: usize| table[cy * self.stride + cx];
        let rect = |table: &[u64]| {
            at(table, x + w, y + h) + at(table, x, y) - at(table, x + w, y) - at(table, x, y + h)
        };
        (rect(&self.sum), rect(&self.sq))
    }
}

struct Searcher<'a> {
    haystack: &'a GrayImage,
    needle: &'a GrayImage,
    integral: Integral,
    n: i128,
    needle_sum: i128,
    /// `n * Σt² - (Σt)²`, i.e. `n²` times the template variance
    needle_var: i128,
}

impl<'a> Searcher<'a> {
    fn new(haystack: &'a GrayImage, needle: &'a GrayImage) -> Self {
        let n = i128::from(needle.width()) * i128::from(needle.height());
        let (sum, sq) = needle.as_raw().iter().fold((0i128, 0i128), |(s, q), &v| {
            let v = i128::from(v);
            (s + v, q + v * v)
        });
        Self {
            haystack,
            needle,
            integral: Integral::new(haystack),
            n,
            needle_sum: sum,
            needle_var: n * sq - sum * sum,
        }
    }

    fn placements(&self) -> impl Iterator<Item = (u32, u32)> {
        let max_x = self.haystack.width() - self.needle.width();
        let max_y = self.haystack.height() - self.needle.height();
        (0..=max_y).flat_map(move |y| (0..=max_x).map(move |x| (x, y)))
    }

    fn exhaustive(&self) -> Option<Match> {
        let mut best: Option<Match> = None;
        for (x, y) in self.placements() {
            let candidate = self.match_at(x, y);
            if best.is_none_or(|b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
        best
    }

    fn match_at(&self, x: u32, y: u32) -> Match {
        let (tw, th) = self.needle.dimensions();
        Match {
            left: x,
            top: y,
            width: tw,
            height: th,
            score: self.score(x as usize, y as usize),
        }
    }

    fn score(&self, x: usize, y: usize) -> f64 {
        let tw = self.needle.width() as usize;
        let th = self.needle.height() as usize;
        let (window_sum, window_sq) = self.integral.window(x, y, tw, th);
        let window_sum = i128::from(window_sum);
        let window_var = self.n * i128::from(window_sq) - window_sum * window_sum;

        if self.needle_var == 0 || window_var == 0 {
            if self.needle_var == 0 && window_var == 0 {
                let mean_diff = (self.needle_sum - window_sum).abs() as f64 / self.n as f64;
                return 1.0 - mean_diff / 255.0;
            }
            return 0.0;
        }

        let hay = self.haystack.as_raw();
        let hay_stride = self.haystack.width() as usize;
        let tpl = self.needle.as_raw();
        let mut cross = 0u64;
        for row in 0..th {
            let start = (y + row) * hay_stride + x;
            let window_row = &hay[start..start + tw];
            let needle_row = &tpl[row * tw..(row + 1) * tw];
            cross += window_row
                .iter()
                .zip(needle_row)
                .map(|(&a, &b)| u64::from(a) * u64::from(b))
                .sum::<u64>();
        }

        let numerator = self.n * i128::from(cross) - self.needle_sum * window_sum;
        if numerator <= 0 {
            return 0.0;
        }
        // Exact integer check so a pixel-identical window scores exactly 1.0
        let exact = match (
            numerator.checked_mul(numerator),
            self.needle_var.checked_mul(window_var),
        ) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => false,
        };
        if exact {
            return 1.0;
        }
        let denominator = (self.needle_var as f64 * window_var as f64).sqrt();
        (numerator as f64 / denominator).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::fake::noise_image;
    use image::{Luma, imageops};

    fn gray_noise(width: u32, height: u32, seed: u64) -> GrayImage {
        imageops::grayscale(&noise_image(width, height, seed))
    }

    fn crop(image: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        imageops::crop_imm(image, x, y, w, h).to_image()
    }

    #[test]
    fn test_exact_small_crop_is_found() {
        let screen = gray_noise(120, 80, 7);
        let needle = crop(&screen, 37, 21, 10, 8);
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (37, 21));
        assert_eq!(found.score, 1.0);
        assert_eq!(found.center(), Point::new(42, 25));
    }

    #[test]
    fn test_exact_large_crop_uses_pyramid() {
        assert_eq!(pyramid_factors(60, 40), (5, 3));
        let screen = gray_noise(320, 200, 11);
        let needle = crop(&screen, 143, 77, 60, 40);
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (143, 77));
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_unrelated_image_not_found_at_full_confidence() {
        let screen = gray_noise(160, 120, 3);
        let needle = gray_noise(16, 16, 99);
        assert!(locate(&screen, &needle, 1.0).is_none());
        let best = best_match(&screen, &needle).unwrap();
        assert!(best.score < 0.9, "unexpected score {}", best.score);
    }

    #[test]
    fn test_zero_confidence_always_matches() {
        let screen = gray_noise(64, 48, 5);
        let needle = gray_noise(8, 8, 6);
        assert!(locate(&screen, &needle, 0.0).is_some());
    }

    #[test]
    fn test_needle_larger_than_screen() {
        let screen = gray_noise(20, 20, 1);
        assert!(best_match(&screen, &gray_noise(21, 5, 2)).is_none());
        assert!(best_match(&screen, &gray_noise(5, 21, 2)).is_none());
    }

    #[test]
    fn test_empty_needle() {
        let screen = gray_noise(20, 20, 1);
        assert!(best_match(&screen, &GrayImage::new(0, 0)).is_none());
    }

    #[test]
    fn test_flat_screen_ties_resolve_top_left() {
        let screen = GrayImage::from_pixel(30, 20, Luma([90]));
        let needle = GrayImage::from_pixel(4, 4, Luma([90]));
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (0, 0));
    }

    #[test]
    fn test_flat_needle_finds_flat_block() {
        let mut screen = gray_noise(80, 60, 13);
        for y in 30..50 {
            for x in 40..60 {
                screen.put_pixel(x, y, Luma([77]));
            }
        }
        let needle = GrayImage::from_pixel(10, 10, Luma([77]));
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (40, 30));
    }

    #[test]
    fn test_flat_windows_score_by_mean_difference() {
        let screen = GrayImage::from_pixel(10, 10, Luma([0]));
        let needle = GrayImage::from_pixel(2, 2, Luma([255]));
        let best = best_match(&screen, &needle).unwrap();
        assert_eq!(best.score, 0.0);
    }

    #[test]
    fn test_brightness_shift_keeps_full_correlation() {
        let base = gray_noise(50, 40, 21);
        let screen = GrayImage::from_fn(50, 40, |x, y| Luma([base.get_pixel(x, y)[0] / 2]));
        let needle =
            GrayImage::from_fn(12, 9, |x, y| Luma([screen.get_pixel(x + 5, y + 6)[0] + 40]));
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (5, 6));
    }

    #[test]
    fn test_unaligned_exact_copy_beats_aligned_near_copies() {
        let needle = gray_noise(48, 48, 17);
        let near = GrayImage::from_fn(48, 48, |x, y| Luma([needle.get_pixel(x, y)[0] ^ 1]));
        let mut screen = gray_noise(420, 340, 29);
        for top in [4, 72, 140, 208] {
            for left in [4, 72, 140, 208, 276, 344] {
                imageops::replace(&mut screen, &near, left, top);
            }
        }
        imageops::replace(&mut screen, &needle, 102, 278);

        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (102, 278));
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_thin_reference_is_downsampled_along_its_long_side() {
        assert_eq!(pyramid_factors(20, 600), (1, MAX_PYRAMID_FACTOR));
        assert_eq!(pyramid_factors(600, 20), (MAX_PYRAMID_FACTOR, 1));

        let screen = gray_noise(160, 300, 31);
        let needle = crop(&screen, 57, 133, 10, 120);
        assert_eq!(pyramid_factors(10, 120), (1, 8));
        let found = locate(&screen, &needle, 1.0).unwrap();
        assert_eq!((found.left, found.top), (57, 133));
    }

    #[test]
    fn test_keep_best_keeps_ties() {
        let at = |left, score| Match {
            left,
            top: 0,
            width: 1,
            height: 1,
            score,
        };
        let mut scored = vec![at(0, 0.2), at(1, 0.9), at(2, 0.5), at(3, 0.9), at(4, 0.9)];
        keep_best(&mut scored, 2);
        let mut lefts: Vec<u32> = scored.iter().map(|m| m.left).collect();
        lefts.sort();
        assert_eq!(lefts, vec![1, 3, 4]);
    }

    #[test]
    fn test_downsample_box_average() {
        let image = GrayImage::from_fn(4, 3, |x, _| Luma([(x * 10) as u8]));
        let small = downsample(&image, 0, 0, 2, 2);
        assert_eq!(small.dimensions(), (2, 1));
        assert_eq!(small.get_pixel(0, 0)[0], 5);
        assert_eq!(small.get_pixel(1, 0)[0], 25);
    }

    #[test]
    fn test_downsample_phase_offset() {
        let image = GrayImage::from_fn(5, 2, |x, _| Luma([(x * 10) as u8]));
        let small = downsample(&image, 1, 0, 2, 1);
        assert_eq!(small.dimensions(), (2, 2));
        assert_eq!(small.get_pixel(0, 0)[0], 15);
        assert_eq!(small.get_pixel(1, 1)[0], 35);
    }

    #[test]
    fn test_pyramid_factor_bounds() {
        assert_eq!(pyramid_factors(10, 10), (1, 1));
        assert_eq!(pyramid_factors(23, 100), (1, 8));
        assert_eq!(pyramid_factors(24, 100), (2, 8));
        assert_eq!(pyramid_factors(1000, 1000), (MAX_PYRAMID_FACTOR, MAX_PYRAMID_FACTOR));
    }

    #[test]
    fn test_match_center_uses_integer_halves() {
        let m = Match {
            left: 10,
            top: 20,
            width: 5,
            height: 4,
            score: 1.0,
        };
        assert_eq!(m.center(), Point::new(12, 22));
    }
}

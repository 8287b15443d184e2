//! Windowing arithmetic for the pooled tree view. All sizes are in cells.

/// The slice of rows currently bound to pool slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
    pub pool_size: usize,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// Slots needed to cover the viewport plus the buffer on both sides.
pub fn required_pool_size(row_height: usize, buffer: usize, client_height: usize) -> usize {
    client_height.div_ceil(row_height.max(1)) + 2 * buffer
}

/// Compute the bound row range for a scroll position.
///
/// `pool_size` defaults to [`required_pool_size`]. The result always satisfies
/// `0 <= start <= end <= total`.
pub fn compute_window(
    scroll_top: usize,
    row_height: usize,
    buffer: usize,
    client_height: usize,
    total: usize,
    pool_size: Option<usize>,
) -> VisibleWindow {
    let row_height = row_height.max(1);
    let pool_size =
        pool_size.unwrap_or_else(|| required_pool_size(row_height, buffer, client_height));
    let start = (scroll_top / row_height)
        .saturating_sub(buffer)
        .min(total.saturating_sub(1));
    let end = (start + pool_size).min(total);
    VisibleWindow {
        start,
        end,
        pool_size,
    }
}

/// Largest useful scroll offset.
pub fn max_scroll(total: usize, row_height: usize, client_height: usize) -> usize {
    (total * row_height.max(1)).saturating_sub(client_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_in_the_middle() {
        let w = compute_window(100, 20, 2, 100, 100, None);
        assert_eq!(
            w,
            VisibleWindow {
                start: 3,
                end: 12,
                pool_size: 9
            }
        );
    }

    #[test]
    fn window_at_the_top() {
        let w = compute_window(0, 20, 2, 100, 50, None);
        assert_eq!((w.start, w.end), (0, 9));
    }

    #[test]
    fn window_past_the_end_is_clamped() {
        let w = compute_window(1000, 20, 2, 100, 50, None);
        assert_eq!((w.start, w.end), (48, 50));
    }

    #[test]
    fn larger_pool_extends_the_window() {
        let w = compute_window(0, 1, 1, 5, 100, Some(12));
        assert_eq!((w.start, w.end, w.pool_size), (0, 12, 12));
    }

    #[test]
    fn empty_and_degenerate_inputs() {
        let w = compute_window(500, 20, 2, 100, 0, None);
        assert_eq!((w.start, w.end), (0, 0));
        assert!(w.is_empty());

        let w = compute_window(10, 0, 0, 0, 3, None);
        assert!(w.start <= w.end && w.end <= 3);
    }

    #[test]
    fn bounds_hold_across_a_sweep() {
        for total in [0usize, 1, 7, 50] {
            for scroll_top in (0..2000).step_by(37) {
                for client_height in [0usize, 1, 19, 100] {
                    let w = compute_window(scroll_top, 20, 2, client_height, total, None);
                    assert!(w.start <= w.end, "{:?}", w);
                    assert!(w.end <= total, "{:?}", w);
                }
            }
        }
    }

    #[test]
    fn pool_size_and_max_scroll() {
        assert_eq!(required_pool_size(20, 2, 100), 9);
        assert_eq!(required_pool_size(20, 2, 101), 10);
        assert_eq!(max_scroll(50, 20, 100), 900);
        assert_eq!(max_scroll(2, 20, 100), 0);
        assert!(VisibleWindow {
            start: 2,
            end: 5,
            pool_size: 3
        }
        .contains(4));
    }
}

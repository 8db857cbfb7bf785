/// Splits `total` into `parts` integers that differ by at most one.
///
/// Every part receives `total / parts`; the remainder `r` is handed out one
/// cell at a time to every `parts / r`-th part starting with the first, so the
/// extra cells are spread across the row instead of piling up at the front.
pub fn split_evenly(total: u16, parts: usize) -> Vec<u16> {
    if parts == 0 {
        return Vec::new();
    }
    let total_wide = total as usize;
    let base = (total_wide / parts) as u16;
    let mut remaining = total_wide % parts;
    let mut result = vec![base; parts];
    if remaining > 0 {
        let step = parts / remaining;
        let mut i = 0;
        while i < parts && remaining > 0 {
            result[i] += 1;
            remaining -= 1;
            i += step;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_parts_is_empty() {
        assert!(split_evenly(10, 0).is_empty());
    }

    #[test]
    fn exact_division() {
        assert_eq!(split_evenly(12, 4), vec![3, 3, 3, 3]);
    }

    #[test]
    fn remainder_is_spaced_out() {
        // 10 / 4 = 2 rem 2, step 2: parts 0 and 2 get the extra cell
        assert_eq!(split_evenly(10, 4), vec![3, 2, 3, 2]);
        // 7 / 5 = 1 rem 2, step 2
        assert_eq!(split_evenly(7, 5), vec![2, 1, 2, 1, 1]);
    }

    #[test]
    fn fewer_cells_than_parts() {
        assert_eq!(split_evenly(2, 5), vec![1, 0, 1, 0, 0]);
        assert_eq!(split_evenly(0, 3), vec![0, 0, 0]);
    }
}

//! Page slicing over an already filtered and sorted sequence.

/// Default page size when the caller doesn't pass one.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Returns at most `limit` items starting at `skip`. A `skip` past the end yields an empty page.
pub fn paginate<T: Clone>(items: &[T], skip: usize, limit: usize) -> Vec<T> {
    if skip >= items.len() {
        return Vec::new();
    }
    let end = skip.saturating_add(limit).min(items.len());
    items[skip..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        assert_eq!(paginate(&[1, 2, 3, 4, 5], 0, 2), vec![1, 2]);
    }

    #[test]
    fn test_middle_page() {
        assert_eq!(paginate(&[1, 2, 3, 4, 5], 2, 2), vec![3, 4]);
    }

    #[test]
    fn test_partial_last_page() {
        assert_eq!(paginate(&[1, 2, 3, 4, 5], 4, 10), vec![5]);
    }

    #[test]
    fn test_skip_past_end_is_empty() {
        assert!(paginate(&[1, 2, 3], 3, 10).is_empty());
        assert!(paginate(&[1, 2, 3], 99, 10).is_empty());
        assert!(paginate::<i32>(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_zero_limit_is_empty() {
        assert!(paginate(&[1, 2, 3], 0, 0).is_empty());
    }

    #[test]
    fn test_huge_limit_does_not_overflow() {
        assert_eq!(paginate(&[1, 2, 3], 1, usize::MAX), vec![2, 3]);
    }
}

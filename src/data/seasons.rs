use crate::error::{EvotradeError, Result};

/// Split `items` into `num_seasons` contiguous chunks.
///
/// Sizes differ by at most one; the first `len % num_seasons` seasons take the
/// extra element. Seasons may be empty when there are fewer items than seasons.
pub fn split_seasons<T>(items: &[T], num_seasons: usize) -> Result<Vec<&[T]>> {
    if num_seasons == 0 {
        return Err(EvotradeError::Configuration(
            "num_seasons must be positive".to_string(),
        ));
    }

    let base = items.len() / num_seasons;
    let extra = items.len() % num_seasons;

    let mut seasons = Vec::with_capacity(num_seasons);
    let mut start = 0;
    for season in 0..num_seasons {
        let size = base + usize::from(season < extra);
        seasons.push(&items[start..start + size]);
        start += size;
    }

    Ok(seasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uneven_split_front_loads_extra() {
        let items: Vec<usize> = (0..10).collect();
        let seasons = split_seasons(&items, 4).unwrap();

        let sizes: Vec<usize> = seasons.iter().map(|s| s.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        assert_eq!(seasons[1], &[3, 4, 5]);
        assert_eq!(seasons[3], &[8, 9]);
    }

    #[test]
    fn test_more_seasons_than_items() {
        let items = [1, 2];
        let seasons = split_seasons(&items, 3).unwrap();
        assert_eq!(seasons.len(), 3);
        assert!(seasons[2].is_empty());
    }

    #[test]
    fn test_zero_seasons_is_an_error() {
        let items = [1, 2, 3];
        assert!(split_seasons(&items, 0).is_err());
    }
}

use crate::errors::{SearchError, SearchResult};

/// Splits `items` into consecutive groups of at most `group_size` elements.
///
/// Order is preserved within and across groups and only the last group may be
/// short. An empty input yields no groups.
pub fn partition<T: Clone>(items: &[T], group_size: usize) -> SearchResult<Vec<Vec<T>>> {
    if group_size == 0 {
        return Err(SearchError::invalid_argument("group size must be at least 1"));
    }
    Ok(items.chunks(group_size).map(<[T]>::to_vec).collect())
}

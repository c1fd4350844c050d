use super::utils::matches_search;
use crate::catalog::MovieId;

/// Indices of the rows the table should show, in input order.
pub fn visible_indices<'a, I, F>(
    rows: I,
    query: &str,
    hide_watched: bool,
    is_checked: F,
) -> Vec<usize>
where
    I: IntoIterator<Item = (MovieId, &'a str)>,
    F: Fn(MovieId) -> bool,
{
    rows.into_iter()
        .enumerate()
        .filter(|(_, (id, _))| !(hide_watched && is_checked(*id)))
        .filter(|(_, (_, title))| matches_search(title, query))
        .map(|(i, _)| i)
        .collect()
}

use fzf_wrapped::Fzf;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::HasTitle;

/// One numbered line per item, `N: title, overview`, numbered from 1.
pub fn choice_lines<T: HasTitle>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            // overviews can span lines, fzf wants one line per entry
            let overview = item.get_overview().replace(['\n', '\r'], " ");
            if overview.trim().is_empty() {
                format!("{}: {}", i + 1, item.get_title())
            } else {
                format!("{}: {}, {}", i + 1, item.get_title(), overview.trim())
            }
        })
        .collect()
}

/// Maps a line chosen in fzf back to an index into the list it came from.
pub fn parse_selection(selection: &str, len: usize) -> Result<usize> {
    selection
        .split(':')
        .next()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| Error::Picker(format!("unrecognised selection {selection:?}")))
}

/// Lets the user choose one item through fzf.
pub fn pick<T: HasTitle>(items: &[T]) -> Result<usize> {
    if items.is_empty() {
        return Err(Error::Picker("nothing to choose from".into()));
    }
    let mut fzf = Fzf::default();
    fzf.run()
        .map_err(|e| Error::Picker(format!("failed to start fzf: {e}")))?;
    fzf.add_items(choice_lines(items))
        .map_err(|e| Error::Picker(format!("failed to add items: {e}")))?;
    let selection = fzf
        .output()
        .ok_or_else(|| Error::Picker("nothing selected".into()))?;
    debug!("fzf returned {:?}", selection);
    parse_selection(&selection, items.len())
}

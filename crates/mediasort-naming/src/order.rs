//! Canonical ordering and drag reordering of session entries.

use std::cmp::Ordering;

use crate::model::{OutputDirectory, VideoEntry};
use crate::{NamingError, Result};

/// Numbering group for an entry: `Season_<N>`, `Special` or `Extra`.
pub fn group_key(entry: &VideoEntry) -> String {
    match entry.output_directory {
        OutputDirectory::Season => format!("Season_{}", entry.season_number),
        OutputDirectory::Special => "Special".to_string(),
        OutputDirectory::Extra => "Extra".to_string(),
    }
}

fn canonical_cmp(a: &VideoEntry, b: &VideoEntry) -> Ordering {
    a.output_directory
        .rank()
        .cmp(&b.output_directory.rank())
        .then_with(|| match (a.output_directory, b.output_directory) {
            (OutputDirectory::Season, OutputDirectory::Season) => {
                a.season_number.cmp(&b.season_number)
            }
            _ => Ordering::Equal,
        })
        .then_with(|| a.position.cmp(&b.position))
}

/// Sort into display order: seasons (ascending), specials, extras; by
/// position within each group. The sort is stable.
pub fn sort_entries(entries: &mut [VideoEntry]) {
    entries.sort_by(canonical_cmp);
}

/// Move the entry at `from` to index `to`, renumber positions of the moved
/// entry's group in the new order, and re-sort.
///
/// Entries in other groups keep their positions.
pub fn move_entry(entries: &mut Vec<VideoEntry>, from: usize, to: usize) -> Result<()> {
    let len = entries.len();
    if from >= len {
        return Err(NamingError::IndexOutOfBounds { index: from, len });
    }
    if to >= len {
        return Err(NamingError::IndexOutOfBounds { index: to, len });
    }
    if from == to {
        return Ok(());
    }

    let moved = entries.remove(from);
    let key = group_key(&moved);
    entries.insert(to, moved);

    let mut next = 0;
    for entry in entries.iter_mut().filter(|e| group_key(e) == key) {
        entry.position = next;
        next += 1;
    }

    sort_entries(entries);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileInfo;

    fn file(name: &str) -> FileInfo {
        FileInfo::new(format!("/p/{name}"), name)
    }

    #[test]
    fn test_group_key() {
        assert_eq!(group_key(&VideoEntry::season(file("a.mkv"), 3, 0)), "Season_3");
        assert_eq!(group_key(&VideoEntry::special(file("a.mkv"), 0)), "Special");
        assert_eq!(group_key(&VideoEntry::extra(file("a.mkv"), 0)), "Extra");
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let a = VideoEntry::extra(file("x.mkv"), 0);
        let b = VideoEntry::special(file("s.mkv"), 0);
        let c = VideoEntry::season(file("s2.mkv"), 2, 0);
        let d = VideoEntry::season(file("s1b.mkv"), 1, 1);
        let e = VideoEntry::season(file("s1a.mkv"), 1, 0);

        let mut first = vec![a.clone(), b.clone(), c.clone(), d.clone(), e.clone()];
        let mut second = vec![e, c, a, d, b];
        sort_entries(&mut first);
        sort_entries(&mut second);
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|e| e.file.name.as_str()).collect();
        assert_eq!(names, vec!["s1a.mkv", "s1b.mkv", "s2.mkv", "s.mkv", "x.mkv"]);
    }

    #[test]
    fn test_move_renumbers_only_moved_group() {
        let mut entries = vec![
            VideoEntry::season(file("a.mkv"), 1, 0),
            VideoEntry::season(file("b.mkv"), 1, 1),
            VideoEntry::season(file("c.mkv"), 1, 2),
            VideoEntry::special(file("s.mkv"), 7),
            VideoEntry::extra(file("x.mkv"), 5),
            VideoEntry::extra(file("y.mkv"), 9),
        ];

        move_entry(&mut entries, 2, 0).unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.file.name.as_str()).collect();
        assert_eq!(names, vec!["c.mkv", "a.mkv", "b.mkv", "s.mkv", "x.mkv", "y.mkv"]);
        let positions: Vec<u32> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 7, 5, 9]);
    }

    #[test]
    fn test_move_across_group_boundary_keeps_group() {
        let mut entries = vec![
            VideoEntry::season(file("a.mkv"), 1, 0),
            VideoEntry::season(file("b.mkv"), 1, 1),
            VideoEntry::special(file("s.mkv"), 0),
        ];

        // Dropping a season entry after the special still leaves it a
        // season entry; it becomes the last of its group.
        move_entry(&mut entries, 0, 2).unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.file.name.as_str()).collect();
        assert_eq!(names, vec!["b.mkv", "a.mkv", "s.mkv"]);
        assert_eq!(entries[2].position, 0);
    }

    #[test]
    fn test_move_out_of_bounds() {
        let mut entries = vec![VideoEntry::season(file("a.mkv"), 1, 0)];
        assert_eq!(
            move_entry(&mut entries, 0, 3),
            Err(NamingError::IndexOutOfBounds { index: 3, len: 1 })
        );
    }
}

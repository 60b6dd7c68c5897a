//! Character-level text diff for highlighting value updates.
//!
//! [`dissimilar`] does the actual diffing (Myers bisect with semantic
//! cleanup, linear in memory, so whole-file blobs are fine); this module
//! shapes its borrowed chunks into owned runs for the renderer.

use dissimilar::Chunk;

/// One run of the diff between an old and a new string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Equal(String),
    Insert(String),
    Delete(String),
}

/// Diff `old` against `new`, returning maximal runs in reading order.
/// At a divergence, deleted text comes before inserted text.
pub fn diff_chars(old: &str, new: &str) -> Vec<Segment> {
    dissimilar::diff(old, new)
        .into_iter()
        .map(|chunk| match chunk {
            Chunk::Equal(text) => Segment::Equal(text.to_owned()),
            Chunk::Insert(text) => Segment::Insert(text.to_owned()),
            Chunk::Delete(text) => Segment::Delete(text.to_owned()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(segments: &[Segment]) -> (String, String) {
        let mut old = String::new();
        let mut new = String::new();
        for segment in segments {
            match segment {
                Segment::Equal(t) => {
                    old.push_str(t);
                    new.push_str(t);
                }
                Segment::Delete(t) => old.push_str(t),
                Segment::Insert(t) => new.push_str(t),
            }
        }
        (old, new)
    }

    #[test]
    fn identical_strings_are_one_equal_run() {
        assert_eq!(
            diff_chars("value", "value"),
            vec![Segment::Equal("value".into())]
        );
    }

    #[test]
    fn disjoint_strings_delete_then_insert() {
        assert_eq!(
            diff_chars("abc", "xyz"),
            vec![Segment::Delete("abc".into()), Segment::Insert("xyz".into())]
        );
    }

    #[test]
    fn common_prefix_and_suffix_preserved() {
        let segments = diff_chars("val1", "val2");
        assert_eq!(
            segments,
            vec![
                Segment::Equal("val".into()),
                Segment::Delete("1".into()),
                Segment::Insert("2".into()),
            ]
        );
    }

    #[test]
    fn pure_insertion() {
        assert_eq!(
            diff_chars("val", "value"),
            vec![Segment::Equal("val".into()), Segment::Insert("ue".into())]
        );
    }

    #[test]
    fn pure_deletion() {
        assert_eq!(
            diff_chars("value", "val"),
            vec![Segment::Equal("val".into()), Segment::Delete("ue".into())]
        );
    }

    #[test]
    fn empty_sides() {
        assert_eq!(diff_chars("", ""), Vec::<Segment>::new());
        assert_eq!(diff_chars("", "x"), vec![Segment::Insert("x".into())]);
        assert_eq!(diff_chars("x", ""), vec![Segment::Delete("x".into())]);
    }

    #[test]
    fn reassembling_segments_recovers_both_sides() {
        let old = "postgres://db-old:5432";
        let new = "postgres://db-new:5433";
        let segments = diff_chars(old, new);
        assert_eq!(reassemble(&segments), (old.to_string(), new.to_string()));
    }

    // File storage feeds whole files through this path; an input in the
    // hundred-kilobyte range has to diff without trouble.
    #[test]
    fn whole_file_sized_inputs_diff_fine() {
        let body = "key: value\n".repeat(10 * 1024);
        let old = format!("{body}tail: old\n");
        let new = format!("{body}tail: new\n");
        let segments = diff_chars(&old, &new);
        assert_eq!(reassemble(&segments), (old, new));
    }
}

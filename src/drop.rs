//! Drop target
//!
//! Dropping a file onto a terminal pastes its path. Depending on the terminal
//! that arrives quoted, backslash-escaped, or as a `file://` URI.

use std::path::PathBuf;
use url::Url;

/// Paths contained in pasted text, in order. `file://` URIs that do not name
/// a local file are skipped.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    split_words(text)
        .into_iter()
        .filter(|word| !word.is_empty())
        .filter_map(|word| {
            if word.starts_with("file://") {
                file_uri_path(&word)
            } else {
                Some(PathBuf::from(word))
            }
        })
        .collect()
}

/// The first dropped path; multiple files are not batched
pub fn first_dropped_path(text: &str) -> Option<PathBuf> {
    parse_dropped_paths(text).into_iter().next()
}

fn file_uri_path(word: &str) -> Option<PathBuf> {
    let url = match Url::parse(word) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(uri = word, "Ignoring malformed file URI: {}", e);
            return None;
        }
    };
    let path = url.to_file_path().ok();
    if path.is_none() {
        tracing::debug!(uri = word, "File URI does not name a local path");
    }
    path
}

/// Shell-style word splitting: quotes group, backslash escapes, whitespace separates
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_word = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        assert_eq!(
            parse_dropped_paths("/home/me/scan.png\n"),
            vec![PathBuf::from("/home/me/scan.png")]
        );
    }

    #[test]
    fn test_quoted_and_escaped_paths() {
        assert_eq!(
            parse_dropped_paths("'/home/me/My Scans/page 1.jpg' /tmp/a\\ b.png \"/tmp/c d.gif\""),
            vec![
                PathBuf::from("/home/me/My Scans/page 1.jpg"),
                PathBuf::from("/tmp/a b.png"),
                PathBuf::from("/tmp/c d.gif"),
            ]
        );
    }

    #[test]
    fn test_file_uri() {
        assert_eq!(
            first_dropped_path("file:///home/me/My%20Scans/page.png"),
            Some(PathBuf::from("/home/me/My Scans/page.png"))
        );
        assert_eq!(
            first_dropped_path("file://localhost/tmp/x.png"),
            Some(PathBuf::from("/tmp/x.png"))
        );
    }

    #[test]
    fn test_file_uri_query_is_not_part_of_path() {
        assert_eq!(
            first_dropped_path("file:///tmp/a.png?x=1"),
            Some(PathBuf::from("/tmp/a.png"))
        );
        assert_eq!(
            first_dropped_path("file:///tmp/a.png#frag"),
            Some(PathBuf::from("/tmp/a.png"))
        );
    }

    #[test]
    fn test_remote_file_uri_skipped() {
        assert_eq!(first_dropped_path("file://fileserver/share/scan.png"), None);
        assert_eq!(
            parse_dropped_paths("file://fileserver/scan.png /tmp/local.png"),
            vec![PathBuf::from("/tmp/local.png")]
        );
    }

    #[test]
    fn test_bad_percent_sequence_kept() {
        assert_eq!(
            first_dropped_path("file:///tmp/100%zz.png"),
            Some(PathBuf::from("/tmp/100%zz.png"))
        );
    }

    #[test]
    fn test_first_path_wins() {
        assert_eq!(
            first_dropped_path("/tmp/one.png\n/tmp/two.png"),
            Some(PathBuf::from("/tmp/one.png"))
        );
    }

    #[test]
    fn test_empty_paste() {
        assert!(parse_dropped_paths("").is_empty());
        assert!(parse_dropped_paths("  \n\t").is_empty());
        assert_eq!(first_dropped_path("''"), None);
    }
}

//! Page range parsing, extraction and splitting.

use super::{copy_pages, to_indices};
use crate::document::PdfDocument;
use crate::error::{Error, Result};

/// Parse a page selection such as `"1, 3-5, 8"` against `page_count`.
///
/// Accepts single pages and inclusive `a-b` ranges separated by commas.
/// Every endpoint must lie in `1..=page_count` and ranges must not run
/// backwards. The result is deduplicated and sorted ascending.
///
/// ```
/// use pdf_graft::editor::parse_page_ranges;
///
/// assert_eq!(parse_page_ranges("1, 3-5, 8", 10)?, vec![1, 3, 4, 5, 8]);
/// assert!(parse_page_ranges("11", 10).is_err());
/// assert!(parse_page_ranges("3-1", 10).is_err());
/// # Ok::<(), pdf_graft::error::Error>(())
/// ```
pub fn parse_page_ranges(selection: &str, page_count: usize) -> Result<Vec<usize>> {
    let mut pages: Vec<usize> = parse_range_groups(selection, page_count)?.into_iter().flatten().collect();
    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

/// Parse a selection into one group per comma-separated item, in the order
/// written. `"1-3, 7"` gives `[[1, 2, 3], [7]]`.
pub fn parse_range_groups(selection: &str, page_count: usize) -> Result<Vec<Vec<usize>>> {
    let mut groups = Vec::new();
    for item in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (start, end) = match item.split_once('-') {
            Some((a, b)) => (parse_page(a, item)?, parse_page(b, item)?),
            None => {
                let n = parse_page(item, item)?;
                (n, n)
            },
        };
        for n in [start, end] {
            if n == 0 || n > page_count {
                return Err(Error::Validation(format!(
                    "page {} in \"{}\" is out of range (document has {} pages)",
                    n, item, page_count
                )));
            }
        }
        if start > end {
            return Err(Error::Validation(format!("range \"{}\" runs backwards", item)));
        }
        groups.push((start..=end).collect());
    }
    if groups.is_empty() {
        return Err(Error::Validation("no pages selected".to_string()));
    }
    Ok(groups)
}

fn parse_page(s: &str, item: &str) -> Result<usize> {
    s.trim()
        .parse()
        .map_err(|_| Error::Validation(format!("\"{}\" is not a page number or range", item)))
}

/// Copy the pages selected by `ranges` into a new document, in ascending
/// page order.
pub fn split(doc: &PdfDocument, ranges: &str) -> Result<PdfDocument> {
    doc.require_content_access()?;
    let pages = parse_page_ranges(ranges, doc.page_count()?)?;
    extract_pages(doc, &pages)
}

/// Copy the given 1-based pages into a new document. Pages are
/// deduplicated and written in ascending order.
pub fn extract_pages(doc: &PdfDocument, pages: &[usize]) -> Result<PdfDocument> {
    doc.require_content_access()?;
    if pages.is_empty() {
        return Err(Error::Validation("no pages selected".to_string()));
    }
    let mut indices = to_indices(pages, doc.page_count()?)?;
    indices.sort_unstable();
    indices.dedup();
    let out = copy_pages(doc, &indices)?;
    log::info!("extracted {} pages", indices.len());
    Ok(out)
}

/// One document per comma-separated group of `ranges`.
pub fn split_into_ranges(doc: &PdfDocument, ranges: &str) -> Result<Vec<PdfDocument>> {
    doc.require_content_access()?;
    let groups = parse_range_groups(ranges, doc.page_count()?)?;
    groups
        .iter()
        .map(|group| {
            let indices: Vec<usize> = group.iter().map(|n| n - 1).collect();
            copy_pages(doc, &indices)
        })
        .collect()
}

/// One single-page document per page.
pub fn burst(doc: &PdfDocument) -> Result<Vec<PdfDocument>> {
    doc.require_content_access()?;
    let count = doc.page_count()?;
    if count == 0 {
        return Err(Error::Validation("document has no pages".to_string()));
    }
    (0..count).map(|i| copy_pages(doc, &[i])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn doc(n: usize) -> PdfDocument {
        let mut doc = PdfDocument::create_empty();
        for i in 0..n {
            doc.add_page(Rect::new(0.0, 0.0, 100.0 + i as f64, 100.0), Default::default(), Vec::new())
                .unwrap();
        }
        doc
    }

    fn widths(doc: &PdfDocument) -> Vec<f64> {
        doc.pages().unwrap().iter().map(|p| p.media_box().width).collect()
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(parse_page_ranges("1, 3-5, 8", 10).unwrap(), vec![1, 3, 4, 5, 8]);
        assert_eq!(parse_page_ranges("5,1-2,2", 5).unwrap(), vec![1, 2, 5]);
        assert_eq!(parse_page_ranges(" 2 - 3 ", 5).unwrap(), vec![2, 3]);
        for bad in ["11", "3-1", "0", "", " , ", "a", "1-", "2-x"] {
            assert!(
                matches!(parse_page_ranges(bad, 10), Err(Error::Validation(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_range_groups() {
        assert_eq!(parse_range_groups("4-5, 1", 5).unwrap(), vec![vec![4, 5], vec![1]]);
    }

    #[test]
    fn test_split_is_ascending() {
        let d = doc(5);
        let out = split(&d, "5, 2-3").unwrap();
        assert_eq!(widths(&out), vec![101.0, 102.0, 104.0]);
    }

    #[test]
    fn test_split_into_ranges_and_burst() {
        let d = doc(4);
        let parts = split_into_ranges(&d, "3-4, 1").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(widths(&parts[0]), vec![102.0, 103.0]);
        assert_eq!(widths(&parts[1]), vec![100.0]);

        let pages = burst(&d).unwrap();
        assert_eq!(pages.len(), 4);
        assert!(pages.iter().all(|p| p.page_count().unwrap() == 1));
    }
}

//! Local citation tables and the report-wide bibliography.
//!
//! Each section cites its evidence as `[Source <n>]`, numbered from 1 in
//! selection order. Before the section joins the report those markers are
//! rewritten to report-wide numbers (`[<m>]`) drawn from the
//! [`MasterBibliography`], which hands out numbers in first-seen order and
//! never renumbers a URL.

use std::collections::HashMap;

const MARKER_OPEN: &str = "[Source ";

/// Per-section mapping from local index (1-based) to source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationTable {
    urls: Vec<String>,
}

impl CitationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source and return its local index.
    pub fn push(&mut self, url: impl Into<String>) -> usize {
        self.urls.push(url.into());
        self.urls.len()
    }

    /// URL cited as `[Source <local>]`, if any.
    pub fn get(&self, local: usize) -> Option<&str> {
        local
            .checked_sub(1)
            .and_then(|i| self.urls.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// `(local index, url)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.urls.iter().enumerate().map(|(i, u)| (i + 1, u.as_str()))
    }
}

impl<S: Into<String>> FromIterator<S> for CitationTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Report-wide URL numbering.
#[derive(Debug, Clone, Default)]
pub struct MasterBibliography {
    urls: Vec<String>,
    numbers: HashMap<String, usize>,
}

impl MasterBibliography {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for `url`, assigning the next one on first sight.
    pub fn assign(&mut self, url: &str) -> usize {
        if let Some(&number) = self.numbers.get(url) {
            return number;
        }

        self.urls.push(url.to_string());
        let number = self.urls.len();
        self.numbers.insert(url.to_string(), number);
        number
    }

    pub fn number(&self, url: &str) -> Option<usize> {
        self.numbers.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// `(number, url)` pairs, ascending.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.urls.iter().enumerate().map(|(i, u)| (i + 1, u.as_str()))
    }

    pub fn render(&self) -> String {
        let mut text = String::from("## Master Bibliography\n\n");
        for (number, url) in self.entries() {
            text.push_str(&format!("[{}] {}\n", number, url));
        }
        text
    }
}

/// Rewrite `[Source <n>]` markers in `text` to master numbers.
///
/// Every URL in `table` is registered with `bibliography`, cited or not.
/// Markers naming an index outside `table` are left as they are.
pub fn remap_citations(text: &str, table: &CitationTable, bibliography: &mut MasterBibliography) -> String {
    let masters: Vec<usize> = table.iter().map(|(_, url)| bibliography.assign(url)).collect();

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(MARKER_OPEN) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + MARKER_OPEN.len()..];

        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let closed = digits > 0 && after[digits..].starts_with(']');
        let local = if closed {
            after[..digits].parse::<usize>().ok()
        } else {
            None
        };

        match local.and_then(|n| n.checked_sub(1)).and_then(|i| masters.get(i)) {
            Some(master) => {
                out.push_str(&format!("[{}]", master));
                rest = &after[digits + 1..];
            }
            None => {
                if closed {
                    tracing::warn!(
                        marker = &rest[pos..pos + MARKER_OPEN.len() + digits + 1],
                        sources = table.len(),
                        "Citation marker has no matching source; left unchanged"
                    );
                }
                out.push_str(MARKER_OPEN);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(urls: &[&str]) -> CitationTable {
        urls.iter().copied().collect()
    }

    #[test]
    fn test_table_is_one_based() {
        let t = table(&["https://a", "https://b"]);
        assert_eq!(t.get(0), None);
        assert_eq!(t.get(1), Some("https://a"));
        assert_eq!(t.get(2), Some("https://b"));
        assert_eq!(t.get(3), None);
    }

    #[test]
    fn test_assign_reuses_numbers() {
        let mut bib = MasterBibliography::new();
        assert_eq!(bib.assign("https://a"), 1);
        assert_eq!(bib.assign("https://b"), 2);
        assert_eq!(bib.assign("https://a"), 1);
        assert_eq!(bib.len(), 2);
    }

    #[test]
    fn test_remap_basic() {
        let mut bib = MasterBibliography::new();
        bib.assign("https://earlier");

        let text = "Costs fell [Source 2]. Output rose [Source 1][Source 2].";
        let out = remap_citations(text, &table(&["https://a", "https://b"]), &mut bib);

        assert_eq!(out, "Costs fell [3]. Output rose [2][3].");
    }

    #[test]
    fn test_remap_registers_uncited_sources() {
        let mut bib = MasterBibliography::new();
        remap_citations("No citations here.", &table(&["https://a"]), &mut bib);
        assert_eq!(bib.number("https://a"), Some(1));
    }

    #[test]
    fn test_out_of_range_and_malformed_markers_untouched() {
        let mut bib = MasterBibliography::new();
        let text = "A [Source 9]. B [Source 0]. C [Source x]. D [Source 1";
        let out = remap_citations(text, &table(&["https://a"]), &mut bib);
        assert_eq!(out, text);
    }

    #[test]
    fn test_multidigit_local_index() {
        let urls: Vec<String> = (1..=12).map(|i| format!("https://s{}", i)).collect();
        let t: CitationTable = urls.iter().map(String::as_str).collect();
        let mut bib = MasterBibliography::new();

        let out = remap_citations("x [Source 12] y [Source 1]", &t, &mut bib);
        assert_eq!(out, "x [12] y [1]");
    }

    #[test]
    fn test_duplicate_urls_share_master_number() {
        let mut bib = MasterBibliography::new();
        let out = remap_citations(
            "[Source 1] and [Source 2]",
            &table(&["https://same", "https://same"]),
            &mut bib,
        );
        assert_eq!(out, "[1] and [1]");
        assert_eq!(bib.len(), 1);
    }

    #[test]
    fn test_render_bibliography() {
        let mut bib = MasterBibliography::new();
        bib.assign("https://a");
        bib.assign("https://b");
        assert_eq!(
            bib.render(),
            "## Master Bibliography\n\n[1] https://a\n[2] https://b\n"
        );
    }

    #[test]
    fn test_unicode_around_markers() {
        let mut bib = MasterBibliography::new();
        let out = remap_citations("Überblick [Source 1] 日本", &table(&["https://a"]), &mut bib);
        assert_eq!(out, "Überblick [1] 日本");
    }
}

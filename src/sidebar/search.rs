use std::ops::Range;

use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};

use crate::host::{HostError, Tab, TabHost, TabId, TabQuery, WindowId};

use super::TabSidebar;

/// One search result. Spans are character (not byte) offsets into the title and url.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub tab: TabId,
    pub score: u32,
    pub title_spans: Vec<Range<usize>>,
    pub url_spans: Vec<Range<usize>>,
}

/// Fuzzy index over one window's tab titles and urls.
///
/// The index is a snapshot: it is rebuilt from a fresh host query on the first search after
/// [`Self::invalidate`].
pub struct TabSearch {
    matcher: Matcher,
    entries: Option<Vec<Tab>>,
}

impl std::fmt::Debug for TabSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabSearch")
            .field("entries", &self.entries.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl Default for TabSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl TabSearch {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            entries: None,
        }
    }

    pub fn invalidate(&mut self) {
        self.entries = None;
    }

    pub fn is_stale(&self) -> bool {
        self.entries.is_none()
    }

    /// Best matches first. An empty query matches nothing.
    ///
    /// # Errors
    /// Fails if the index is stale and the host cannot list the window's tabs.
    pub fn query(
        &mut self,
        host: &mut dyn TabHost,
        window: WindowId,
        text: &str,
    ) -> Result<Vec<SearchHit>, HostError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        if self.entries.is_none() {
            let mut tabs = host.query_tabs(&TabQuery::window(window))?;
            tabs.sort_by_key(|t| t.index);
            self.entries = Some(tabs);
        }
        let Some(entries) = &self.entries else {
            return Ok(Vec::new());
        };

        let pattern = Pattern::parse(text, CaseMatching::Ignore, Normalization::Smart);
        let mut buf = Vec::new();
        let mut hits: Vec<(usize, SearchHit)> = Vec::new();
        for tab in entries {
            let title = match_spans(&pattern, &mut self.matcher, &tab.title, &mut buf);
            let url = match_spans(&pattern, &mut self.matcher, &tab.url, &mut buf);
            if title.is_none() && url.is_none() {
                continue;
            }
            let score = title.as_ref().map_or(0, |m| m.0).max(url.as_ref().map_or(0, |m| m.0));
            hits.push((
                tab.index,
                SearchHit {
                    tab: tab.id,
                    score,
                    title_spans: title.map(|m| m.1).unwrap_or_default(),
                    url_spans: url.map(|m| m.1).unwrap_or_default(),
                },
            ));
        }
        hits.sort_by(|(ia, a), (ib, b)| b.score.cmp(&a.score).then(ia.cmp(ib)));
        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }
}

fn match_spans(
    pattern: &Pattern,
    matcher: &mut Matcher,
    haystack: &str,
    buf: &mut Vec<char>,
) -> Option<(u32, Vec<Range<usize>>)> {
    let mut indices = Vec::new();
    let score = pattern.indices(Utf32Str::new(haystack, buf), matcher, &mut indices)?;
    indices.sort_unstable();
    indices.dedup();
    Some((score, merge_spans(&indices)))
}

/// Collapse sorted, distinct character indices into contiguous ranges.
fn merge_spans(indices: &[u32]) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = Vec::new();
    for &index in indices {
        let index = index as usize;
        match spans.last_mut() {
            Some(last) if last.end == index => last.end += 1,
            _ => spans.push(index..index + 1),
        }
    }
    spans
}

impl TabSidebar {
    /// Update the search text and re-run the search.
    pub fn set_search_text(&mut self, host: &mut dyn TabHost, text: &str) {
        if self.search_text != text {
            text.clone_into(&mut self.search_text);
            self.refresh_search(host);
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn search_hits(&self) -> &[SearchHit] {
        &self.search_hits
    }

    /// Re-run the current search, e.g. after the index was invalidated.
    pub(super) fn refresh_search(&mut self, host: &mut dyn TabHost) {
        match self
            .search
            .query(host, self.session.window, &self.search_text)
        {
            Ok(hits) => self.search_hits = hits,
            Err(err) => {
                log::warn!("search failed: {err}");
                self.search_hits.clear();
            }
        }
    }

    pub(super) fn search_needs_refresh(&self) -> bool {
        !self.search_text.trim().is_empty() && self.search.is_stale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_host::MemoryHost;

    #[test]
    fn fuzzy_match_reports_title_spans() {
        let mut host = MemoryHost::new();
        let gmail = host.add_tab("Gmail \u{2014} Inbox", "https://mail.google.com/");
        host.add_tab("Calendar", "https://calendar.example.com/");
        let window = host.window();

        let mut search = TabSearch::new();
        let hits = search.query(&mut host, window, "gmail").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tab, gmail);
        assert_eq!(hits[0].title_spans, vec![0..5]);
    }

    #[test]
    fn index_is_a_snapshot_until_invalidated() {
        let mut host = MemoryHost::new();
        host.add_tab("Calendar", "https://calendar.example.com/");
        let window = host.window();

        let mut search = TabSearch::new();
        assert!(search.query(&mut host, window, "news").unwrap().is_empty());

        let news = host.add_tab("News", "https://news.example.com/");
        assert!(search.query(&mut host, window, "news").unwrap().is_empty());

        search.invalidate();
        let hits = search.query(&mut host, window, "news").unwrap();
        assert_eq!(hits.first().map(|h| h.tab), Some(news));
    }

    #[test]
    fn spans_merge_runs() {
        assert_eq!(merge_spans(&[0, 1, 2, 5, 7, 8]), vec![0..3, 5..6, 7..9]);
        assert!(merge_spans(&[]).is_empty());
    }
}

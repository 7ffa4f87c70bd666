use crate::normalize::SiteUrl;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry {
    url: SiteUrl,
    depth: usize,
    visited: bool,
}

/// Discovered URLs and whether each has been fetched.
///
/// Entries are keyed by [`SiteUrl::key`] and kept in registration order, which
/// doubles as the crawl's FIFO work queue. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct Frontier {
    index: HashMap<String, usize>,
    entries: Vec<Entry>,
    // Every entry before this position is visited.
    cursor: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` as unvisited unless its key is already known.
    /// Returns `true` when the URL was new.
    pub fn register(&mut self, url: SiteUrl, depth: usize) -> bool {
        if self.index.contains_key(url.key()) {
            return false;
        }
        self.index.insert(url.key().to_string(), self.entries.len());
        self.entries.push(Entry {
            url,
            depth,
            visited: false,
        });
        true
    }

    /// Returns `false` if the URL was never registered.
    pub fn mark_visited(&mut self, url: &SiteUrl) -> bool {
        match self.index.get(url.key()) {
            Some(&idx) => {
                self.entries[idx].visited = true;
                self.advance_cursor();
                true
            }
            None => false,
        }
    }

    /// Unvisited URLs in registration order.
    pub fn next_unvisited(&self) -> impl Iterator<Item = &SiteUrl> + '_ {
        self.entries[self.cursor..]
            .iter()
            .filter(|entry| !entry.visited)
            .map(|entry| &entry.url)
    }

    /// Takes the oldest unvisited entry and marks it visited in the same step.
    pub fn claim(&mut self) -> Option<(SiteUrl, usize)> {
        self.advance_cursor();
        let entry = self.entries.get_mut(self.cursor)?;
        entry.visited = true;
        let claimed = (entry.url.clone(), entry.depth);
        self.advance_cursor();
        Some(claimed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_unvisited().next().is_none()
    }

    pub fn contains(&self, url: &SiteUrl) -> bool {
        self.index.contains_key(url.key())
    }

    pub fn is_visited(&self, url: &SiteUrl) -> bool {
        self.index
            .get(url.key())
            .is_some_and(|&idx| self.entries[idx].visited)
    }

    pub fn depth_of(&self, url: &SiteUrl) -> Option<usize> {
        self.index.get(url.key()).map(|&idx| self.entries[idx].depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.visited).count()
    }

    fn advance_cursor(&mut self) {
        while self
            .entries
            .get(self.cursor)
            .is_some_and(|entry| entry.visited)
        {
            self.cursor += 1;
        }
    }
}

//! Crawl frontier
//!
//! This module handles:
//! - FIFO (breadth-first) ordering of discovered URLs
//! - The `seen` set, checked at enqueue time so a URL is queued at most once
//! - The `visited` set, marking URLs dequeued and fetched or skipped
//! - The depth cap, enforced at enqueue time

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link distance from the seed (seed = 0)
    pub depth: u32,

    /// Position in discovery order (seed = 0)
    pub discovery_order: u64,
}

/// Why an enqueue request was refused or accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    AlreadySeen,
    TooDeep,
}

/// FIFO frontier with enqueue-time deduplication
///
/// The frontier is owned by the crawl loop alone; fetch workers never touch it.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    seen: HashSet<String>,
    visited: HashSet<String>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier that drops links deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            visited: HashSet::new(),
            max_depth,
        }
    }

    /// Creates a frontier holding only the seed at depth 0
    pub fn with_seed(seed: Url, max_depth: u32) -> Self {
        let mut frontier = Self::new(max_depth);
        frontier.enqueue(seed, 0);
        frontier
    }

    /// Queues a URL unless it was seen before or exceeds the depth cap
    ///
    /// # Arguments
    ///
    /// * `url` - A normalized URL
    /// * `depth` - Depth of the page that would be fetched (discovering page + 1)
    pub fn enqueue(&mut self, url: Url, depth: u32) -> EnqueueOutcome {
        if depth > self.max_depth {
            return EnqueueOutcome::TooDeep;
        }
        if !self.seen.insert(url.as_str().to_string()) {
            return EnqueueOutcome::AlreadySeen;
        }
        let discovery_order = (self.seen.len() - 1) as u64;
        self.queue.push_back(QueuedUrl {
            url,
            depth,
            discovery_order,
        });
        EnqueueOutcome::Queued
    }

    /// Pops the oldest queued URL
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        self.queue.pop_front()
    }

    /// Marks a URL as visited
    ///
    /// # Returns
    ///
    /// `false` if the URL had already been visited
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever queued (visited, in flight, or waiting)
    pub fn known_count(&self) -> usize {
        self.seen.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

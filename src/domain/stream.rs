use crate::app::ClassifiedError;
use crate::domain::{Book, DataState};

/// Items that carry a stable identity within a stream.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Book {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Pagination state of one result stream.
///
/// `is_fetching_first_page` and `is_fetching_next_page` are never both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub page_index: usize,
    pub has_more: bool,
    pub is_fetching_first_page: bool,
    pub is_fetching_next_page: bool,
    generation: u64,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_index: 0,
            has_more: true,
            is_fetching_first_page: false,
            is_fetching_next_page: false,
            generation: 0,
        }
    }
}

impl PageCursor {
    pub fn is_fetching(&self) -> bool {
        self.is_fetching_first_page || self.is_fetching_next_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Receipt for an issued page request.
///
/// A response is only applied while the stream still carries the
/// generation the ticket was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub page_index: usize,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultStream<T> {
    pub items: Vec<T>,
    pub cursor: PageCursor,
    pub last_error: Option<ClassifiedError>,
}

impl<T> Default for ResultStream<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: PageCursor::default(),
            last_error: None,
        }
    }
}

impl<T: Keyed> ResultStream<T> {
    pub fn state(&self) -> DataState<&[T]> {
        if self.cursor.is_fetching_first_page {
            return DataState::Loading;
        }
        if self.items.is_empty() {
            if let Some(err) = &self.last_error {
                return DataState::Error(err.clone());
            }
            if self.cursor.page_index == 0 {
                return DataState::Idle;
            }
        }
        DataState::Success(self.items.as_slice())
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Drop everything and invalidate outstanding requests.
    pub fn clear(&mut self) {
        let generation = self.cursor.generation + 1;
        *self = Self::default();
        self.cursor.generation = generation;
    }

    /// Clear the stream and mark the first page as in flight.
    pub fn begin_reset(&mut self) -> PageTicket {
        self.clear();
        self.cursor.is_fetching_first_page = true;
        PageTicket {
            generation: self.cursor.generation,
            page_index: 0,
            reset: true,
        }
    }

    /// Mark the next page as in flight, or `None` when nothing may be issued.
    ///
    /// The first page only ever goes out through [`begin_reset`](Self::begin_reset),
    /// so a stream that never loaded a page refuses here.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if self.cursor.is_fetching() || !self.cursor.has_more || self.cursor.page_index == 0 {
            return None;
        }
        self.cursor.is_fetching_next_page = true;
        Some(PageTicket {
            generation: self.cursor.generation,
            page_index: self.cursor.page_index,
            reset: false,
        })
    }

    pub fn accepts(&self, ticket: &PageTicket) -> bool {
        ticket.generation == self.cursor.generation && self.cursor.is_fetching()
    }

    /// Apply a fetched page. Returns `false` for stale tickets.
    ///
    /// An item whose key is already present replaces the earlier entry in
    /// place; everything else is appended in page order.
    pub fn apply_page(&mut self, ticket: &PageTicket, page: Vec<T>, page_size: usize) -> bool {
        if !self.accepts(ticket) {
            return false;
        }

        let returned = page.len();
        if ticket.reset {
            self.items.clear();
        }
        for item in page {
            match self.items.iter().position(|existing| existing.key() == item.key()) {
                Some(pos) => self.items[pos] = item,
                None => self.items.push(item),
            }
        }

        self.cursor.has_more = returned > 0 && returned >= page_size;
        self.cursor.page_index = ticket.page_index + 1;
        self.cursor.is_fetching_first_page = false;
        self.cursor.is_fetching_next_page = false;
        self.last_error = None;
        true
    }

    /// Record a failed page. Items loaded so far stay. Returns `false` for stale tickets.
    pub fn apply_failure(&mut self, ticket: &PageTicket, error: ClassifiedError) -> bool {
        if !self.accepts(ticket) {
            return false;
        }
        self.cursor.is_fetching_first_page = false;
        self.cursor.is_fetching_next_page = false;
        self.last_error = Some(error);
        true
    }
}

// src/pipeline/cursor.rs

//! Pagination cursor management.
//!
//! Owns the opaque continuation token for one run. Pagination is
//! strictly sequential: a page's token is only known after the prior
//! page decodes, so the manager never has two outstanding tokens. A
//! missing token is terminal, and a token seen before is refused rather
//! than replayed.

use std::collections::HashSet;

use crate::models::PageToken;

/// Outcome of one cursor advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorAdvance {
    /// Fetch the next page with this token
    Next(PageToken),
    /// The provider stopped issuing tokens; pagination is complete
    Done,
}

/// Per-run cursor state.
#[derive(Debug, Default)]
pub struct CursorManager {
    current: Option<PageToken>,
    used: HashSet<PageToken>,
    pages_issued: usize,
}

impl CursorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for the page about to be fetched; `None` on the first page.
    pub fn token(&self) -> Option<&PageToken> {
        self.current.as_ref()
    }

    /// 1-based number of the page about to be fetched.
    pub fn next_page_number(&self) -> usize {
        self.pages_issued + 1
    }

    /// Advance past the page just decoded.
    ///
    /// `decoded_token` is the continuation token the page carried.
    /// Reissued tokens terminate pagination: replaying one could only
    /// duplicate a page.
    pub fn advance(&mut self, decoded_token: Option<PageToken>) -> CursorAdvance {
        self.pages_issued += 1;
        if let Some(current) = self.current.take() {
            self.used.insert(current);
        }

        match decoded_token {
            None => CursorAdvance::Done,
            Some(token) => {
                if self.used.contains(&token) {
                    log::warn!("provider reissued a pagination token, treating as terminal");
                    return CursorAdvance::Done;
                }
                self.current = Some(token.clone());
                CursorAdvance::Next(token)
            }
        }
    }
}

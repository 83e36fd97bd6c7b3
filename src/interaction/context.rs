use super::fill_buffer::FormFillBuffer;
use crate::browser::{HttpSession, PageState};
use crate::error::{ReplayError, Result};

/// Mutable state every step handler works against.
pub struct SessionContext {
    pub session: HttpSession,
    pub fill_buffer: FormFillBuffer,
    /// Capture groups of the most recent assertion.
    pub matches: Vec<String>,
    pub verify_titles: bool,
    pub max_redirects: usize,
}

impl SessionContext {
    pub fn new(session: HttpSession) -> Self {
        Self {
            session,
            fill_buffer: FormFillBuffer::new(),
            matches: Vec::new(),
            verify_titles: true,
            max_redirects: 20,
        }
    }

    /// The current page, or a resolution failure when nothing has been fetched yet.
    pub fn current_page(&self) -> Result<&PageState> {
        self.session
            .page()
            .ok_or_else(|| ReplayError::selector("no page has been loaded yet"))
    }
}

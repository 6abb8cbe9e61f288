//! Running vertical position of the composer.

use crate::layout::geometry::PageGeometry;

/// Tolerance for float accumulation when comparing against the bottom margin.
const EPSILON_MM: f32 = 1e-3;

/// Next free vertical position on the current page, plus the page index.
///
/// Every step that consumes vertical space must `advance` by exactly the space
/// it used. `ensure_space` starts a new page when a block would cross the
/// bottom margin.
#[derive(Debug, Clone)]
pub struct LayoutCursor {
    geometry: PageGeometry,
    y: f32,
    page: usize,
}

impl LayoutCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            y: geometry.top(),
            page: 0,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn at_page_top(&self) -> bool {
        (self.y - self.geometry.top()).abs() < EPSILON_MM
    }

    /// True if a block of `height` placed at the cursor stays above the bottom margin.
    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom() + EPSILON_MM
    }

    /// True if a block of `height` would fit on an empty page.
    pub fn fits_on_fresh_page(&self, height: f32) -> bool {
        height <= self.geometry.content_height() + EPSILON_MM
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Moves down to `y` if it is below the cursor; never moves up.
    pub fn sync_to(&mut self, y: f32) {
        self.y = self.y.max(y);
    }

    pub fn new_page(&mut self) {
        self.page += 1;
        self.y = self.geometry.top();
    }

    /// Breaks the page unless `height` fits. Returns true when a break happened.
    ///
    /// An empty page is never broken again, so a block taller than a page is
    /// left for the caller to split.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.fits(height) || self.at_page_top() {
            return false;
        }
        self.new_page();
        true
    }
}

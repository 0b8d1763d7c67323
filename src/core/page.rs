//! Simulated page geometry: the document the scroll core measures.
//!
//! Sections are stacked top to bottom and sized in viewport heights, so a
//! resize re-derives every pixel extent.  All values are CSS-style pixels;
//! the terminal host decides how many pixels a cell represents.

/// Visible window onto the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// How a section is declared, before it is laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSpec {
    pub id: String,
    /// Height in multiples of the viewport height.
    pub height_vh: f64,
}

impl SectionSpec {
    pub fn new(id: impl Into<String>, height_vh: f64) -> Self {
        Self {
            id: id.into(),
            height_vh,
        }
    }
}

/// A laid-out section: absolute top and height in page pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl Section {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Bounding rect relative to the viewport top at scroll offset `scroll_y`.
    pub fn rect_at(&self, scroll_y: f64) -> SectionRect {
        SectionRect {
            top: self.top - scroll_y,
            bottom: self.bottom() - scroll_y,
        }
    }
}

/// Viewport-relative vertical extent, the equivalent of a bounding client rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionRect {
    pub top: f64,
    pub bottom: f64,
}

impl SectionRect {
    /// Any overlap with a viewport of `viewport_height`.
    pub fn intersects(&self, viewport_height: f64) -> bool {
        self.bottom > 0.0 && self.top < viewport_height
    }
}

/// Horizontal content of the rail section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailContent {
    pub card_count: usize,
    /// Card width as a fraction of viewport width.
    pub card_width_vw: f64,
    /// Trailing padding after the last card, fraction of viewport width.
    pub padding_vw: f64,
}

impl RailContent {
    pub fn card_width(&self, viewport: Viewport) -> f64 {
        self.card_width_vw * viewport.width
    }

    pub fn total_width(&self, viewport: Viewport) -> f64 {
        self.card_count as f64 * self.card_width(viewport) + self.padding_vw * viewport.width
    }
}

/// Identifier of the frame-sequence spacer section.
pub const HERO_SECTION: &str = "hero";
/// Identifier of the horizontally scrolling project section.
pub const RAIL_SECTION: &str = "projects";
/// Identifier of the page footer, the `End` key destination.
pub const FOOTER_SECTION: &str = "mega-footer";

/// The full document: viewport plus laid-out sections.
#[derive(Debug, Clone)]
pub struct PageLayout {
    viewport: Viewport,
    specs: Vec<SectionSpec>,
    sections: Vec<Section>,
    rail: RailContent,
}

impl PageLayout {
    pub fn new(viewport: Viewport, specs: Vec<SectionSpec>, rail: RailContent) -> Self {
        let mut page = Self {
            viewport,
            specs,
            sections: Vec::new(),
            rail,
        };
        page.layout();
        page
    }

    /// The portfolio page: a tall hero spacer, about, the project rail,
    /// experience and footer.
    pub fn portfolio(viewport: Viewport) -> Self {
        Self::new(
            viewport,
            vec![
                SectionSpec::new(HERO_SECTION, 4.0),
                SectionSpec::new("about", 1.2),
                SectionSpec::new(RAIL_SECTION, 1.0),
                SectionSpec::new("experience", 1.5),
                SectionSpec::new(FOOTER_SECTION, 0.8),
            ],
            RailContent {
                card_count: 6,
                card_width_vw: 0.45,
                padding_vw: 0.1,
            },
        )
    }

    fn layout(&mut self) {
        let vh = self.viewport.height;
        let mut top = 0.0;
        self.sections = self
            .specs
            .iter()
            .map(|spec| {
                let height = (spec.height_vh * vh).max(0.0);
                let section = Section {
                    id: spec.id.clone(),
                    top,
                    height,
                };
                top += height;
                section
            })
            .collect();
    }

    /// Re-derive every section extent for a new viewport.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.layout();
    }

    /// Drop a section from the document (an element that is not rendered).
    pub fn remove_section(&mut self, id: &str) {
        self.specs.retain(|s| s.id != id);
        self.layout();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn rail_section(&self) -> Option<&Section> {
        self.section(RAIL_SECTION)
    }

    pub fn rail_content(&self) -> RailContent {
        self.rail
    }

    /// Width of the rail's card row in pixels.
    pub fn rail_content_width(&self) -> f64 {
        self.rail.total_width(self.viewport)
    }

    /// Height of the hero spacer; zero when the page has no hero.
    pub fn spacer_height(&self) -> f64 {
        self.section(HERO_SECTION).map_or(0.0, |s| s.height)
    }

    pub fn document_height(&self) -> f64 {
        self.sections.last().map_or(0.0, Section::bottom)
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.height).max(0.0)
    }
}

use crate::fixtures;

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub id: u32,
    pub term: &'static str,
    pub definition: &'static str,
    pub example: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tutorial {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub steps: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: u32,
    pub title: &'static str,
    pub level: &'static str,
    pub duration: &'static str,
    pub lessons: u32,
    pub description: &'static str,
    pub topics: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearningTab {
    #[default]
    Terms,
    Tutorials,
    Courses,
}

impl LearningTab {
    pub fn all() -> &'static [LearningTab] {
        &[LearningTab::Terms, LearningTab::Tutorials, LearningTab::Courses]
    }

    pub fn title(self) -> &'static str {
        match self {
            LearningTab::Terms => "Financial Terms",
            LearningTab::Tutorials => "Dashboard Tutorials",
            LearningTab::Courses => "Courses",
        }
    }

    pub fn next(self) -> LearningTab {
        let tabs = LearningTab::all();
        let index = tabs.iter().position(|&t| t == self).unwrap_or(0);
        tabs[(index + 1) % tabs.len()]
    }
}

pub const COMPLETION_MESSAGE: &str = "Congratulations! You've completed the course.";

/// Navigation state of the learning center. At most one term is expanded at
/// a time.
#[derive(Debug, Clone, Default)]
pub struct LearningCenter {
    pub tab: LearningTab,
    expanded_term: Option<u32>,
    selected_course: Option<u32>,
    /// Highlighted row in the term or course list.
    pub cursor: usize,
}

impl LearningCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tab(&mut self, tab: LearningTab) {
        self.tab = tab;
        self.cursor = 0;
    }

    pub fn expanded_term(&self) -> Option<u32> {
        self.expanded_term
    }

    /// Expands `id`, collapsing whichever term was open. Toggling the open
    /// term collapses it.
    pub fn toggle_term(&mut self, id: u32) {
        self.expanded_term = if self.expanded_term == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn selected_course(&self) -> Option<&'static Course> {
        let id = self.selected_course?;
        fixtures::courses().iter().find(|c| c.id == id)
    }

    pub fn start_course(&mut self, id: u32) {
        if fixtures::courses().iter().any(|c| c.id == id) {
            self.selected_course = Some(id);
            self.tab = LearningTab::Courses;
        }
    }

    pub fn back_to_courses(&mut self) {
        self.selected_course = None;
    }

    /// Marks the open course as done. Nothing is persisted; the caller only
    /// shows the returned message.
    pub fn complete_course(&mut self) -> Option<&'static str> {
        self.selected_course.take().map(|_| COMPLETION_MESSAGE)
    }

    fn row_count(&self) -> usize {
        match self.tab {
            LearningTab::Terms => fixtures::financial_terms().len(),
            LearningTab::Tutorials => fixtures::dashboard_tutorials().len(),
            LearningTab::Courses => fixtures::courses().len(),
        }
    }

    pub fn cursor_down(&mut self) {
        if self.cursor < self.row_count().saturating_sub(1) {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Enter on the highlighted row: toggles a term or opens a course.
    pub fn activate_cursor(&mut self) {
        match self.tab {
            LearningTab::Terms => {
                if let Some(term) = fixtures::financial_terms().get(self.cursor) {
                    self.toggle_term(term.id);
                }
            }
            LearningTab::Courses if self.selected_course.is_none() => {
                if let Some(course) = fixtures::courses().get(self.cursor) {
                    self.start_course(course.id);
                }
            }
            _ => {}
        }
    }
}

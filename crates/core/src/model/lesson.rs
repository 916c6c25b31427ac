use serde::Serialize;

use crate::model::ids::LessonId;

/// Immutable practice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonText {
    pub id: LessonId,
    pub title: &'static str,
    pub content: &'static str,
}

impl LessonText {
    /// Length of the content in characters (not bytes).
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Category used when a caller asks for one the catalog does not know.
pub const DEFAULT_CATEGORY: &str = "beginner";

struct Category {
    key: &'static str,
    lessons: &'static [LessonText],
}

const fn lesson(id: u32, title: &'static str, content: &'static str) -> LessonText {
    LessonText {
        id: LessonId::new(id),
        title,
        content,
    }
}

static CATALOG: &[Category] = &[
    Category {
        key: "beginner",
        lessons: &[
            lesson(101, "Home Row", "asdf jkl; asdf jkl; fall lads ask dad flask salad"),
            lesson(102, "Top Row", "quiet type power tower were you your pure output"),
            lesson(103, "Bottom Row", "zinc cave move bank climb maze next vex box civic"),
            lesson(104, "Short Words", "the cat sat on the mat and the dog ran to the sun"),
        ],
    },
    Category {
        key: "intermediate",
        lessons: &[
            lesson(
                201,
                "Pangram",
                "The quick brown fox jumps over the lazy dog while five boxing wizards jump quickly.",
            ),
            lesson(
                202,
                "Punctuation",
                "Wait, is it done? Yes: the build passed, the tests ran; everyone cheered!",
            ),
            lesson(
                203,
                "Numbers",
                "Room 42 opens at 9:15, closes at 17:30, and seats 120 people across 3 floors.",
            ),
        ],
    },
    Category {
        key: "advanced",
        lessons: &[
            lesson(
                301,
                "Learning",
                "Practice does not make perfect; deliberate practice, with honest feedback and steady repetition, makes progress.",
            ),
            lesson(
                302,
                "Focus",
                "Typing quickly is less about speed and more about rhythm, posture, and keeping your eyes on the text instead of the keys.",
            ),
        ],
    },
    Category {
        key: "programming",
        lessons: &[
            lesson(401, "Rust Function", "fn add(a: i32, b: i32) -> i32 { a + b }"),
            lesson(
                402,
                "JavaScript Arrow",
                "const total = items.reduce((sum, item) => sum + item.price, 0);",
            ),
            lesson(
                403,
                "Python Loop",
                "for index, value in enumerate(values): print(index, value)",
            ),
        ],
    },
];

fn find_category(key: &str) -> Option<&'static Category> {
    let key = key.trim();
    CATALOG
        .iter()
        .find(|category| category.key.eq_ignore_ascii_case(key))
}

fn default_category() -> &'static Category {
    find_category(DEFAULT_CATEGORY).unwrap_or(&CATALOG[0])
}

/// All category keys, in catalog order.
pub fn categories() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|category| category.key)
}

/// Canonical key for `category`, falling back to [`DEFAULT_CATEGORY`].
#[must_use]
pub fn resolve_category(category: &str) -> &'static str {
    find_category(category).unwrap_or_else(default_category).key
}

/// Lessons of `category`, falling back to the default category.
#[must_use]
pub fn lessons(category: &str) -> &'static [LessonText] {
    find_category(category)
        .unwrap_or_else(default_category)
        .lessons
}

/// Resolves `(category, index)` to a lesson.
///
/// Unknown categories fall back to the default one and `index` wraps around
/// the category length, so every call yields a lesson.
#[must_use]
pub fn select_lesson(category: &str, index: usize) -> &'static LessonText {
    let list = lessons(category);
    &list[index % list.len()]
}

/// Position in the catalog used for "next lesson" navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonCursor {
    category: &'static str,
    index: usize,
}

impl LessonCursor {
    #[must_use]
    pub fn new(category: &str, index: usize) -> Self {
        let category = resolve_category(category);
        let len = lessons(category).len();
        Self {
            category,
            index: index % len,
        }
    }

    #[must_use]
    pub fn category(&self) -> &'static str {
        self.category
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn lesson(&self) -> &'static LessonText {
        select_lesson(self.category, self.index)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::new(self.category, self.index + 1)
    }

    #[must_use]
    pub fn previous(self) -> Self {
        let len = lessons(self.category).len();
        Self::new(self.category, self.index + len - 1)
    }
}

impl Default for LessonCursor {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY, 0)
    }
}

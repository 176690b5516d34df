use serde::{Deserialize, Serialize};

/// Number of course slots offered by the submission form.
pub const MAX_COURSE_SLOTS: usize = 12;

/// Catalog restriction level on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    None,
    /// Required course; may not appear in a plan.
    Required,
    /// Graduate or professional/technical course.
    Graduate(i16),
}

impl Restriction {
    pub fn from_level(level: i16) -> Self {
        match level {
            level if level <= 0 => Restriction::None,
            1 => Restriction::Required,
            level => Restriction::Graduate(level),
        }
    }

    pub fn level(self) -> i16 {
        match self {
            Restriction::None => 0,
            Restriction::Required => 1,
            Restriction::Graduate(level) => level,
        }
    }
}

/// Read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,
    pub course_code: String,
    pub title: String,
    pub credits: i32,
    pub restriction: Restriction,
}

/// Drop empty and missing slots, keeping the order of the rest.
///
/// Codes are trimmed; a slot holding only whitespace counts as empty.
pub fn compact_course_slots<I, S>(slots: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    slots
        .into_iter()
        .flatten()
        .filter_map(|slot| {
            let code = slot.as_ref().trim();
            (!code.is_empty()).then(|| code.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_drops_blank_slots_and_keeps_order() {
        let slots = vec![
            Some("CS 161"),
            None,
            Some(""),
            Some("  "),
            Some("MTH 251 "),
            Some("CS 161"),
        ];
        assert_eq!(
            compact_course_slots(slots),
            vec!["CS 161".to_string(), "MTH 251".to_string(), "CS 161".to_string()]
        );
    }

    #[test]
    fn restriction_levels_map_to_variants() {
        assert_eq!(Restriction::from_level(0), Restriction::None);
        assert_eq!(Restriction::from_level(1), Restriction::Required);
        assert_eq!(Restriction::from_level(3), Restriction::Graduate(3));
        assert_eq!(Restriction::Graduate(3).level(), 3);
    }
}

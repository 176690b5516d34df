//! Parameterized batch statements.
//!
//! Course lists are bounded by the form's slot count, so every catalog check
//! and the selected-course insert go out as one statement with one bound
//! parameter per code.

use sqlx::{Postgres, QueryBuilder};

use courseplan_core::PlanId;

/// `head (?, ?, ...)tail` with every code bound as its own parameter.
pub fn in_list<'args>(
    head: &str,
    codes: &'args [String],
    tail: &str,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(head);
    builder.push(" (");
    let mut separated = builder.separated(", ");
    for code in codes {
        separated.push_bind(code.as_str());
    }
    separated.push_unseparated(")");
    builder.push(tail);
    builder
}

/// Multi-row insert of selected courses; each code is resolved to its
/// course id by a subquery at write time.
pub fn selected_course_rows<'args>(
    plan_id: PlanId,
    codes: &'args [String],
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO selected_course (plan_id, course_id) ");
    builder.push_values(codes, |mut row, code| {
        row.push_bind(plan_id)
            .push("(SELECT course_id FROM course WHERE course_code = ")
            .push_bind_unseparated(code.as_str())
            .push_unseparated(")");
    });
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn in_list_numbers_one_placeholder_per_code() {
        let codes = codes(&["CS 161", "CS 162", "MTH 251"]);
        let builder = in_list(
            "SELECT COUNT(*) FROM course WHERE course_code IN",
            &codes,
            "",
        );
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM course WHERE course_code IN ($1, $2, $3)"
        );
    }

    #[test]
    fn in_list_appends_tail() {
        let codes = codes(&["CS 161"]);
        let builder = in_list(
            "SELECT course_code, restriction FROM course WHERE course_code IN",
            &codes,
            " AND restriction > 0 ORDER BY restriction",
        );
        assert_eq!(
            builder.sql(),
            "SELECT course_code, restriction FROM course WHERE course_code IN ($1) \
             AND restriction > 0 ORDER BY restriction"
        );
    }

    #[test]
    fn selected_course_rows_resolve_codes_by_subquery() {
        let codes = codes(&["CS 161", "CS 162"]);
        let builder = selected_course_rows(9, &codes);
        assert_eq!(
            builder.sql(),
            "INSERT INTO selected_course (plan_id, course_id) VALUES \
             ($1, (SELECT course_id FROM course WHERE course_code = $2)), \
             ($3, (SELECT course_id FROM course WHERE course_code = $4))"
        );
    }
}

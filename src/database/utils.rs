use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?").expect("placeholder pattern is valid"));

/// Collapse whitespace and turn `?` placeholders into Postgres `$n` parameters.
pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut param_index = 0;
    PLACEHOLDER
        .replace_all(&cleaned, |_: &Captures| {
            param_index += 1;
            format!("${}", param_index)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::sql;

    #[test]
    fn numbers_placeholders_in_order() {
        let query = sql(r#"
            UPDATE contracts
            SET status = ?
            WHERE id = ? AND status = ?
        "#);
        assert_eq!(
            query,
            "UPDATE contracts SET status = $1 WHERE id = $2 AND status = $3"
        );
    }
}

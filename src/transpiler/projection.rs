use crate::ast::operators::Operator;

/// Render the select list. Only the last `SelectOnly` counts.
pub fn translate_projection(operators: &[&Operator]) -> String {
    operators
        .iter()
        .rev()
        .find_map(|op| match op {
            Operator::SelectOnly(fields) => Some(fields.join(", ")),
            _ => None,
        })
        .unwrap_or_else(|| "*".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_by_default() {
        assert_eq!(translate_projection(&[&Operator::Skip(1)]), "*");
    }

    #[test]
    fn test_last_select_wins() {
        let first = Operator::SelectOnly(vec!["UserName".into()]);
        let second = Operator::SelectOnly(vec!["Id".into(), "Email".into()]);
        assert_eq!(translate_projection(&[&first, &second]), "Id, Email");
    }
}

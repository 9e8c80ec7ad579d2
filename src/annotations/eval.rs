use crate::decl::Expr;

/// Evaluate an attribute expression to the text written in the database.
///
/// Returns `None` when the expression is not a literal, a qualified
/// constant reference, a class literal, or an array of those.
pub fn evaluate(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Literal(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Expr::Reference(reference) => {
            let qualifier = reference.qualifier.as_deref()?;
            Some(format!("{}.{}", qualifier, reference.name))
        }
        Expr::Class(name) => Some(format!("{}.class", name)),
        Expr::Array(items) => {
            let values = items.iter().map(evaluate).collect::<Option<Vec<_>>>()?;
            Some(format!("{{{}}}", values.join(", ")))
        }
        Expr::Unresolved(_) => None,
    }
}

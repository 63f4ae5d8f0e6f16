//! Cause Label Module
//! Turns the long descriptive cause column names into chart labels.

/// Boilerplate every cause column in the risk-factor dataset starts with.
pub const CAUSE_PREFIX: &str = "Deaths that are from all causes attributed to ";

/// Strip the boilerplate prefix, leaving the rest of the name untouched.
pub fn strip_cause_prefix(column: &str) -> &str {
    column.strip_prefix(CAUSE_PREFIX).unwrap_or(column)
}

/// Short legend label: prefix stripped, everything from the first comma dropped.
///
/// `"Deaths that are from all causes attributed to smoking, in both sexes aged all ages"`
/// becomes `"smoking"`.
pub fn short_label(column: &str) -> &str {
    let stripped = strip_cause_prefix(column);
    stripped.split(',').next().unwrap_or(stripped)
}

/// Panel title: prefix stripped, then every word capitalised.
pub fn panel_title(column: &str) -> String {
    title_case(strip_cause_prefix(column))
}

/// Capitalise the first letter of every alphabetic run and lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}

/// Check whether a configured column reference names this column, either by
/// its full name or by its short label.
pub fn matches_column(reference: &str, column: &str) -> bool {
    reference == column || reference == short_label(column)
}

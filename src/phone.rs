/// Brings a loosely written phone number into `+<country><number>` form.
///
/// National numbers are assumed to be British.  The trunk `0` some people
/// keep after `+44` or `+33` is dropped.  Normalizing a normalized number
/// changes nothing.
pub fn normalize(number: &str) -> String {
    let number: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '.' | '-'))
        .collect();

    let mut number = if let Some(rest) = number.strip_prefix("00") {
        format!("+{rest}")
    } else if number.starts_with('0') && number[1..].starts_with(|c: char| matches!(c, '1'..='9'))
    {
        format!("+44{}", &number[1..])
    } else {
        number
    };

    for country in ["+44", "+33"] {
        if let Some(rest) = number.strip_prefix(country) {
            if rest.starts_with('0') {
                number = format!("{country}{}", rest.trim_start_matches('0'));
            }
            break;
        }
    }
    number
}

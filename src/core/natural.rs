use std::cmp::Ordering;

/// Compare two labels in natural order: digit runs compare by numeric value,
/// everything else byte-wise.
///
/// `"2"` sorts before `"10"`, `"Q2-2021"` before `"Q10-2021"`. Labels that are
/// equal under natural order (e.g. `"01"` and `"1"`) fall back to plain string
/// order so the result is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = Chunks::new(a);
    let mut cb = Chunks::new(b);
    loop {
        match (ca.next(), cb.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => cmp_numeric(x, y),
                    // Digits sort before text, as in most natural sort implementations
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sort labels in natural order, removing duplicates.
pub fn natural_sorted<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = labels.into_iter().map(Into::into).collect();
    out.sort_by(|a, b| natural_cmp(a, b));
    out.dedup();
    out
}

fn is_digits(s: &str) -> bool {
    s.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

fn cmp_numeric(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

/// Iterator over maximal runs of ASCII digits / non-digits.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = *self.rest.as_bytes().first()?;
        let digit = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_runs() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("Q10-2021", "Q2-2021"), Ordering::Greater);
        assert_eq!(natural_cmp("2020", "2020"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros_fall_back_to_string_order() {
        assert_eq!(natural_cmp("01", "1"), Ordering::Less);
        assert_eq!(natural_cmp("1", "01"), Ordering::Greater);
    }

    #[test]
    fn test_natural_sorted() {
        let sorted = natural_sorted(["week10", "week2", "week1", "week2"]);
        assert_eq!(sorted, vec!["week1", "week2", "week10"]);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("2020", "2020-01"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }
}

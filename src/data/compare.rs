use crate::data::type_inference::{parse_date, parse_number, parse_time, ColumnType};
use crate::state::events::SortDirection;
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// A cell value prepared for comparison under a column type.
///
/// `None` payloads are values that failed to parse; they always sort after
/// every valid value, whichever direction is requested.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Text(String),
    Number(Option<f64>),
    Time(Option<u32>),
    Date(Option<NaiveDateTime>),
}

impl SortKey {
    pub fn from_raw(raw: &str, column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Text => SortKey::Text(fold_text(raw)),
            ColumnType::Number => SortKey::Number(parse_number(raw)),
            ColumnType::Time => SortKey::Time(parse_time(raw)),
            ColumnType::Date => SortKey::Date(parse_date(raw)),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            SortKey::Text(_) => true,
            SortKey::Number(n) => n.is_some(),
            SortKey::Time(t) => t.is_some(),
            SortKey::Date(d) => d.is_some(),
        }
    }
}

/// Compare two keys in the requested direction
pub fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    match (a, b) {
        (SortKey::Text(a), SortKey::Text(b)) => direction.apply(natural_cmp(a, b)),
        (SortKey::Number(a), SortKey::Number(b)) => {
            compare_valid_first(a.as_ref(), b.as_ref(), direction, |x, y| x.total_cmp(y))
        }
        (SortKey::Time(a), SortKey::Time(b)) => {
            compare_valid_first(a.as_ref(), b.as_ref(), direction, |x, y| x.cmp(y))
        }
        (SortKey::Date(a), SortKey::Date(b)) => {
            compare_valid_first(a.as_ref(), b.as_ref(), direction, |x, y| x.cmp(y))
        }
        // Keys of one column always share a type
        _ => Ordering::Equal,
    }
}

/// Compare two raw cell values as `column_type`
pub fn compare_raw(a: &str, b: &str, column_type: ColumnType, direction: SortDirection) -> Ordering {
    compare_keys(
        &SortKey::from_raw(a, column_type),
        &SortKey::from_raw(b, column_type),
        direction,
    )
}

/// Direction only applies between two valid values; invalid ones stay at the end.
fn compare_valid_first<T, F>(a: Option<&T>, b: Option<&T>, direction: SortDirection, cmp: F) -> Ordering
where
    F: Fn(&T, &T) -> Ordering,
{
    match (a, b) {
        (Some(a), Some(b)) => direction.apply(cmp(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case- and accent-insensitive form of a text value
pub fn fold_text(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Natural ordering: runs of digits compare by numeric value, so "item2" < "item10"
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => (l, r),
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let l_run = take_digits(&mut left);
            let r_run = take_digits(&mut right);
            match compare_digit_runs(&l_run, &r_run) {
                Ordering::Equal => continue,
                other => return other,
            }
        }

        match l.cmp(&r) {
            Ordering::Equal => {
                left.next();
                right.next();
            }
            other => return other,
        }
    }
}

fn take_digits<I>(chars: &mut std::iter::Peekable<I>) -> String
where
    I: Iterator<Item = char>,
{
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_ordering() {
        assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("item10", "item2"), Ordering::Greater);
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_cmp("file007", "file7"), Ordering::Equal);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
    }

    #[test]
    fn test_text_is_case_and_accent_insensitive() {
        assert_eq!(
            compare_raw("Apple", "apple", ColumnType::Text, SortDirection::Asc),
            Ordering::Equal
        );
        assert_eq!(
            compare_raw("élan", "Elan", ColumnType::Text, SortDirection::Asc),
            Ordering::Equal
        );
        assert_eq!(
            compare_raw("Zeta", "alpha", ColumnType::Text, SortDirection::Asc),
            Ordering::Greater
        );
    }

    #[test]
    fn test_invalid_numbers_sort_last_in_both_directions() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            assert_eq!(
                compare_raw("5", "n/a", ColumnType::Number, direction),
                Ordering::Less
            );
            assert_eq!(
                compare_raw("n/a", "5", ColumnType::Number, direction),
                Ordering::Greater
            );
        }
        assert_eq!(
            compare_raw("5", "10", ColumnType::Number, SortDirection::Desc),
            Ordering::Greater
        );
    }

    #[test]
    fn test_invalid_times_and_dates_sort_last() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            assert_eq!(
                compare_raw("9:00", "later", ColumnType::Time, direction),
                Ordering::Less
            );
            assert_eq!(
                compare_raw("never", "01.01.2020", ColumnType::Date, direction),
                Ordering::Greater
            );
        }
        assert_eq!(
            compare_raw("02.01.2020", "01.01.2020", ColumnType::Date, SortDirection::Asc),
            Ordering::Greater
        );
    }

    #[test]
    fn test_two_invalid_values_are_equal() {
        assert_eq!(
            compare_raw("?", "-", ColumnType::Number, SortDirection::Desc),
            Ordering::Equal
        );
    }
}

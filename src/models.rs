use crate::error::{TrackerError, TrackerResult};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Shown for profile fields the user never filled in.
pub const PLACEHOLDER: &str = "------";

/// Separates category and amount in the persisted record form.
const RECORD_DELIMITER: &str = ": $";

/// Parses trimmed user text as an exact decimal. The scale is kept, so
/// `12.50` displays as `12.50` again.
fn parse_decimal(field: &'static str, input: &str) -> TrackerResult<Decimal> {
    let input = input.trim();
    Decimal::from_str(input).map_err(|_| TrackerError::parse(field, input))
}

/// Rounds half away from zero to whole cents.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One spending record. Persisted as `"<category>: $<amount>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseEntry {
    pub category: String,
    pub amount: Decimal,
}

impl fmt::Display for ExpenseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{RECORD_DELIMITER}{}", self.category, self.amount)
    }
}

impl FromStr for ExpenseEntry {
    type Err = TrackerError;

    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let (category, amount) = record.rsplit_once(RECORD_DELIMITER).ok_or_else(|| {
            TrackerError::Validation(format!("record '{record}' is missing '{RECORD_DELIMITER}'"))
        })?;
        Ok(Self {
            category: category.to_string(),
            amount: parse_decimal("Amount", amount)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub phone: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER.into(),
            phone: PLACEHOLDER.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetState {
    /// Zero means no target has been set.
    pub monthly_target: Decimal,
    pub notes: String,
}

/// Everything the app knows: profile, ledger and budget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tracker {
    pub profile: Profile,
    pub budget: BudgetState,
    ledger: Vec<ExpenseEntry>,
}

impl Tracker {
    pub fn from_parts(profile: Profile, ledger: Vec<ExpenseEntry>, budget: BudgetState) -> Self {
        Self {
            profile,
            budget,
            ledger,
        }
    }

    pub fn entries(&self) -> &[ExpenseEntry] {
        &self.ledger
    }

    pub fn records_newest_first(&self) -> impl Iterator<Item = &ExpenseEntry> {
        self.ledger.iter().rev()
    }

    pub fn count(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    pub fn add_entry(&mut self, category: &str, amount: &str) -> TrackerResult<&ExpenseEntry> {
        if category.trim().is_empty() || amount.trim().is_empty() {
            return Err(TrackerError::Validation(
                "Please enter both amount and category.".into(),
            ));
        }
        if category.contains(RECORD_DELIMITER) {
            return Err(TrackerError::Validation(format!(
                "Category cannot contain '{RECORD_DELIMITER}'."
            )));
        }
        let amount = parse_decimal("Amount", amount)?;

        self.ledger.push(ExpenseEntry {
            category: category.to_string(),
            amount,
        });
        Ok(&self.ledger[self.ledger.len() - 1])
    }

    pub fn total(&self) -> Decimal {
        self.ledger.iter().map(|e| e.amount).sum()
    }

    pub fn mean(&self) -> TrackerResult<Decimal> {
        if self.ledger.is_empty() {
            return Err(TrackerError::EmptyLedger);
        }
        Ok(self.total() / Decimal::from(self.ledger.len()))
    }

    pub fn monthly_target(&self) -> Option<Decimal> {
        (!self.budget.monthly_target.is_zero()).then_some(self.budget.monthly_target)
    }

    /// `None` while no monthly target is set.
    pub fn remaining_budget(&self) -> Option<Decimal> {
        self.monthly_target().map(|target| target - self.total())
    }

    /// Summed amount per exact category label, in order of first appearance.
    pub fn category_breakdown(&self) -> TrackerResult<impl Iterator<Item = (&str, Decimal)>> {
        if self.ledger.is_empty() {
            return Err(TrackerError::EmptyLedger);
        }

        let mut totals: Vec<(&str, Decimal)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for entry in &self.ledger {
            let category = entry.category.as_str();
            match positions.get(category) {
                Some(&idx) => totals[idx].1 += entry.amount,
                None => {
                    positions.insert(category, totals.len());
                    totals.push((category, entry.amount));
                }
            }
        }
        Ok(totals.into_iter())
    }

    pub fn summary(&self) -> TrackerResult<Summary> {
        Ok(Summary {
            count: self.count(),
            total: self.total(),
            mean: self.mean()?,
            remaining: self.remaining_budget(),
        })
    }

    pub fn set_target(&mut self, value: &str) -> TrackerResult<Decimal> {
        if value.trim().is_empty() {
            return Err(TrackerError::Validation("Please enter a valid target.".into()));
        }
        self.budget.monthly_target = parse_decimal("Monthly target", value)?;
        Ok(self.budget.monthly_target)
    }

    pub fn set_notes(&mut self, text: impl Into<String>) {
        self.budget.notes = text.into();
    }

    pub fn set_profile(&mut self, name: impl Into<String>, phone: impl Into<String>) {
        self.profile.name = name.into();
        self.profile.phone = phone.into();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub total: Decimal,
    pub mean: Decimal,
    pub remaining: Option<Decimal>,
}

pub fn format_currency(value: Decimal) -> String {
    let cents = round_cents(value);
    if cents.is_sign_negative() && !cents.is_zero() {
        format!("-${:.2}", cents.abs())
    } else {
        format!("${:.2}", cents.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Tracker {
        let mut tracker = Tracker::default();
        tracker.add_entry("Food", "12.50").unwrap();
        tracker.add_entry("Food", "7.50").unwrap();
        tracker.add_entry("Transport", "10").unwrap();
        tracker
    }

    #[test]
    fn scenario_totals_mean_and_breakdown() {
        let tracker = sample();
        assert_eq!(tracker.total(), dec!(30.00));
        assert_eq!(tracker.mean().unwrap(), dec!(10.00));

        let breakdown: Vec<_> = tracker.category_breakdown().unwrap().collect();
        assert_eq!(breakdown, vec![("Food", dec!(20.00)), ("Transport", dec!(10))]);
    }

    #[test]
    fn remaining_budget_with_target() {
        let mut tracker = Tracker::default();
        tracker.set_target("100").unwrap();
        tracker.add_entry("Food", "12.50").unwrap();
        tracker.add_entry("Food", "7.50").unwrap();
        tracker.add_entry("Transport", "10").unwrap();
        assert_eq!(tracker.remaining_budget(), Some(dec!(70.00)));
    }

    #[test]
    fn remaining_budget_goes_negative_when_overspent() {
        let mut tracker = sample();
        tracker.set_target("25").unwrap();
        assert_eq!(tracker.remaining_budget(), Some(dec!(-5)));
    }

    #[test]
    fn remaining_budget_unavailable_without_target() {
        let tracker = sample();
        assert_eq!(tracker.remaining_budget(), None);

        let mut zeroed = sample();
        zeroed.set_target("0").unwrap();
        assert_eq!(zeroed.remaining_budget(), None);
    }

    #[test]
    fn total_matches_sum_in_insertion_order() {
        let amounts = ["1.25", "3", "0.75", "100", "-2"];
        let mut tracker = Tracker::default();
        for (i, amount) in amounts.iter().enumerate() {
            tracker.add_entry(&format!("c{i}"), amount).unwrap();
        }
        assert_eq!(tracker.total(), dec!(103.00));
    }

    #[test]
    fn decimal_amounts_add_without_drift() {
        let mut tracker = Tracker::default();
        tracker.add_entry("Food", "0.1").unwrap();
        tracker.add_entry("Food", "0.2").unwrap();
        assert_eq!(tracker.total(), dec!(0.3));
        assert_eq!(tracker.category_breakdown().unwrap().next(), Some(("Food", dec!(0.3))));
    }

    #[test]
    fn breakdown_sums_exactly_to_total() {
        let mut tracker = Tracker::default();
        for (category, amount) in [("A", "0.1"), ("B", "0.2"), ("A", "0.3"), ("B", "0.7"), ("A", "1.1")] {
            tracker.add_entry(category, amount).unwrap();
        }
        let breakdown: Vec<_> = tracker.category_breakdown().unwrap().collect();
        assert_eq!(breakdown, vec![("A", dec!(1.5)), ("B", dec!(0.9))]);

        let sum: Decimal = breakdown.iter().map(|(_, v)| *v).sum();
        assert_eq!(sum, tracker.total());
        assert_eq!(tracker.total(), dec!(2.4));
    }

    #[test]
    fn breakdown_labels_are_exact() {
        let mut tracker = Tracker::default();
        tracker.add_entry("food", "1").unwrap();
        tracker.add_entry("Food", "2").unwrap();
        tracker.add_entry("Food ", "4").unwrap();
        tracker.add_entry("Fo od", "8").unwrap();
        let labels: Vec<_> = tracker
            .category_breakdown()
            .unwrap()
            .map(|(c, _)| c.to_string())
            .collect();
        assert_eq!(labels, vec!["food", "Food", "Food ", "Fo od"]);
    }

    #[test]
    fn empty_ledger_signals_no_data() {
        let tracker = Tracker::default();
        assert_eq!(tracker.total(), Decimal::ZERO);
        assert_eq!(tracker.mean(), Err(TrackerError::EmptyLedger));
        assert!(matches!(
            tracker.category_breakdown(),
            Err(TrackerError::EmptyLedger)
        ));
        assert_eq!(tracker.summary(), Err(TrackerError::EmptyLedger));
    }

    #[test]
    fn add_entry_requires_both_fields() {
        let mut tracker = Tracker::default();
        assert!(matches!(tracker.add_entry("", "5").unwrap_err(), TrackerError::Validation(_)));
        assert!(matches!(tracker.add_entry("Food", "").unwrap_err(), TrackerError::Validation(_)));
        assert!(matches!(tracker.add_entry("   ", "5").unwrap_err(), TrackerError::Validation(_)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn add_entry_rejects_non_numeric_amounts() {
        let mut tracker = Tracker::default();
        for bad in ["twelve", "$12", "12,50", "inf", "NaN"] {
            let err = tracker.add_entry("Food", bad).unwrap_err();
            assert!(
                matches!(err, TrackerError::Parse { .. }),
                "{bad} should be a parse error"
            );
        }
        assert!(tracker.is_empty());
    }

    #[test]
    fn add_entry_rejects_record_delimiter_in_category() {
        let mut tracker = Tracker::default();
        let err = tracker.add_entry("Odd: $label", "3").unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let mut tracker = Tracker::default();
        tracker.add_entry("Food", "5").unwrap();
        tracker.add_entry("Food", "5").unwrap();
        assert_eq!(tracker.count(), 2);
        assert_eq!(tracker.entries()[0], tracker.entries()[1]);
    }

    #[test]
    fn records_are_listed_newest_first() {
        let tracker = sample();
        let lines: Vec<_> = tracker.records_newest_first().map(|e| e.to_string()).collect();
        assert_eq!(lines, vec!["Transport: $10", "Food: $7.50", "Food: $12.50"]);
    }

    #[test]
    fn record_string_keeps_amount_scale() {
        let entry: ExpenseEntry = "Food: $12.50".parse().unwrap();
        assert_eq!(entry.category, "Food");
        assert_eq!(entry.amount, dec!(12.50));
        assert_eq!(entry.to_string(), "Food: $12.50");
    }

    #[test]
    fn record_string_splits_on_last_delimiter() {
        let entry: ExpenseEntry = "Note: $x: $4".parse().unwrap();
        assert_eq!(entry.category, "Note: $x");
        assert_eq!(entry.amount, dec!(4));
    }

    #[test]
    fn malformed_record_strings_are_rejected() {
        assert!("Food 12".parse::<ExpenseEntry>().is_err());
        assert!("Food: $abc".parse::<ExpenseEntry>().is_err());
    }

    #[test]
    fn set_target_validates_input() {
        let mut tracker = Tracker::default();
        assert!(matches!(tracker.set_target("").unwrap_err(), TrackerError::Validation(_)));
        assert!(matches!(tracker.set_target("lots").unwrap_err(), TrackerError::Parse { .. }));
        assert_eq!(tracker.budget.monthly_target, Decimal::ZERO);
        assert_eq!(tracker.set_target(" 250.5 ").unwrap(), dec!(250.5));
        assert_eq!(tracker.monthly_target(), Some(dec!(250.5)));
    }

    #[test]
    fn notes_and_profile_are_stored_verbatim() {
        let mut tracker = Tracker::default();
        tracker.set_notes("  rent due on the 1st\nsave more  ");
        tracker.set_profile("", "+1 555 0100");
        assert_eq!(tracker.budget.notes, "  rent due on the 1st\nsave more  ");
        assert_eq!(tracker.profile.name, "");
        assert_eq!(tracker.profile.phone, "+1 555 0100");
    }

    #[test]
    fn reset_restores_defaults() {
        let mut tracker = sample();
        tracker.set_target("100").unwrap();
        tracker.set_notes("notes");
        tracker.set_profile("Ada", "123");
        tracker.reset();
        assert_eq!(tracker, Tracker::default());
        assert_eq!(tracker.profile.name, PLACEHOLDER);
        assert_eq!(tracker.profile.phone, PLACEHOLDER);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(dec!(30)), "$30.00");
        assert_eq!(format_currency(dec!(-5.5)), "-$5.50");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
        assert_eq!(format_currency(dec!(2.345)), "$2.35");
    }

    #[test]
    fn summary_collects_all_figures() {
        let mut tracker = sample();
        tracker.set_target("100").unwrap();
        let summary = tracker.summary().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total, dec!(30));
        assert_eq!(summary.mean, dec!(10));
        assert_eq!(summary.remaining, Some(dec!(70)));
    }
}

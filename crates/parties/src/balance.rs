use serde::Serialize;

/// Signed balance totals for one party family in one store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceTotals {
    pub total_balance_less_than_zero: f64,
    pub total_balance_greater_than_zero: f64,
}

impl BalanceTotals {
    /// Fold balances in one pass. Zero and absent balances contribute to neither side.
    ///
    /// Returns `None` when there were no records at all.
    pub fn accumulate<I>(balances: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut seen = false;
        let mut totals = BalanceTotals::default();
        for balance in balances {
            seen = true;
            match balance {
                Some(b) if b < 0.0 => totals.total_balance_less_than_zero += b,
                Some(b) if b > 0.0 => totals.total_balance_greater_than_zero += b,
                _ => {}
            }
        }
        seen.then_some(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_by_sign() {
        let totals = BalanceTotals::accumulate(
            [-50.0, -10.0, 0.0, 20.0, 30.0].into_iter().map(Some),
        )
        .unwrap();
        assert_eq!(totals.total_balance_less_than_zero, -60.0);
        assert_eq!(totals.total_balance_greater_than_zero, 50.0);
    }

    #[test]
    fn absent_balances_are_neutral() {
        let totals = BalanceTotals::accumulate([None, Some(5.0)]).unwrap();
        assert_eq!(totals.total_balance_less_than_zero, 0.0);
        assert_eq!(totals.total_balance_greater_than_zero, 5.0);
    }

    #[test]
    fn no_records_is_none() {
        assert_eq!(BalanceTotals::accumulate(std::iter::empty()), None);
        assert!(BalanceTotals::accumulate([None]).is_some());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(BalanceTotals {
            total_balance_less_than_zero: -1.0,
            total_balance_greater_than_zero: 2.0,
        })
        .unwrap();
        assert_eq!(json["totalBalanceLessThanZero"], -1.0);
        assert_eq!(json["totalBalanceGreaterThanZero"], 2.0);
    }
}

//! List query normalization and pagination envelope.
//!
//! Raw query-string values arrive as optional strings; [`ListQuery::from_raw`] turns them into
//! bounded, typed directives. Malformed values fall back to defaults rather than failing.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::party::PartyType;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Query-string parameters exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub balance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Creation order (newest ids sort last ascending).
    Id,
    Name,
    TradeName,
    Email,
    Gstin,
    PhoneNumber,
    Balance,
    TotalSpent,
    CreatedAt,
}

impl SortField {
    /// Document key the field is stored under.
    pub fn document_key(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::TradeName => "tradeName",
            SortField::Email => "email",
            SortField::Gstin => "gstin",
            SortField::PhoneNumber => "phoneNumber",
            SortField::Balance => "balance",
            SortField::TotalSpent => "totalSpent",
            SortField::CreatedAt => "createdAt",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SortField::Balance | SortField::TotalSpent)
    }

    /// Whether records of the given family carry this field.
    pub fn applies_to(&self, party_type: PartyType) -> bool {
        match self {
            SortField::PhoneNumber => party_type == PartyType::Supplier,
            SortField::TotalSpent => party_type == PartyType::Customer,
            _ => true,
        }
    }
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "_id" | "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "tradeName" => Ok(SortField::TradeName),
            "email" => Ok(SortField::Email),
            "gstin" => Ok(SortField::Gstin),
            "phoneNumber" => Ok(SortField::PhoneNumber),
            "balance" => Ok(SortField::Balance),
            "totalSpent" => Ok(SortField::TotalSpent),
            "createdAt" => Ok(SortField::CreatedAt),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortDirection::Asc),
            "desc" | "descending" | "-1" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    /// Most recently created first.
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: SortDirection::Desc,
        }
    }
}

impl Sort {
    /// The sort to actually apply for a family; inapplicable fields fall back to the default.
    pub fn for_party(self, party_type: PartyType) -> Sort {
        if self.field.applies_to(party_type) {
            self
        } else {
            Sort::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceOp {
    Gt,
    Eq,
    Lt,
}

impl BalanceOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BalanceOp::Gt => ">",
            BalanceOp::Eq => "=",
            BalanceOp::Lt => "<",
        }
    }
}

/// Balance comparison parsed from `"<op>,<value>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceFilter {
    pub op: BalanceOp,
    pub value: f64,
}

impl BalanceFilter {
    /// Parse `gt,100`, `eq,0`, `lt,-5`. Anything else yields no filter.
    pub fn parse(raw: &str) -> Option<Self> {
        let (op, value) = raw.split_once(',')?;
        let op = match op.trim() {
            "gt" => BalanceOp::Gt,
            "eq" => BalanceOp::Eq,
            "lt" => BalanceOp::Lt,
            _ => return None,
        };
        let value: f64 = value.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self { op, value })
    }

    /// Records without a balance count as zero for equality only.
    pub fn includes_absent(&self) -> bool {
        self.op == BalanceOp::Eq && self.value == 0.0
    }

    pub fn matches(&self, balance: Option<f64>) -> bool {
        match balance {
            None => self.includes_absent(),
            Some(b) => match self.op {
                BalanceOp::Gt => b > self.value,
                BalanceOp::Eq => b == self.value,
                BalanceOp::Lt => b < self.value,
            },
        }
    }
}

/// Typed list directives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListQuery {
    pub page: u64,
    pub page_size: u64,
    pub sort: Sort,
    pub balance: Option<BalanceFilter>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
            balance: None,
        }
    }
}

fn positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(default)
}

impl ListQuery {
    pub fn from_raw(raw: &RawListParams) -> Self {
        let sort = raw
            .sort_by
            .as_deref()
            .and_then(|s| s.trim().parse::<SortField>().ok())
            .map(|field| Sort {
                field,
                direction: raw
                    .sort_order
                    .as_deref()
                    .and_then(SortDirection::parse)
                    .unwrap_or(SortDirection::Asc),
            })
            .unwrap_or_default();

        Self {
            page: positive(raw.page.as_deref(), DEFAULT_PAGE),
            page_size: positive(raw.page_size.as_deref(), DEFAULT_PAGE_SIZE),
            sort,
            balance: raw.balance.as_deref().and_then(BalanceFilter::parse),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// One page of results plus the filtered total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Pagination envelope returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_size: u64,
    pub page: u64,
    pub next_page: u64,
    pub previous_page: u64,
    pub total_pages: u64,
    pub total_results: u64,
}

impl PageInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            page,
            next_page: page.saturating_add(1),
            previous_page: page.saturating_sub(1),
            total_pages: total.div_ceil(page_size),
            total_results: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(pairs: &[(&str, &str)]) -> RawListParams {
        let mut params = RawListParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "page" => params.page = v,
                "pageSize" => params.page_size = v,
                "sortBy" => params.sort_by = v,
                "sortOrder" => params.sort_order = v,
                "balance" => params.balance = v,
                _ => unreachable!(),
            }
        }
        params
    }

    #[test]
    fn defaults_when_nothing_supplied() {
        let q = ListQuery::from_raw(&RawListParams::default());
        assert_eq!(q, ListQuery::default());
        assert_eq!(q.skip(), 0);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.sort, Sort { field: SortField::Id, direction: SortDirection::Desc });
    }

    #[test]
    fn malformed_paging_falls_back() {
        let q = ListQuery::from_raw(&raw(&[("page", "abc"), ("pageSize", "0")]));
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);

        let q = ListQuery::from_raw(&raw(&[("page", " 3 "), ("pageSize", "25")]));
        assert_eq!(q.page, 3);
        assert_eq!(q.skip(), 50);
    }

    #[test]
    fn sort_parsing() {
        let q = ListQuery::from_raw(&raw(&[("sortBy", "name"), ("sortOrder", "desc")]));
        assert_eq!(q.sort, Sort { field: SortField::Name, direction: SortDirection::Desc });

        let q = ListQuery::from_raw(&raw(&[("sortBy", "balance")]));
        assert_eq!(q.sort.direction, SortDirection::Asc);

        let q = ListQuery::from_raw(&raw(&[("sortBy", "$where"), ("sortOrder", "asc")]));
        assert_eq!(q.sort, Sort::default());
    }

    #[test]
    fn inapplicable_sort_falls_back_per_family() {
        let sort = Sort { field: SortField::TotalSpent, direction: SortDirection::Asc };
        assert_eq!(sort.for_party(PartyType::Customer), sort);
        assert_eq!(sort.for_party(PartyType::Supplier), Sort::default());
    }

    #[test]
    fn balance_filter_parsing() {
        assert_eq!(
            BalanceFilter::parse("gt,100"),
            Some(BalanceFilter { op: BalanceOp::Gt, value: 100.0 })
        );
        assert_eq!(
            BalanceFilter::parse("lt, -5.5"),
            Some(BalanceFilter { op: BalanceOp::Lt, value: -5.5 })
        );
        assert_eq!(BalanceFilter::parse("gte,100"), None);
        assert_eq!(BalanceFilter::parse("eq,lots"), None);
        assert_eq!(BalanceFilter::parse("eq"), None);
    }

    #[test]
    fn zero_equality_includes_absent_balances() {
        let f = BalanceFilter::parse("eq,0").unwrap();
        assert!(f.matches(None));
        assert!(f.matches(Some(0.0)));
        assert!(!f.matches(Some(12.0)));

        let f = BalanceFilter::parse("gt,0").unwrap();
        assert!(!f.matches(None));
        assert!(f.matches(Some(0.01)));

        let f = BalanceFilter::parse("eq,5").unwrap();
        assert!(!f.matches(None));
    }

    #[test]
    fn envelope_for_twenty_five_records() {
        let info = PageInfo::new(1, 10, 25);
        assert_eq!(
            info,
            PageInfo {
                page_size: 10,
                page: 1,
                next_page: 2,
                previous_page: 0,
                total_pages: 3,
                total_results: 25,
            }
        );
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["previousPage"], 0);
    }

    #[test]
    fn largest_page_number_saturates() {
        let q = ListQuery::from_raw(&raw(&[("page", "18446744073709551615")]));
        assert_eq!(q.page, u64::MAX);
        assert_eq!(q.skip(), u64::MAX);

        let info = PageInfo::new(q.page, q.page_size, 3);
        assert_eq!(info.next_page, u64::MAX);
        assert_eq!(info.previous_page, u64::MAX - 1);
        assert_eq!(info.total_pages, 1);
    }

    proptest! {
        #[test]
        fn normalized_paging_is_always_positive(page in ".{0,6}", size in ".{0,6}") {
            let q = ListQuery::from_raw(&RawListParams {
                page: Some(page),
                page_size: Some(size),
                ..Default::default()
            });
            prop_assert!(q.page >= 1);
            prop_assert!(q.page_size >= 1);
        }

        #[test]
        fn envelope_never_overflows(page in 1u64.., size in 1u64.., total in any::<u64>()) {
            let info = PageInfo::new(page, size, total);
            prop_assert!(info.next_page >= info.page);
            prop_assert!(info.previous_page < info.page);
        }

        #[test]
        fn total_pages_cover_all_results(size in 1u64..500, total in 0u64..100_000) {
            let info = PageInfo::new(1, size, total);
            prop_assert!(info.total_pages * size >= total);
            if total > 0 {
                prop_assert!((info.total_pages - 1) * size < total);
            } else {
                prop_assert_eq!(info.total_pages, 0);
            }
        }
    }
}

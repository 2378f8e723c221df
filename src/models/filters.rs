use chrono::NaiveDate;

use crate::db::DatabaseError;

use super::enums::PatientStatus;

/// Filter predicates for the patient listing. All present predicates are
/// combined with AND.
#[derive(Debug, Default, Clone)]
pub struct PatientFilter {
    /// Case-insensitive substring over first/middle/last name and email,
    /// substring over phone.
    pub search: Option<String>,
    pub status: Option<PatientStatus>,
    /// Creation-date range, inclusive on both ends.
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Columns the listing may be ordered by. ORDER BY text is generated from
/// this enum only — never from request strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Status,
    DateOfBirth,
    #[default]
    CreatedAt,
}

impl std::str::FromStr for SortField {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "status" => Ok(Self::Status),
            "dateOfBirth" => Ok(Self::DateOfBirth),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(DatabaseError::InvalidEnum {
                field: "sortField".into(),
                value: s.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(DatabaseError::InvalidEnum {
                field: "sortDirection".into(),
                value: s.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatientSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl PatientSort {
    /// ORDER BY clause body. `name` is a compound key: last name then first
    /// name, both in the requested direction.
    pub fn order_by(&self) -> String {
        let dir = self.direction.as_sql();
        match self.field {
            SortField::Name => format!("last_name {dir}, first_name {dir}"),
            SortField::Status => format!("status {dir}"),
            SortField::DateOfBirth => format!("date_of_birth {dir}"),
            SortField::CreatedAt => format!("created_at {dir}"),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based pagination window, clamped to sane bounds on construction.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sort_field_parses_wire_names() {
        assert_eq!(SortField::from_str("name").unwrap(), SortField::Name);
        assert_eq!(
            SortField::from_str("dateOfBirth").unwrap(),
            SortField::DateOfBirth
        );
        assert!(SortField::from_str("date_of_birth").is_err());
        assert!(SortField::from_str("id; DROP TABLE patients").is_err());
    }

    #[test]
    fn name_sort_is_compound() {
        let sort = PatientSort {
            field: SortField::Name,
            direction: SortDirection::Desc,
        };
        assert_eq!(sort.order_by(), "last_name DESC, first_name DESC");
    }

    #[test]
    fn page_request_clamps() {
        let page = PageRequest::new(Some(0), Some(5000));
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);

        let page = PageRequest::new(Some(3), Some(10));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }
}

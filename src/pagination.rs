use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
// Caps the OFFSET product so a crafted ?page= cannot overflow i64.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Normalized page/size pair with limit/offset conversion.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub size: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
        let size = size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, size }
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.size.saturating_mul(self.page.saturating_sub(1))
    }
}

/// Paginated response payload.
#[derive(Debug, Serialize)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub total_pages: i64,
}

impl<T> PageData<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.size - 1) / params.size
        };
        Self {
            items,
            total,
            page: params.page,
            size: params.size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_absent() {
        let p = PageParams::new(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.size, 20);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn size_is_capped_and_page_floored() {
        let p = PageParams::new(Some(0), Some(500));
        assert_eq!(p.page, 1);
        assert_eq!(p.size, MAX_PAGE_SIZE);

        let p = PageParams::new(Some(3), Some(10));
        assert_eq!(p.offset(), 20);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn huge_page_number_does_not_overflow_offset() {
        let p = PageParams::new(Some(i64::MAX), Some(100));
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.offset() >= 0);

        let p = PageParams::new(Some(i64::MAX), Some(1));
        assert!(p.offset() >= 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageData::<u8>::new(vec![], 41, PageParams::new(Some(1), Some(20)));
        assert_eq!(page.total_pages, 3);

        let empty = PageData::<u8>::new(vec![], 0, PageParams::new(None, None));
        assert_eq!(empty.total_pages, 0);
    }
}

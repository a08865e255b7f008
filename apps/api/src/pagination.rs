use serde::{Deserialize, Serialize};

/// `?page=&per_page=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn resolve(&self, default_per_page: u32, max_per_page: u32) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(default_per_page),
            max_per_page,
        )
    }
}

/// A 1-based page number and a size clamped to `1..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32, max_per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, max_per_page.max(1)),
        }
    }

    pub fn fixed(page: Option<u32>, per_page: u32) -> Self {
        Self::new(page.unwrap_or(1), per_page, per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        let per_page = u64::from(request.per_page);
        let last_page = total.div_ceil(per_page).max(1);
        Self {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }

    /// Slices an already filtered and ordered result set.
    pub fn from_vec(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(offset)
            .take(request.per_page as usize)
            .collect();
        Self::new(data, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_clamped() {
        assert_eq!(PageRequest::new(0, 0, 100), PageRequest { page: 1, per_page: 1 });
        assert_eq!(PageRequest::new(3, 500, 100).per_page, 100);
        assert_eq!(PageRequest::new(3, 20, 100).offset(), 40);
    }

    #[test]
    fn test_from_vec_slices_and_counts() {
        let page = Page::from_vec((1..=35).collect::<Vec<_>>(), PageRequest::new(3, 15, 100));
        assert_eq!(page.data, vec![31, 32, 33, 34, 35]);
        assert_eq!(page.total, 35);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = Page::from_vec(vec![1, 2], PageRequest::new(4, 15, 100));
        assert!(page.data.is_empty());
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_default_page_size() {
        let request = PageQuery::default().resolve(15, 100);
        assert_eq!(request, PageRequest { page: 1, per_page: 15 });
    }
}

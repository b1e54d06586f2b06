//! "You may also like" products for a detail page.

use crate::product::Product;

use super::page::{Page, RELATED_PAGE_SIZE};
use super::sort::{SortKey, sort_products};

/// Other products in the same subcategory, sorted by name.
#[must_use]
pub fn related<'a>(current: &Product, products: &'a [Product]) -> Vec<&'a Product> {
    let mut matches: Vec<&Product> = products
        .iter()
        .filter(|p| p.subcategory == current.subcategory && p.id != current.id)
        .collect();
    sort_products(&mut matches, SortKey::NameAsc);
    matches
}

/// One carousel page of related products.
#[must_use]
pub fn related_page<'a>(current: &Product, products: &'a [Product], page: usize) -> Page<&'a Product> {
    Page::new(related(current, products), page, RELATED_PAGE_SIZE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(id: &str, name: &str, subcategory: &str) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "subcategory": subcategory,
        }))
        .unwrap()
    }

    #[test]
    fn test_same_subcategory_excluding_current() {
        let list = vec![
            product("1", "Malbec", "Dry"),
            product("2", "Cabernet", "Dry"),
            product("3", "Moscato", "Sweet"),
            product("4", "Barolo", "Dry"),
        ];
        let names: Vec<_> = related(&list[0], &list).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Barolo", "Cabernet"]);
    }

    #[test]
    fn test_carousel_pages_by_three() {
        let mut list = vec![product("current", "Current", "Vodka")];
        for i in 0..7 {
            list.push(product(&i.to_string(), &format!("Vodka {i}"), "Vodka"));
        }
        let current = list[0].clone();

        let first = related_page(&current, &list, 1);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total_pages, 3);

        let last = related_page(&current, &list, 9);
        assert_eq!(last.number, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].name, "Vodka 6");
    }

    #[test]
    fn test_no_related_products() {
        let list = vec![product("1", "Only", "Gin")];
        let page = related_page(&list[0], &list, 1);
        assert!(page.is_empty());
        assert!(!page.has_next());
    }
}

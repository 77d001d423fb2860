use std::rc::Rc;
use table_views::config::config::{PaginationConfig, SortingConfig};
use table_views::controllers::{PageItem, PaginationController, SortController};
use table_views::dom::{Table, TableBuilder};
use table_views::preferences::{MemoryStore, PreferenceStore};
use table_views::state::SortDirection;

/// Twelve rows whose first column is out of order: b, a, d, c, ...
fn twelve_rows() -> Table {
    let letters = ["b", "a", "d", "c", "f", "e", "h", "g", "j", "i", "l", "k"];
    let mut builder = TableBuilder::new(&["letter", "position"]).sortable().paginate();
    for (i, letter) in letters.iter().enumerate() {
        builder = builder.row(&[letter.to_string(), (i + 1).to_string()]);
    }
    Table::new(builder.build())
}

fn visible_letters(table: &Table) -> Vec<String> {
    table
        .element()
        .visible_rows()
        .map(|r| r.cells[0].text.clone())
        .collect()
}

fn page_numbers(items: &[PageItem]) -> Vec<usize> {
    items
        .iter()
        .filter_map(|item| match item {
            PageItem::Page { number, .. } => Some(*number),
            PageItem::Ellipsis => None,
        })
        .collect()
}

#[test]
fn test_sort_then_paginate_twelve_rows() {
    let table = twelve_rows();
    let sorting = SortingConfig {
        sort_on_load: false,
        ..SortingConfig::default()
    };
    let mut sorter = SortController::bind(table.clone(), Vec::new(), &sorting).unwrap();
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let pager = PaginationController::bind(table.clone(), 5, store, &PaginationConfig::default()).unwrap();

    // Unsorted first page
    assert_eq!(visible_letters(&table), vec!["b", "a", "d", "c", "f"]);

    pager.borrow_mut().go_to_page(2);
    sorter.sort_by(0, SortDirection::Asc).unwrap();

    // The sort event put pagination back on page 1
    assert_eq!(visible_letters(&table), vec!["a", "b", "c", "d", "e"]);
    {
        let pager = pager.borrow();
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.panel().summary, "Showing 1–5 of 12");
        assert_eq!(page_numbers(&pager.panel().pages), vec![1, 2, 3]);
        assert!(pager.panel().next_enabled);
        assert!(!pager.panel().prev_enabled);
    }

    pager.borrow_mut().go_to_page(3);
    assert_eq!(visible_letters(&table), vec!["k", "l"]);
    let pager = pager.borrow();
    assert_eq!(pager.panel().summary, "Showing 11–12 of 12");
    assert!(!pager.panel().next_enabled);
    assert!(pager.panel().prev_enabled);
}

#[test]
fn test_initial_sort_runs_on_bind() {
    let table = twelve_rows();
    let sorter = SortController::bind(table.clone(), Vec::new(), &SortingConfig::default()).unwrap();
    assert_eq!(sorter.state().index, Some(0));
    assert_eq!(sorter.state().direction, SortDirection::Asc);
    assert_eq!(table.element().rows()[0].cells[0].text, "a");
    assert_eq!(table.element().header[0].label(), "letter ▲");
    assert_eq!(table.element().header[1].aria_sort(), "none");
}

use std::rc::Rc;
use table_views::config::config::PaginationConfig;
use table_views::config::Config;
use table_views::controllers::{init_tables, init_value_filters, FilterConfig, PaginationController};
use table_views::dom::{Document, Row, Table, TableBuilder};
use table_views::preferences::{MemoryStore, PreferenceStore};
use table_views::state::{SortDirection, TableEvent};

const STATUSES: [&str; 3] = ["open", "paid", "refunded"];

fn orders(count: usize) -> TableBuilder {
    let mut builder = TableBuilder::new(&["id", "status", "region"])
        .id("orders")
        .sortable()
        .paginate();
    for i in 0..count {
        builder = builder.row(&[
            format!("{:03}", i),
            STATUSES[i % 3].to_string(),
            if i % 2 == 0 { "north" } else { "south" }.to_string(),
        ]);
    }
    builder
}

fn visible_ids(table: &Table) -> Vec<String> {
    table
        .element()
        .visible_rows()
        .map(|r| r.cells[0].text.clone())
        .collect()
}

#[test]
fn test_activating_second_filter_replaces_first() {
    let mut doc = Document::new();
    doc.add_table(orders(12).build());
    let mut filters = init_value_filters(&mut doc, FilterConfig::new("#orders", &["status", "region"])).unwrap();

    let paid = filters.buttons().iter().position(|b| b.value == "paid").unwrap();
    let south = filters.buttons().iter().position(|b| b.value == "south").unwrap();

    filters.click(&mut doc, paid).unwrap();
    filters.click(&mut doc, south).unwrap();
    assert_eq!(filters.buttons().iter().filter(|b| b.active).count(), 1);
    assert_eq!(filters.active().unwrap().value, "south");

    let table = filters.table().clone();
    assert_eq!(table.element().filter_state().criteria(), Some((2, "south")));

    filters.click(&mut doc, south).unwrap();
    assert!(filters.active().is_none());
    assert!(!table.element().filter_state().active);

    let events: Vec<TableEvent> = table.events().history();
    assert_eq!(events.last(), Some(&TableEvent::filter_cleared()));
}

#[test]
fn test_window_matches_effective_rows_for_every_page() {
    for count in [0usize, 1, 7, 12, 25] {
        for per_page in [1usize, 3, 5, 10, 30] {
            let table = Table::new(orders(count).build());
            let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
            let pager = PaginationController::bind(table.clone(), per_page, store, &PaginationConfig::default()).unwrap();

            for page in 0..=(count / per_page + 2) {
                pager.borrow_mut().go_to_page(page);
                let pager = pager.borrow();
                let total_pages = count.div_ceil(per_page).max(1);
                assert!(pager.current_page() >= 1 && pager.current_page() <= total_pages);

                let start = (pager.current_page() - 1) * per_page;
                let end = (start + per_page).min(count);
                let expected: Vec<String> = (start..end).map(|i| format!("{:03}", i)).collect();
                assert_eq!(visible_ids(&table), expected, "count={} per_page={} page={}", count, per_page, page);
            }
        }
    }
}

#[test]
fn test_filtered_window_follows_current_order() {
    let mut doc = Document::new();
    doc.add_table(orders(30).build());
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let mut config = Config::default();
    config.pagination.default_per_page = 4;

    let mut bindings = init_tables(&doc, &config, store);
    bindings
        .init_value_filters(&mut doc, FilterConfig::new("#orders", &["status"]))
        .unwrap();

    let table_bindings = bindings.get_mut(0).unwrap();
    let sorter = table_bindings.sorter.clone().unwrap();
    let pager = table_bindings.pager.clone().unwrap();
    let filters = table_bindings.filters.as_mut().unwrap();

    let paid = filters.buttons().iter().position(|b| b.value == "paid").unwrap();
    filters.click(&mut doc, paid).unwrap();

    assert_eq!(pager.borrow().effective_count(), 10);
    assert_eq!(visible_ids(&table_bindings.table), vec!["001", "004", "007", "010"]);
    assert_eq!(pager.borrow().panel().summary, "Showing 1–4 of 10 (filtered from 30)");

    pager.borrow_mut().next();
    sorter.borrow_mut().sort_by(0, SortDirection::Desc).unwrap();
    assert_eq!(pager.borrow().current_page(), 1);
    assert_eq!(visible_ids(&table_bindings.table), vec!["028", "025", "022", "019"]);

    pager.borrow_mut().go_to_page(3);
    assert_eq!(visible_ids(&table_bindings.table), vec!["004", "001"]);
}

#[test]
fn test_filter_event_resets_page() {
    let mut doc = Document::new();
    doc.add_table(orders(30).build());
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let mut bindings = init_tables(&doc, &Config::default(), store);
    bindings
        .init_value_filters(&mut doc, FilterConfig::new("#orders", &["region"]))
        .unwrap();

    let table_bindings = bindings.get_mut(0).unwrap();
    let pager = table_bindings.pager.clone().unwrap();
    pager.borrow_mut().set_per_page(5).unwrap();
    pager.borrow_mut().go_to_page(4);
    assert_eq!(pager.borrow().current_page(), 4);

    table_bindings.filters.as_mut().unwrap().click(&mut doc, 0).unwrap();
    assert_eq!(pager.borrow().current_page(), 1);
    assert_eq!(pager.borrow().total_pages(), 3);
}

#[test]
fn test_render_picks_up_rows_changed_outside() {
    let table = Table::new(orders(7).build());
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let pager = PaginationController::bind(table.clone(), 3, store, &PaginationConfig::default()).unwrap();
    assert_eq!(pager.borrow().total_pages(), 3);

    {
        let mut element = table.element_mut();
        let body = element.body.as_mut().unwrap();
        for i in 7..12 {
            body.rows.push(Row::from_texts([format!("{:03}", i), "open".to_string(), "north".to_string()]));
        }
    }
    pager.borrow_mut().go_to_page(4);
    {
        let pager = pager.borrow();
        assert_eq!(pager.total_pages(), 4);
        assert_eq!(pager.current_page(), 4);
        assert_eq!(pager.window(), 9..12);
        assert_eq!(pager.panel().summary, "Showing 10–12 of 12");
    }
    assert_eq!(visible_ids(&table), vec!["009", "010", "011"]);

    table.element_mut().body.as_mut().unwrap().rows.truncate(4);
    pager.borrow_mut().go_to_page(4);
    {
        let pager = pager.borrow();
        assert_eq!(pager.total_pages(), 2);
        assert_eq!(pager.current_page(), 2);
        assert_eq!(pager.window(), 3..4);
        assert_eq!(pager.panel().summary, "Showing 4–4 of 4");
    }
    assert_eq!(visible_ids(&table), vec!["003"]);
}

use std::rc::Rc;

use table_views::config::Config;
use table_views::controllers::{init_tables, FilterConfig};
use table_views::dom::loaders::document_from_json;
use table_views::dom::SortIndicator;
use table_views::preferences::{MemoryStore, PreferenceStore};

const PAGE: &str = r##"{
    "viewport": {"width": 1024.0, "height": 768.0},
    "tables": [
        {
            "id": "orders",
            "heading": "Orders",
            "sortable": true,
            "paginate": true,
            "header": ["Customer", {"text": "Placed", "type": "date"}, {"text": "Total", "type": "number"}],
            "rows": [
                ["Zoë", "03.02.2024", 12.5],
                ["adam", "01.02.2024", 7],
                ["Émile", "02.02.2024", "n/a"]
            ]
        },
        {
            "tag": "div",
            "sortable": true,
            "header": ["x"],
            "rows": [["1"]]
        },
        {
            "heading": "Empty",
            "paginate": true,
            "header": ["y"]
        }
    ],
    "nodes": [
        {"tag": "section", "id": "filters", "children": [{"tag": "p", "class": "hint"}]}
    ],
    "toggles": [
        {"target": "#orders", "anchor": {"x": 10.0, "y": 10.0, "width": 30.0, "height": 20.0}},
        {"target": "#missing"}
    ]
}"##;

fn customers(bindings: &table_views::controllers::TableBindings) -> Vec<String> {
    bindings
        .table
        .element()
        .visible_rows()
        .map(|r| r.cells[0].text.clone())
        .collect()
}

#[test]
fn test_document_binds_what_it_asks_for() {
    let doc = document_from_json(PAGE).unwrap();
    assert_eq!(doc.tables().len(), 3);
    assert_eq!(doc.toggles().len(), 2);

    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let bindings = init_tables(&doc, &Config::default(), store);

    let orders = bindings.get(0).unwrap();
    assert!(orders.sorter.is_some());
    assert!(orders.pager.is_some());
    assert!(orders.visibility.is_some());
    assert_eq!(customers(orders), vec!["adam", "Émile", "Zoë"]);
    assert_eq!(orders.table.element().header[0].indicator, SortIndicator::Ascending);

    // Not a table element
    let div = bindings.get(1).unwrap();
    assert!(div.sorter.is_none());

    // No body to paginate
    let empty = bindings.get(2).unwrap();
    assert!(empty.pager.is_none());
    assert!(empty.visibility.is_none());

    assert_eq!(bindings.sorted_count(), 1);
    assert_eq!(bindings.paginated_count(), 1);
}

#[test]
fn test_declared_date_column_and_invalid_numbers() {
    let doc = document_from_json(PAGE).unwrap();
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let bindings = init_tables(&doc, &Config::default(), store);
    let orders = bindings.get(0).unwrap();
    let sorter = orders.sorter.clone().unwrap();

    sorter.borrow_mut().sort_by(1, table_views::state::SortDirection::Asc).unwrap();
    assert_eq!(customers(orders), vec!["adam", "Émile", "Zoë"]);

    sorter.borrow_mut().sort_by(2, table_views::state::SortDirection::Desc).unwrap();
    assert_eq!(customers(orders), vec!["Zoë", "adam", "Émile"]);
}

#[test]
fn test_filter_bar_mounts_and_resorts_through_bindings() {
    let mut doc = document_from_json(PAGE).unwrap();
    let store: Rc<dyn PreferenceStore> = Rc::new(MemoryStore::new());
    let mut bindings = init_tables(&doc, &Config::default(), store);

    let filters = bindings
        .init_value_filters(
            &mut doc,
            FilterConfig::new("#orders", &["Total"]).mount("#filters").insert_before(".hint"),
        )
        .unwrap();
    assert!(filters.is_mounted());
    assert!(filters.has_on_resort());

    let section = &doc.nodes()[0];
    assert_eq!(section.children.len(), 2);
    assert_eq!(section.children[0].attributes.get("class").map(String::as_str), Some("value-filters"));
}
